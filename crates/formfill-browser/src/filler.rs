use crate::action::{FillAction, never_fillable, plan_action};
use crate::scanner::{SCAN_SCRIPT, ScanResult, ScannedField, action_script};
use crate::session::DevToolsSession;
use crate::values::ValueGenerator;
use crate::Result;
use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use std::ops::AddAssign;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FillerConfig {
    /// Pause between page scans
    pub interval: Duration,
    /// Also fill controls that are not rendered
    pub fill_hidden: bool,
}

impl Default for FillerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            fill_hidden: false,
        }
    }
}

/// Counts for one scan, or a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillStats {
    pub scans: usize,
    pub found: usize,
    pub filled: usize,
    pub skipped: usize,
}

impl AddAssign for FillStats {
    fn add_assign(&mut self, other: Self) {
        self.scans += other.scans;
        self.found += other.found;
        self.filled += other.filled;
        self.skipped += other.skipped;
    }
}

/// The page a [`Filler`] drives
#[async_trait]
pub trait FormPage: Send + Sync {
    /// URL of the loaded document, `None` before the first navigation
    async fn current_url(&self) -> Result<Option<String>>;

    /// Evaluate a script and return its JSON result
    async fn evaluate_json(&self, script: &str) -> Result<Value>;

    fn is_connected(&self) -> bool;
}

#[async_trait]
impl FormPage for DevToolsSession {
    async fn current_url(&self) -> Result<Option<String>> {
        DevToolsSession::current_url(self).await
    }

    async fn evaluate_json(&self, script: &str) -> Result<Value> {
        self.evaluate(script).await
    }

    fn is_connected(&self) -> bool {
        DevToolsSession::is_connected(self)
    }
}

/// Keys of the controls the filler is done with, for one document at a time
#[derive(Debug, Default)]
struct DoneSet {
    document: Option<String>,
    keys: HashSet<String>,
}

impl DoneSet {
    /// Forget every key when the page has moved on to another document
    fn enter(&mut self, document: &str) {
        if self.document.as_deref() != Some(document) {
            if self.document.is_some() {
                tracing::debug!("New document loaded, forgetting {} key(s)", self.keys.len());
            }
            self.document = Some(document.to_string());
            self.keys.clear();
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    fn insert(&mut self, key: &str) {
        self.keys.insert(key.to_string());
    }
}

/// Polls the driven page and fills every control it has not filled yet
pub struct Filler<P: FormPage = DevToolsSession> {
    page: P,
    config: FillerConfig,
    generator: Box<dyn ValueGenerator>,
    done: DoneSet,
    rng: StdRng,
}

impl<P: FormPage> Filler<P> {
    pub fn new(page: P, config: FillerConfig, generator: Box<dyn ValueGenerator>) -> Self {
        Self {
            page,
            config,
            generator,
            done: DoneSet::default(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn into_page(self) -> P {
        self.page
    }

    /// Scan the page once and fill new controls
    pub async fn scan_once(&mut self) -> Result<FillStats> {
        let url = self.page.current_url().await?;
        let Some(url) = url.filter(|u| !u.starts_with("about:")) else {
            tracing::debug!("No page loaded, waiting");
            return Ok(FillStats::default());
        };

        let scan: ScanResult = serde_json::from_value(self.page.evaluate_json(SCAN_SCRIPT).await?)?;
        self.done.enter(&scan.document);
        let pending = self.pending_fields(scan.fields);

        let mut stats = FillStats {
            scans: 1,
            found: pending.len(),
            ..Default::default()
        };
        if pending.is_empty() {
            tracing::debug!("No new inputs to fill on {}", url);
            return Ok(stats);
        }

        tracing::debug!("Found {} unfilled form element(s) on {}", pending.len(), url);
        self.generator.prepare(&pending).await;

        for field in &pending {
            let action = plan_action(
                field,
                self.config.fill_hidden,
                self.generator.as_mut(),
                &mut self.rng,
            );

            if self.apply(field, &action).await {
                self.done.insert(&field.key);
                stats.filled += 1;
            } else {
                stats.skipped += 1;
            }
        }

        if stats.filled > 0 {
            tracing::info!("Filled {} new input(s) on {}", stats.filled, url);
        }
        Ok(stats)
    }

    /// Controls worth offering to the generator, first occurrence of each key only
    ///
    /// Controls that can never be filled are marked done on sight. Invisible
    /// ones are held back without being marked, since they may appear later.
    fn pending_fields(&mut self, fields: Vec<ScannedField>) -> Vec<ScannedField> {
        let mut seen = HashSet::new();
        let mut pending = Vec::new();

        for field in fields {
            if self.done.contains(&field.key) || !seen.insert(field.key.clone()) {
                continue;
            }
            if never_fillable(&field) {
                self.done.insert(&field.key);
                continue;
            }
            if !field.visible && !self.config.fill_hidden {
                continue;
            }
            pending.push(field);
        }

        pending
    }

    /// Carry out one action; `true` when the control is done with
    async fn apply(&self, field: &ScannedField, action: &FillAction) -> bool {
        if !action.is_handled() {
            return false;
        }

        let Some(script) = action_script(&field.key, action) else {
            return true;
        };

        let outcome = self
            .page
            .evaluate_json(&script)
            .await
            .and_then(|value| Ok(serde_json::from_value::<bool>(value)?));

        match outcome {
            Ok(true) => {
                tracing::debug!(
                    "Filled {} (name={}, type={})",
                    field.tag,
                    field.name.as_deref().unwrap_or(""),
                    field.field_type.as_deref().unwrap_or("")
                );
                true
            }
            Ok(false) => {
                tracing::debug!("Element {} no longer on the page", field.key);
                false
            }
            Err(e) => {
                tracing::warn!("Failed to fill element {}: {}", field.key, e);
                false
            }
        }
    }

    /// Scan every `interval` until `shutdown` resolves or the browser goes away
    pub async fn run<F>(&mut self, shutdown: F) -> Result<FillStats>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut totals = FillStats::default();

        loop {
            if !self.page.is_connected() {
                tracing::info!("Browser connection closed");
                break;
            }

            match self.scan_once().await {
                Ok(stats) => totals += stats,
                Err(e) => {
                    if self.page.current_url().await.is_err() {
                        tracing::info!("Browser is no longer reachable: {}", e);
                        break;
                    }
                    tracing::warn!("Scan failed: {}", e);
                }
            }

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Stopping form filler");
                    break;
                }
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        Ok(totals)
    }
}
