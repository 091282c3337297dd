use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use formfill_browser::{
    BrowserFinder, BrowserKind, BrowserLauncher, DevToolsSession, FillStats, Filler, FillerConfig,
    InputKind, ProfileManager, ProfileValues, RandomValues, ScannedField, ValueGenerator,
};
use formfill_core::{FieldDescriptor, FormDescriptor, InterpretationResult, UserProfile};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::Child;
use std::time::Duration;
use url::Url;

pub struct FillOptions {
    pub browser: BrowserKind,
    pub attach: bool,
    pub interval: u64,
    pub fill_hidden: bool,
    pub url: Option<String>,
    pub browser_path: Option<PathBuf>,
    pub debug_port: u16,
    pub profile: Option<String>,
    pub server: Option<String>,
    pub user_id: String,
}

/// Client for a running FormFill API
pub struct ApiClient {
    client: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(server: &str) -> Result<Self> {
        let trimmed = server.trim().trim_end_matches('/');
        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{}", trimmed)
        };
        let base = Url::parse(&format!("{}/", with_scheme))
            .with_context(|| format!("Invalid server URL: {}", server))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client, base })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(&format!("api/{}", path))?)
    }

    /// `GET /api/data?user_id=...`
    pub async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile> {
        let mut url = self.endpoint("data")?;
        url.query_pairs_mut().append_pair("user_id", user_id);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to reach FormFill API at {}", self.base))?;
        if !response.status().is_success() {
            return Err(anyhow!("GET {} returned {}", url, response.status()));
        }

        let data: serde_json::Value = response.json().await?;
        Ok(UserProfile::from_value(user_id, &data)?)
    }

    /// `POST /api/interpret`
    pub async fn interpret(&self, fields: Vec<FieldDescriptor>) -> Result<InterpretationResult> {
        let url = self.endpoint("interpret")?;
        let response = self
            .client
            .post(url.clone())
            .json(&FormDescriptor::new(fields))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(anyhow!("POST {} returned {}", url, response.status()));
        }

        Ok(response.json().await?)
    }
}

/// Profile values with field labels from the API's interpreter
struct ServerValues {
    api: ApiClient,
    values: ProfileValues,
}

#[async_trait]
impl ValueGenerator for ServerValues {
    async fn prepare(&mut self, fields: &[ScannedField]) {
        let descriptors: Vec<FieldDescriptor> = fields
            .iter()
            .map(ScannedField::descriptor)
            .filter(|d| !d.is_blank())
            .collect();
        if descriptors.is_empty() {
            self.values.clear_mappings();
            return;
        }

        match self.api.interpret(descriptors).await {
            Ok(result) => {
                tracing::debug!(
                    "API mapped {} field(s), confidence {:.2}",
                    result.mappings.len(),
                    result.confidence
                );
                self.values.set_mappings(&result);
            }
            Err(e) => {
                tracing::warn!("Field interpretation request failed: {}", e);
                self.values.clear_mappings();
            }
        }
    }

    fn generate(&mut self, field: &ScannedField, kind: InputKind) -> String {
        self.values.generate(field, kind)
    }
}

/// A browser this command started, with the profile it runs on
struct LaunchedBrowser {
    process: Child,
    _profile: ProfileManager,
}

impl LaunchedBrowser {
    fn kill(mut self) {
        if let Err(e) = self.process.kill() {
            tracing::debug!("Browser process already gone: {}", e);
        }
        let _ = self.process.wait();
    }
}

pub fn execute(options: FillOptions) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let generator = build_generator(&options).await?;

        let launched = if options.attach {
            println!(
                "🔗 Attaching to browser on port {} (it must run with remote debugging enabled)",
                options.debug_port
            );
            None
        } else {
            Some(launch_browser(&options)?)
        };

        let session = match connect(options.debug_port).await {
            Ok(session) => session,
            Err(e) => {
                if let Some(browser) = launched {
                    browser.kill();
                }
                return Err(e);
            }
        };

        println!("✅ Connected. Filling forms every {}s, press Ctrl+C to stop", options.interval);

        let config = FillerConfig {
            interval: Duration::from_secs(options.interval),
            fill_hidden: options.fill_hidden,
        };
        let mut filler = Filler::new(session, config, generator);
        let result = filler
            .run(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to install Ctrl+C handler: {}", e);
                    std::future::pending::<()>().await;
                }
            })
            .await;

        let session = filler.into_page();
        match launched {
            Some(browser) => {
                println!("🛑 Closing browser...");
                if let Err(e) = session.close().await {
                    tracing::debug!("Browser close failed: {}", e);
                }
                browser.kill();
            }
            None => {
                session.disconnect();
                println!("🔌 Detached, browser left running");
            }
        }

        let stats = result?;
        print_summary(&stats);
        Ok(())
    })
}

async fn build_generator(options: &FillOptions) -> Result<Box<dyn ValueGenerator>> {
    let Some(server) = options.server.as_deref() else {
        println!("🎲 Using random values");
        return Ok(Box::new(RandomValues::new()));
    };

    let api = ApiClient::new(server)?;
    let profile = api.fetch_profile(&options.user_id).await?;
    if profile.is_empty() {
        println!(
            "⚠️  Profile '{}' is empty, falling back to random values",
            options.user_id
        );
    } else {
        println!("👤 Using profile '{}' from {}", options.user_id, server);
    }

    Ok(Box::new(ServerValues {
        api,
        values: ProfileValues::new(profile),
    }))
}

fn launch_browser(options: &FillOptions) -> Result<LaunchedBrowser> {
    println!("🔍 Locating {}...", options.browser);
    let binary = BrowserFinder::new(options.browser, options.browser_path.clone()).find()?;
    println!("✅ Found {} at: {}", options.browser, binary.display());

    let profile = match options.profile.as_deref() {
        Some(name) => {
            let profile = ProfileManager::named(name)?;
            println!("📁 Using profile: {}", profile.path().display());
            profile
        }
        None => {
            println!("📁 Using temporary profile");
            ProfileManager::temporary()?
        }
    };

    if options.browser == BrowserKind::Firefox {
        println!("⚠️  Firefox DevTools-protocol support varies by version");
    }

    let launcher = BrowserLauncher::new(
        options.browser,
        binary,
        profile.path().to_path_buf(),
        options.url.clone(),
    )
    .with_debugging_port(options.debug_port);

    println!("🚀 Launching {}...", options.browser);
    let process = launcher.launch()?;

    Ok(LaunchedBrowser {
        process,
        _profile: profile,
    })
}

async fn connect(port: u16) -> Result<DevToolsSession> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Connecting to DevTools on port {}...", port));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = DevToolsSession::connect(port).await;
    spinner.finish_and_clear();

    Ok(result?)
}

fn print_summary(stats: &FillStats) {
    use console::style;

    println!(
        "{} {} input(s) filled over {} scan(s)",
        style("📊").bold(),
        style(stats.filled).green().bold(),
        stats.scans
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_client_endpoints() {
        let api = ApiClient::new("http://localhost:5000").unwrap();
        assert_eq!(
            api.endpoint("data").unwrap().as_str(),
            "http://localhost:5000/api/data"
        );

        let api = ApiClient::new("localhost:5000/").unwrap();
        assert_eq!(
            api.endpoint("interpret").unwrap().as_str(),
            "http://localhost:5000/api/interpret"
        );
    }

    #[test]
    fn test_api_client_rejects_garbage() {
        assert!(ApiClient::new("http://exa mple.com").is_err());
    }

    #[tokio::test]
    async fn test_fetch_profile_from_running_server() {
        use formfill_interpreter::FormInterpreter;
        use formfill_server::{ApiServer, ApiState, ServerConfig};
        use formfill_store::{ProfileStore, SqliteStore};
        use std::sync::Arc;

        let store = SqliteStore::in_memory().await.unwrap();
        let profile = UserProfile::from_value(
            "ada",
            &serde_json::json!({"first_name": "Ada", "company": "Analytical Engines"}),
        )
        .unwrap();
        store.save_profile(&profile).await.unwrap();

        let state = ApiState::new(Arc::new(FormInterpreter::new()), Arc::new(store));
        let server = ApiServer::new(ServerConfig::new("127.0.0.1", 0), state);
        let listener = server.bind().await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve(listener, async {
            let _ = rx.await;
        }));

        let api = ApiClient::new(&format!("http://{}", addr)).unwrap();
        let fetched = api.fetch_profile("ada").await.unwrap();
        assert_eq!(fetched.first_name.as_deref(), Some("Ada"));
        assert_eq!(fetched.custom_value("company").as_deref(), Some("Analytical Engines"));

        let result = api
            .interpret(vec![FieldDescriptor::new().with_name("email").with_type("email")])
            .await
            .unwrap();
        assert_eq!(result.mappings[0].user_field, "email");

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
