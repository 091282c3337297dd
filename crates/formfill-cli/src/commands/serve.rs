use anyhow::{Context, Result};
use formfill_interpreter::{AssistConfig, FormInterpreter};
use formfill_server::{ApiServer, ApiState, ServerConfig};
use formfill_store::SqliteStore;
use std::path::PathBuf;
use std::sync::Arc;

pub struct ServeOptions {
    pub host: String,
    pub port: u16,
    pub db: Option<PathBuf>,
    pub assist_url: Option<String>,
    pub assist_key: Option<String>,
    pub assist_model: Option<String>,
    pub assist_docs: Option<PathBuf>,
    pub assist_context_limit: usize,
}

impl ServeOptions {
    /// Model assist is on when an endpoint or key is given
    pub fn assist_config(&self) -> Option<AssistConfig> {
        if self.assist_url.is_none() && self.assist_key.is_none() {
            return None;
        }

        let defaults = AssistConfig::default();
        Some(AssistConfig {
            api_url: self.assist_url.clone().unwrap_or(defaults.api_url),
            api_key: self.assist_key.clone(),
            model: self.assist_model.clone().unwrap_or(defaults.model),
            docs_dir: self.assist_docs.clone(),
            context_limit: self.assist_context_limit,
            timeout: defaults.timeout,
        })
    }
}

pub fn execute(options: ServeOptions) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let db_path = match options.db.clone() {
            Some(path) => path,
            None => formfill_store::default_path()?,
        };
        let store = SqliteStore::open(&db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
        println!("📁 Database: {}", db_path.display());

        let interpreter = match options.assist_config() {
            Some(config) => {
                tracing::debug!("Assist config: {:?}", config);
                let assisted = config.build().context("Failed to set up model assist")?;
                println!("🤖 Model assist: {} ({})", config.model, config.api_url);
                FormInterpreter::with_assist(assisted)
            }
            None => {
                if options.assist_docs.is_some() {
                    tracing::warn!("--assist-docs ignored: no --assist-url or --assist-key given");
                }
                FormInterpreter::new()
            }
        };

        let state = ApiState::new(Arc::new(interpreter), Arc::new(store));
        let server = ApiServer::new(ServerConfig::new(options.host.clone(), options.port), state);

        println!(
            "🚀 FormFill API on http://{}:{}/api (Ctrl+C to stop)",
            options.host, options.port
        );
        server.run().await?;
        println!("🛑 Server stopped");

        Ok(())
    })
}
