use super::{AssistedInterpreter, ContextIndex, DEFAULT_CONTEXT_LIMIT, QueryBackend};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Settings for the model assist
#[derive(Clone)]
pub struct AssistConfig {
    /// Full chat-completions endpoint URL
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Extra `.txt`/`.md` documents for the context index
    pub docs_dir: Option<PathBuf>,
    /// Context documents included in each prompt
    pub context_limit: usize,
    pub timeout: Duration,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            docs_dir: None,
            context_limit: DEFAULT_CONTEXT_LIMIT,
            timeout: Duration::from_secs(30),
        }
    }
}

// Keep the key out of logs.
impl fmt::Debug for AssistConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("docs_dir", &self.docs_dir)
            .field("context_limit", &self.context_limit)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AssistConfig {
    /// Build the assisted interpreter: backend plus context index
    pub fn build(&self) -> Result<AssistedInterpreter> {
        let backend = OpenAiBackend::new(self)?;

        let mut context = ContextIndex::with_defaults();
        if let Some(dir) = &self.docs_dir {
            context.load_dir(dir)?;
        }

        tracing::info!(
            "Model assist enabled: {} via {} ({} context documents)",
            self.model,
            self.api_url,
            context.len()
        );
        Ok(AssistedInterpreter::new(Arc::new(backend))
            .with_context(context)
            .with_context_limit(self.context_limit))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat-completions backend
pub struct OpenAiBackend {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiBackend {
    pub fn new(config: &AssistConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl QueryBackend for OpenAiBackend {
    fn id(&self) -> &str {
        &self.model
    }

    async fn query(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
            max_tokens: 32,
        };

        let mut builder = self.client.post(&self.api_url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::InvalidResponse("no choices in response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AssistConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.api_key.is_none());
        assert_eq!(config.context_limit, DEFAULT_CONTEXT_LIMIT);
    }

    #[test]
    fn test_debug_masks_key() {
        let config = AssistConfig {
            api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_response_parsing() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "email"}}]}"#,
        )
        .unwrap();
        assert_eq!(body.choices[0].message.content.as_deref(), Some("email"));

        let empty: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.choices.is_empty());
    }

    #[test]
    fn test_build_with_missing_docs_dir_fails() {
        let config = AssistConfig {
            docs_dir: Some(PathBuf::from("/nonexistent/formfill-docs")),
            ..Default::default()
        };
        assert!(config.build().is_err());
    }

    #[test]
    fn test_build_loads_docs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "membership number").unwrap();
        let config = AssistConfig {
            docs_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        assert!(config.build().is_ok());
    }
}
