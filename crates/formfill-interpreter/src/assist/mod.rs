//! Optional model assist for fields the pattern table cannot place.
//!
//! The assist searches a small [`ContextIndex`] for background on the field,
//! asks a [`QueryBackend`] to pick a category, and falls back to the pattern
//! result whenever the backend fails or answers with something unusable.

mod context;
mod openai;
mod prompt;

pub use context::{ContextDocument, ContextIndex};
pub use openai::{AssistConfig, OpenAiBackend};
pub use prompt::{ModelAnswer, build_prompt, parse_answer};

use crate::Result;
use crate::interpreter::FieldInterpreter;
use async_trait::async_trait;
use formfill_core::{FieldDescriptor, FieldMapping, FormDescriptor, InterpretationResult};
use std::sync::Arc;

/// Pattern results below this confidence are offered to the model
pub const ASSIST_THRESHOLD: f64 = 0.8;

/// Confidence given to a model answer naming one of the fixed categories
pub const MODEL_CATEGORY_CONFIDENCE: f64 = 0.9;

/// Confidence given to a free-text model answer
pub const MODEL_FREE_TEXT_CONFIDENCE: f64 = 0.85;

/// Number of context documents included in a prompt
pub const DEFAULT_CONTEXT_LIMIT: usize = 3;

/// Text-in, text-out language model capability
#[async_trait]
pub trait QueryBackend: Send + Sync {
    fn id(&self) -> &str;

    async fn query(&self, prompt: &str) -> Result<String>;
}

/// Pattern interpreter with a model fallback for weak or missing matches
pub struct AssistedInterpreter {
    patterns: FieldInterpreter,
    backend: Arc<dyn QueryBackend>,
    context: ContextIndex,
    context_limit: usize,
}

impl AssistedInterpreter {
    pub fn new(backend: Arc<dyn QueryBackend>) -> Self {
        Self {
            patterns: FieldInterpreter::new(),
            backend,
            context: ContextIndex::with_defaults(),
            context_limit: DEFAULT_CONTEXT_LIMIT,
        }
    }

    pub fn with_context(mut self, context: ContextIndex) -> Self {
        self.context = context;
        self
    }

    pub fn with_context_limit(mut self, limit: usize) -> Self {
        self.context_limit = limit;
        self
    }

    pub async fn interpret_field(&self, field: &FieldDescriptor) -> Option<FieldMapping> {
        let pattern = self.patterns.interpret_field(field);

        if let Some(mapping) = &pattern {
            if mapping.confidence >= ASSIST_THRESHOLD {
                return pattern;
            }
        }
        if field.is_blank() {
            return pattern;
        }

        match self.ask_model(field).await {
            Some(mapping) => Some(mapping),
            None => pattern,
        }
    }

    pub async fn interpret_form(&self, form: &FormDescriptor) -> InterpretationResult {
        let mut mappings = Vec::new();
        for field in &form.fields {
            if let Some(mapping) = self.interpret_field(field).await {
                mappings.push(mapping);
            }
        }
        InterpretationResult::from_mappings(mappings)
    }

    async fn ask_model(&self, field: &FieldDescriptor) -> Option<FieldMapping> {
        let documents = self.context.search(&field.text(), self.context_limit);
        let prompt = build_prompt(field, &documents);

        let answer = match self.backend.query(&prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(
                    "Model backend '{}' failed for field '{}': {}",
                    self.backend.id(),
                    field.display_name(),
                    e
                );
                return None;
            }
        };

        match parse_answer(&answer) {
            Some(ModelAnswer::Category(category)) => Some(FieldMapping::from_model(
                field,
                category.as_str(),
                MODEL_CATEGORY_CONFIDENCE,
            )),
            Some(ModelAnswer::FreeText(label)) => Some(FieldMapping::from_model(
                field,
                label,
                MODEL_FREE_TEXT_CONFIDENCE,
            )),
            None => {
                tracing::debug!(
                    "Ignoring model answer for field '{}': {:?}",
                    field.display_name(),
                    answer
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use formfill_core::MappingMethod;
    use std::sync::Mutex;

    struct FixedBackend {
        answer: String,
        prompts: Mutex<Vec<String>>,
    }

    impl FixedBackend {
        fn new(answer: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: answer.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl QueryBackend for FixedBackend {
        fn id(&self) -> &str {
            "fixed"
        }

        async fn query(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.answer.clone())
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl QueryBackend for FailingBackend {
        fn id(&self) -> &str {
            "failing"
        }

        async fn query(&self, _prompt: &str) -> Result<String> {
            Err(Error::Backend("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_confident_pattern_skips_model() {
        let backend = FixedBackend::new("address_city");
        let assist = AssistedInterpreter::new(backend.clone());

        let mapping = assist
            .interpret_field(&FieldDescriptor::new().with_name("email"))
            .await
            .unwrap();

        assert_eq!(mapping.user_field, "email");
        assert_eq!(mapping.method, MappingMethod::Pattern);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_unmatched_field_uses_model_category() {
        let backend = FixedBackend::new("address_street\n");
        let assist = AssistedInterpreter::new(backend.clone());

        let mapping = assist
            .interpret_field(&FieldDescriptor::new().with_name("line1").with_label("Where do you live?"))
            .await
            .unwrap();

        assert_eq!(mapping.user_field, "address_street");
        assert_eq!(mapping.confidence, MODEL_CATEGORY_CONFIDENCE);
        assert_eq!(mapping.method, MappingMethod::Model);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_free_text_answer() {
        let assist = AssistedInterpreter::new(FixedBackend::new("Company Name"));

        let mapping = assist
            .interpret_field(&FieldDescriptor::new().with_name("org"))
            .await
            .unwrap();

        assert_eq!(mapping.user_field, "company_name");
        assert_eq!(mapping.confidence, MODEL_FREE_TEXT_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_failing_backend_falls_back_silently() {
        let assist = AssistedInterpreter::new(Arc::new(FailingBackend));

        assert!(
            assist
                .interpret_field(&FieldDescriptor::new().with_name("coupon"))
                .await
                .is_none()
        );

        let mapping = assist
            .interpret_field(&FieldDescriptor::new().with_name("phone"))
            .await
            .unwrap();
        assert_eq!(mapping.user_field, "phone");
    }

    #[tokio::test]
    async fn test_none_answer_is_ignored() {
        let assist = AssistedInterpreter::new(FixedBackend::new("none"));
        let result = assist
            .interpret_form(&FormDescriptor::new(vec![
                FieldDescriptor::new().with_name("coupon"),
                FieldDescriptor::new().with_name("zip"),
            ]))
            .await;

        assert_eq!(result.mappings.len(), 1);
        assert_eq!(result.mappings[0].user_field, "address_zip");
        assert!((result.confidence - 0.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_blank_field_never_reaches_model() {
        let backend = FixedBackend::new("email");
        let assist = AssistedInterpreter::new(backend.clone());

        assert!(assist.interpret_field(&FieldDescriptor::new()).await.is_none());
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_prompt_carries_context() {
        let backend = FixedBackend::new("none");
        let assist = AssistedInterpreter::new(backend.clone()).with_context(ContextIndex::new(vec![
            ContextDocument::new("loyalty", "loyalty card number printed on the membership card"),
        ]));

        assist
            .interpret_field(&FieldDescriptor::new().with_label("Membership card"))
            .await;

        let prompts = backend.prompts.lock().unwrap();
        assert!(prompts[0].contains("loyalty card number"));
    }

    #[tokio::test]
    async fn test_context_limit_caps_background() {
        let documents = vec![
            ContextDocument::new("loyalty", "membership card number"),
            ContextDocument::new("gift", "gift card number"),
        ];

        let backend = FixedBackend::new("none");
        let assist = AssistedInterpreter::new(backend.clone())
            .with_context(ContextIndex::new(documents.clone()))
            .with_context_limit(1);
        assist
            .interpret_field(&FieldDescriptor::new().with_label("Card number"))
            .await;

        let unlimited = FixedBackend::new("none");
        let assist = AssistedInterpreter::new(unlimited.clone())
            .with_context(ContextIndex::new(documents.clone()));
        assist
            .interpret_field(&FieldDescriptor::new().with_label("Card number"))
            .await;

        let silent = FixedBackend::new("none");
        let assist = AssistedInterpreter::new(silent.clone())
            .with_context(ContextIndex::new(documents))
            .with_context_limit(0);
        assist
            .interpret_field(&FieldDescriptor::new().with_label("Card number"))
            .await;

        let limited = backend.prompts.lock().unwrap()[0].clone();
        assert!(limited.contains("membership card number"));
        assert!(!limited.contains("gift card number"));

        let full = unlimited.prompts.lock().unwrap()[0].clone();
        assert!(full.contains("membership card number") && full.contains("gift card number"));

        assert!(!silent.prompts.lock().unwrap()[0].contains("Background"));
    }
}
