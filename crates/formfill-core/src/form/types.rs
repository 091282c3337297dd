use super::FieldCategory;
use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Descriptive attributes of one form control, as scraped from the page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub field_type: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl FieldDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_type(mut self, field_type: impl Into<String>) -> Self {
        self.field_type = Some(field_type.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// All descriptive attributes joined into one blob for pattern matching
    pub fn text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.name.as_deref().unwrap_or(""),
            self.id.as_deref().unwrap_or(""),
            self.label.as_deref().unwrap_or(""),
            self.placeholder.as_deref().unwrap_or(""),
        )
    }

    /// The name if set and non-empty, otherwise the id
    pub fn display_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.id.clone().unwrap_or_default(),
        }
    }

    pub fn type_str(&self) -> &str {
        self.field_type.as_deref().unwrap_or("")
    }

    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty() && self.type_str().is_empty()
    }
}

/// Body of an interpretation request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormDescriptor {
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_id: Option<String>,
}

impl FormDescriptor {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self {
            fields,
            domain: None,
            form_id: None,
        }
    }

    /// Parse a `{"fields": [...]}` object or a bare list of fields
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;

        if value.is_array() {
            return Ok(Self::new(serde_json::from_value(value)?));
        }
        if value.get("fields").is_none() {
            return Err(Error::InvalidForm(
                "expected an object with a \"fields\" list, or a list of fields".to_string(),
            ));
        }
        Ok(serde_json::from_value(value)?)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingMethod {
    #[default]
    Pattern,
    Model,
}

/// Interpreter output for one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub field_name: String,
    #[serde(default)]
    pub field_type: Option<String>,
    pub user_field: String,
    pub confidence: f64,
    #[serde(default)]
    pub method: MappingMethod,
}

impl FieldMapping {
    pub fn from_pattern(field: &FieldDescriptor, category: FieldCategory, confidence: f64) -> Self {
        Self {
            field_name: field.display_name(),
            field_type: field.field_type.clone(),
            user_field: category.as_str().to_string(),
            confidence,
            method: MappingMethod::Pattern,
        }
    }

    pub fn from_model(field: &FieldDescriptor, label: impl Into<String>, confidence: f64) -> Self {
        Self {
            field_name: field.display_name(),
            field_type: field.field_type.clone(),
            user_field: label.into(),
            confidence,
            method: MappingMethod::Model,
        }
    }

    /// The fixed category, if `user_field` names one
    pub fn category(&self) -> Option<FieldCategory> {
        self.user_field.parse().ok()
    }
}

/// All mappings for one form plus their mean confidence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterpretationResult {
    pub mappings: Vec<FieldMapping>,
    pub confidence: f64,
}

impl InterpretationResult {
    pub fn from_mappings(mappings: Vec<FieldMapping>) -> Self {
        let confidence = Self::aggregate_confidence(&mappings);
        Self {
            mappings,
            confidence,
        }
    }

    /// Arithmetic mean of the mapping confidences, 0 for an empty list
    pub fn aggregate_confidence(mappings: &[FieldMapping]) -> f64 {
        if mappings.is_empty() {
            return 0.0;
        }
        let total: f64 = mappings.iter().map(|m| m.confidence).sum();
        total / mappings.len() as f64
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// A persisted field → profile mapping for one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMapping {
    pub domain: String,
    #[serde(default)]
    pub form_id: Option<String>,
    pub field_name: String,
    #[serde(default)]
    pub field_type: Option<String>,
    pub user_field: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}

impl StoredMapping {
    pub fn new(
        domain: impl Into<String>,
        field_name: impl Into<String>,
        user_field: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            form_id: None,
            field_name: field_name.into(),
            field_type: None,
            user_field: user_field.into(),
            confidence: default_confidence(),
        }
    }

    pub fn with_form_id(mut self, form_id: Option<String>) -> Self {
        self.form_id = form_id;
        self
    }

    pub fn with_field_type(mut self, field_type: Option<String>) -> Self {
        self.field_type = field_type;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }
}

/// One entry of a bulk mapping upload; incomplete entries are tolerated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub field_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub field_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_field: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl MappingEntry {
    /// Complete mapping for a site, or `None` without field_name or user_field
    pub fn into_stored(self, domain: &str, form_id: Option<&str>) -> Option<StoredMapping> {
        let field_name = self.field_name.filter(|s| !s.is_empty())?;
        let user_field = self.user_field.filter(|s| !s.is_empty())?;
        Some(
            StoredMapping::new(domain, field_name, user_field)
                .with_form_id(form_id.map(str::to_string))
                .with_field_type(self.field_type)
                .with_confidence(self.confidence.unwrap_or_else(default_confidence)),
        )
    }
}

/// Accepts strings, other scalars (stringified) and null for optional text attributes
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_text_joins_attributes() {
        let field = FieldDescriptor::new()
            .with_name("fname")
            .with_label("First")
            .with_placeholder("Jane");
        assert_eq!(field.text(), "fname  First Jane");
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let field = FieldDescriptor::new().with_name("").with_id("user-email");
        assert_eq!(field.display_name(), "user-email");

        let field = FieldDescriptor::new().with_name("email").with_id("user-email");
        assert_eq!(field.display_name(), "email");

        assert_eq!(FieldDescriptor::new().display_name(), "");
    }

    #[test]
    fn test_descriptor_deserializes_type_and_scalars() {
        let json = r#"{"name": "zip", "type": "text", "id": 42, "label": null}"#;
        let field: FieldDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(field.name.as_deref(), Some("zip"));
        assert_eq!(field.field_type.as_deref(), Some("text"));
        assert_eq!(field.id.as_deref(), Some("42"));
        assert_eq!(field.label, None);
        assert_eq!(field.placeholder, None);
    }

    #[test]
    fn test_blank_descriptor() {
        assert!(FieldDescriptor::new().is_blank());
        assert!(FieldDescriptor::new().with_name("").with_id("").is_blank());
        assert!(!FieldDescriptor::new().with_type("email").is_blank());
    }

    #[test]
    fn test_form_descriptor_defaults() {
        let form: FormDescriptor = serde_json::from_str("{}").unwrap();
        assert!(form.fields.is_empty());
        assert!(form.domain.is_none());
    }

    #[test]
    fn test_form_from_json_shapes() {
        let form = FormDescriptor::from_json(r#"{"domain": "a.com", "fields": [{"name": "zip"}]}"#)
            .unwrap();
        assert_eq!(form.domain.as_deref(), Some("a.com"));
        assert_eq!(form.fields[0].display_name(), "zip");

        let bare = FormDescriptor::from_json(r#"[{"id": "email"}, {"label": "City"}]"#).unwrap();
        assert_eq!(bare.fields.len(), 2);
        assert!(bare.domain.is_none());

        assert!(matches!(
            FormDescriptor::from_json(r#"{"name": "email"}"#),
            Err(Error::InvalidForm(_))
        ));
        assert!(matches!(FormDescriptor::from_json("{oops"), Err(Error::Parse(_))));
        assert!(matches!(
            FormDescriptor::from_json(r#"{"fields": "x"}"#),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_aggregate_confidence_is_mean() {
        let field = FieldDescriptor::new().with_name("a");
        let mappings = vec![
            FieldMapping::from_pattern(&field, FieldCategory::Email, 0.9),
            FieldMapping::from_pattern(&field, FieldCategory::FullName, 0.8),
        ];
        let result = InterpretationResult::from_mappings(mappings);
        assert!((result.confidence - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_confidence_empty_is_zero() {
        let result = InterpretationResult::from_mappings(vec![]);
        assert_eq!(result.confidence, 0.0);
        assert!(result.is_empty());
    }

    #[test]
    fn test_mapping_serialization_shape() {
        let field = FieldDescriptor::new().with_name("email").with_type("email");
        let mapping = FieldMapping::from_pattern(&field, FieldCategory::Email, 0.9);
        let value = serde_json::to_value(&mapping).unwrap();
        assert_eq!(value["field_name"], "email");
        assert_eq!(value["field_type"], "email");
        assert_eq!(value["user_field"], "email");
        assert_eq!(value["method"], "pattern");
        assert_eq!(mapping.category(), Some(FieldCategory::Email));
    }

    #[test]
    fn test_model_mapping_may_carry_free_text() {
        let field = FieldDescriptor::new().with_id("company");
        let mapping = FieldMapping::from_model(&field, "company_name", 0.85);
        assert_eq!(mapping.method, MappingMethod::Model);
        assert_eq!(mapping.category(), None);
    }

    #[test]
    fn test_stored_mapping_defaults() {
        let mapping: StoredMapping = serde_json::from_str(
            r#"{"domain": "example.com", "field_name": "q", "user_field": "email"}"#,
        )
        .unwrap();
        assert_eq!(mapping.confidence, 1.0);
        assert!(mapping.form_id.is_none());

        let clamped = StoredMapping::new("example.com", "q", "email").with_confidence(1.7);
        assert_eq!(clamped.confidence, 1.0);
    }

    #[test]
    fn test_mapping_entry_requires_name_and_user_field() {
        let entries: Vec<MappingEntry> = serde_json::from_str(
            r#"[
                {"field_name": "q", "user_field": "email"},
                {"field_name": "q2"},
                {"user_field": "phone", "confidence": 0.4},
                {"field_name": "", "user_field": "phone"}
            ]"#,
        )
        .unwrap();

        let stored: Vec<StoredMapping> = entries
            .into_iter()
            .filter_map(|e| e.into_stored("example.com", Some("signup")))
            .collect();

        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].confidence, 1.0);
        assert_eq!(stored[0].form_id.as_deref(), Some("signup"));
    }
}
