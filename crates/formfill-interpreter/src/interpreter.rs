use crate::assist::AssistedInterpreter;
use crate::rules;
use formfill_core::{FieldDescriptor, FieldMapping, FormDescriptor, InterpretationResult};

/// Pattern-matching interpreter for single form fields
///
/// Stateless: every call only consults the compiled rule table.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldInterpreter;

impl FieldInterpreter {
    pub fn new() -> Self {
        Self
    }

    /// Map one field to a profile category, or `None` when no rule matches
    pub fn interpret_field(&self, field: &FieldDescriptor) -> Option<FieldMapping> {
        let field_text = field.text();
        let rule = rules::match_field(&field_text, field.type_str())?;

        tracing::debug!(
            "Field '{}' matched {} ({:.2})",
            field.display_name(),
            rule.category,
            rule.confidence
        );

        Some(FieldMapping::from_pattern(field, rule.category, rule.confidence))
    }

    /// Interpret every field of a form and aggregate the confidence
    pub fn interpret_form(&self, form: &FormDescriptor) -> InterpretationResult {
        let mappings: Vec<FieldMapping> = form
            .fields
            .iter()
            .filter_map(|field| self.interpret_field(field))
            .collect();

        let result = InterpretationResult::from_mappings(mappings);
        tracing::debug!(
            "Interpreted {} of {} field(s), confidence {:.2}",
            result.mappings.len(),
            form.fields.len(),
            result.confidence
        );
        result
    }
}

/// Form interpretation service handed to the HTTP layer
///
/// Pattern matching only, unless constructed with a model assist.
pub struct FormInterpreter {
    patterns: FieldInterpreter,
    assist: Option<AssistedInterpreter>,
}

impl FormInterpreter {
    pub fn new() -> Self {
        Self {
            patterns: FieldInterpreter::new(),
            assist: None,
        }
    }

    pub fn with_assist(assist: AssistedInterpreter) -> Self {
        Self {
            patterns: FieldInterpreter::new(),
            assist: Some(assist),
        }
    }

    pub fn is_assisted(&self) -> bool {
        self.assist.is_some()
    }

    pub async fn interpret_form(&self, form: &FormDescriptor) -> InterpretationResult {
        match &self.assist {
            Some(assist) => assist.interpret_form(form).await,
            None => self.patterns.interpret_form(form),
        }
    }

    pub async fn interpret_field(&self, field: &FieldDescriptor) -> Option<FieldMapping> {
        match &self.assist {
            Some(assist) => assist.interpret_field(field).await,
            None => self.patterns.interpret_field(field),
        }
    }
}

impl Default for FormInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formfill_core::{FieldCategory, MappingMethod};

    fn interpret(field: FieldDescriptor) -> Option<FieldMapping> {
        FieldInterpreter::new().interpret_field(&field)
    }

    fn category_of(field: FieldDescriptor) -> Option<FieldCategory> {
        interpret(field).and_then(|m| m.category())
    }

    #[test]
    fn test_fname_resolves_to_first_name() {
        let field = FieldDescriptor::new()
            .with_name("fname")
            .with_id("")
            .with_label("")
            .with_placeholder("");
        let mapping = interpret(field).unwrap();
        assert_eq!(mapping.user_field, "first_name");
        assert_eq!(mapping.confidence, 0.9);
        assert_eq!(mapping.method, MappingMethod::Pattern);
    }

    #[test]
    fn test_first_name_never_resolves_to_full_name() {
        for text in ["first_name", "first-name", "firstname", "given_name", "FirstName"] {
            let mapping = interpret(FieldDescriptor::new().with_name(text)).unwrap();
            assert_eq!(mapping.user_field, "first_name", "input: {}", text);
            assert_eq!(mapping.confidence, 0.9);
        }
    }

    #[test]
    fn test_last_name_beats_full_name() {
        assert_eq!(
            category_of(FieldDescriptor::new().with_id("surname")),
            Some(FieldCategory::LastName)
        );
        assert_eq!(
            category_of(FieldDescriptor::new().with_label("Family-Name")),
            Some(FieldCategory::LastName)
        );
    }

    #[test]
    fn test_plain_name_is_full_name() {
        let mapping = interpret(FieldDescriptor::new().with_name("name")).unwrap();
        assert_eq!(mapping.user_field, "full_name");
        assert_eq!(mapping.confidence, 0.8);
    }

    #[test]
    fn test_email_type_wins_regardless_of_text() {
        for text in ["first_name", "city", "zip", ""] {
            let field = FieldDescriptor::new().with_name(text).with_type("email");
            let mapping = interpret(field).unwrap();
            assert_eq!(mapping.user_field, "email");
            assert_eq!(mapping.confidence, 0.9);
        }
    }

    #[test]
    fn test_tel_type_is_phone() {
        let field = FieldDescriptor::new().with_name("contact").with_type("tel");
        assert_eq!(category_of(field), Some(FieldCategory::Phone));
    }

    #[test]
    fn test_address_categories() {
        let cases = [
            ("street", FieldCategory::AddressStreet, 0.8),
            ("city", FieldCategory::AddressCity, 0.8),
            ("province", FieldCategory::AddressState, 0.8),
            ("postcode", FieldCategory::AddressZip, 0.9),
            ("country", FieldCategory::AddressCountry, 0.9),
        ];
        for (text, expected, confidence) in cases {
            let mapping = interpret(FieldDescriptor::new().with_id(text)).unwrap();
            assert_eq!(mapping.category(), Some(expected), "input: {}", text);
            assert_eq!(mapping.confidence, confidence);
        }
    }

    #[test]
    fn test_label_and_placeholder_are_considered() {
        let field = FieldDescriptor::new()
            .with_name("f1")
            .with_placeholder("Your e-mail");
        assert_eq!(category_of(field), Some(FieldCategory::Email));
    }

    #[test]
    fn test_field_name_uses_id_when_name_missing() {
        let mapping = interpret(FieldDescriptor::new().with_id("billing-city")).unwrap();
        assert_eq!(mapping.field_name, "billing-city");
        assert_eq!(mapping.field_type, None);
    }

    #[test]
    fn test_blank_descriptor_yields_nothing() {
        assert!(interpret(FieldDescriptor::new()).is_none());
        assert!(interpret(FieldDescriptor::new().with_name("").with_id("")).is_none());
    }

    #[test]
    fn test_empty_form() {
        let result = FieldInterpreter::new().interpret_form(&FormDescriptor::new(vec![]));
        assert!(result.mappings.is_empty());
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_form_confidence_is_mean_of_mappings() {
        let form = FormDescriptor::new(vec![
            FieldDescriptor::new().with_name("email"),
            FieldDescriptor::new().with_name("name"),
            FieldDescriptor::new().with_name("coupon"),
        ]);
        let result = FieldInterpreter::new().interpret_form(&form);

        assert_eq!(result.mappings.len(), 2);
        assert!((result.confidence - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_form_with_no_matches_has_zero_confidence() {
        let form = FormDescriptor::new(vec![FieldDescriptor::new().with_name("coupon")]);
        let result = FieldInterpreter::new().interpret_form(&form);
        assert!(result.mappings.is_empty());
        assert_eq!(result.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_unassisted_form_interpreter_matches_patterns() {
        let interpreter = FormInterpreter::new();
        assert!(!interpreter.is_assisted());

        let form = FormDescriptor::new(vec![FieldDescriptor::new().with_name("lname")]);
        let result = interpreter.interpret_form(&form).await;
        assert_eq!(result.mappings[0].user_field, "last_name");
    }
}
