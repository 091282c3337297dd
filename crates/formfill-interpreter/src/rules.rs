use formfill_core::FieldCategory;
use lazy_static::lazy_static;
use regex::Regex;

/// One row of the field classification table
pub struct FieldRule {
    pub category: FieldCategory,
    /// HTML input type that matches regardless of the field text
    pub input_type: Option<&'static str>,
    pub pattern: Regex,
    pub confidence: f64,
}

impl FieldRule {
    fn new(
        category: FieldCategory,
        input_type: Option<&'static str>,
        pattern: &str,
        confidence: f64,
    ) -> Self {
        Self {
            category,
            input_type,
            pattern: Regex::new(&format!("(?i){}", pattern)).unwrap(),
            confidence,
        }
    }

    pub fn matches(&self, field_text: &str, field_type: &str) -> bool {
        if let Some(input_type) = self.input_type {
            if field_type.eq_ignore_ascii_case(input_type) {
                return true;
            }
        }
        self.pattern.is_match(field_text)
    }
}

lazy_static! {
    /// Classification rules in priority order.
    ///
    /// Patterns overlap ("name" also matches "first_name"), so more specific
    /// categories must stay ahead of the generic ones. Do not reorder.
    pub static ref RULES: Vec<FieldRule> = vec![
        FieldRule::new(FieldCategory::Email, Some("email"), r"email|e[-_]?mail|mail", 0.9),
        FieldRule::new(FieldCategory::Phone, Some("tel"), r"phone|telephone|mobile|cell|tel", 0.9),
        FieldRule::new(FieldCategory::FirstName, None, r"first[-_]?name|given[-_]?name|fname", 0.9),
        FieldRule::new(
            FieldCategory::LastName,
            None,
            r"last[-_]?name|surname|family[-_]?name|lname",
            0.9,
        ),
        FieldRule::new(FieldCategory::FullName, None, r"name|full[-_]?name", 0.8),
        FieldRule::new(FieldCategory::AddressStreet, None, r"address|street|addr", 0.8),
        FieldRule::new(FieldCategory::AddressCity, None, r"city|town|locality", 0.8),
        FieldRule::new(FieldCategory::AddressState, None, r"state|province|region|county", 0.8),
        FieldRule::new(FieldCategory::AddressZip, None, r"zip|postal|post[-_]?code", 0.9),
        FieldRule::new(FieldCategory::AddressCountry, None, r"country|nation", 0.9),
    ];
}

/// First matching rule for the given text and input type
pub fn match_field(field_text: &str, field_type: &str) -> Option<&'static FieldRule> {
    RULES.iter().find(|rule| rule.matches(field_text, field_type))
}
