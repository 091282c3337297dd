use crate::action::InputKind;
use crate::scanner::ScannedField;
use async_trait::async_trait;
use formfill_core::{FieldCategory, InterpretationResult, UserProfile};
use formfill_interpreter::FieldInterpreter;
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

const EMAIL_DOMAINS: [&str; 4] = ["example.com", "test.org", "fake.net", "dummy.io"];
const URL_TLDS: [&str; 4] = ["com", "org", "net", "io"];
const PASSWORD_CHARS: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*";
const LOREM_WORDS: [&str; 19] = [
    "lorem",
    "ipsum",
    "dolor",
    "sit",
    "amet",
    "consectetur",
    "adipiscing",
    "elit",
    "sed",
    "do",
    "eiusmod",
    "tempor",
    "incididunt",
    "ut",
    "labore",
    "et",
    "dolore",
    "magna",
    "aliqua",
];

/// Supplies the text typed into a control
#[async_trait]
pub trait ValueGenerator: Send {
    /// Called once per scan with the controls about to be filled
    async fn prepare(&mut self, _fields: &[ScannedField]) {}

    fn generate(&mut self, field: &ScannedField, kind: InputKind) -> String;
}

/// Random placeholder data shaped like the expected input
pub struct RandomValues {
    rng: StdRng,
}

impl RandomValues {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn text(&mut self, length: usize) -> String {
        (&mut self.rng)
            .sample_iter(Alphanumeric)
            .take(length)
            .map(char::from)
            .collect()
    }

    pub fn email(&mut self) -> String {
        let user = self.text(8).to_lowercase();
        format!("{}@{}", user, self.pick(&EMAIL_DOMAINS))
    }

    pub fn password(&mut self) -> String {
        (0..12)
            .map(|_| PASSWORD_CHARS[self.rng.gen_range(0..PASSWORD_CHARS.len())] as char)
            .collect()
    }

    pub fn number(&mut self) -> String {
        self.rng.gen_range(1..=100).to_string()
    }

    pub fn phone(&mut self) -> String {
        format!(
            "555{}{}",
            self.rng.gen_range(100..=999),
            self.rng.gen_range(1000..=9999)
        )
    }

    pub fn url(&mut self) -> String {
        let host = self.text(8).to_lowercase();
        format!("https://{}.{}", host, self.pick(&URL_TLDS))
    }

    /// Three lines of 5 to 10 lorem words
    pub fn paragraph(&mut self) -> String {
        (0..3)
            .map(|_| {
                let count = self.rng.gen_range(5..=10);
                (0..count)
                    .map(|_| self.pick(&LOREM_WORDS))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn pick(&mut self, choices: &[&'static str]) -> &'static str {
        choices.choose(&mut self.rng).copied().unwrap_or_default()
    }

    pub fn for_kind(&mut self, kind: InputKind) -> String {
        match kind {
            InputKind::Text => self.text(10),
            InputKind::Email => self.email(),
            InputKind::Password => self.password(),
            InputKind::Number => self.number(),
            InputKind::Tel => self.phone(),
            InputKind::Url => self.url(),
            InputKind::Paragraph => self.paragraph(),
        }
    }
}

impl Default for RandomValues {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ValueGenerator for RandomValues {
    fn generate(&mut self, _field: &ScannedField, kind: InputKind) -> String {
        self.for_kind(kind)
    }
}

/// Profile-backed values with random fallback
///
/// Labels set through [`ProfileValues::set_mappings`] take precedence over
/// the local pattern interpreter.
pub struct ProfileValues {
    profile: UserProfile,
    mappings: HashMap<String, String>,
    interpreter: FieldInterpreter,
    fallback: RandomValues,
}

impl ProfileValues {
    pub fn new(profile: UserProfile) -> Self {
        Self {
            profile,
            mappings: HashMap::new(),
            interpreter: FieldInterpreter::new(),
            fallback: RandomValues::new(),
        }
    }

    pub fn with_fallback(mut self, fallback: RandomValues) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Use labels from an interpretation, keyed by field name
    ///
    /// Replaces the labels of the previous call, so a field name only keeps
    /// the meaning it had on the page that was just scanned.
    pub fn set_mappings(&mut self, result: &InterpretationResult) {
        self.mappings = result
            .mappings
            .iter()
            .map(|mapping| (mapping.field_name.clone(), mapping.user_field.clone()))
            .collect();
    }

    pub fn clear_mappings(&mut self) {
        self.mappings.clear();
    }

    fn label_for(&self, field: &ScannedField) -> Option<String> {
        let descriptor = field.descriptor();
        let key = descriptor.display_name();
        if let Some(label) = self.mappings.get(&key) {
            return Some(label.clone());
        }
        self.interpreter
            .interpret_field(&descriptor)
            .map(|mapping| mapping.user_field)
    }

    fn profile_value(&self, label: &str) -> Option<String> {
        match label.parse::<FieldCategory>() {
            Ok(category) => self.profile.value_for(category),
            Err(_) => self.profile.custom_value(label),
        }
    }
}

#[async_trait]
impl ValueGenerator for ProfileValues {
    fn generate(&mut self, field: &ScannedField, kind: InputKind) -> String {
        if !matches!(kind, InputKind::Password | InputKind::Paragraph) {
            if let Some(label) = self.label_for(field) {
                if let Some(value) = self.profile_value(&label) {
                    tracing::debug!("Using profile value '{}' for field {}", label, field.key);
                    return value;
                }
            }
        }
        self.fallback.for_kind(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formfill_core::{FieldDescriptor, FieldMapping};
    use serde_json::json;

    fn field(name: &str, field_type: &str) -> ScannedField {
        ScannedField {
            key: format!("ff-{}", name),
            tag: "input".to_string(),
            field_type: Some(field_type.to_string()),
            name: Some(name.to_string()),
            visible: true,
            ..Default::default()
        }
    }

    fn profile() -> UserProfile {
        UserProfile::from_value(
            "default",
            &json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": "ada@example.com",
                "company": "Analytical Engines"
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_random_formats() {
        let mut values = RandomValues::seeded(42);

        let text = values.text(10);
        assert_eq!(text.len(), 10);
        assert!(text.chars().all(|c| c.is_ascii_alphanumeric()));

        let email = values.email();
        let (user, domain) = email.split_once('@').unwrap();
        assert_eq!(user.len(), 8);
        assert!(user.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert!(EMAIL_DOMAINS.contains(&domain));

        let password = values.password();
        assert_eq!(password.len(), 12);
        assert!(password.bytes().all(|b| PASSWORD_CHARS.contains(&b)));

        let number: u32 = values.number().parse().unwrap();
        assert!((1..=100).contains(&number));

        let phone = values.phone();
        assert_eq!(phone.len(), 10);
        assert!(phone.starts_with("555"));
        assert!(phone.chars().all(|c| c.is_ascii_digit()));

        let url = values.url();
        let host = url.strip_prefix("https://").unwrap();
        let (name, tld) = host.split_once('.').unwrap();
        assert_eq!(name.len(), 8);
        assert!(URL_TLDS.contains(&tld));
    }

    #[test]
    fn test_paragraph_shape() {
        let mut values = RandomValues::seeded(5);
        for _ in 0..10 {
            let paragraph = values.paragraph();
            let lines: Vec<&str> = paragraph.lines().collect();
            assert_eq!(lines.len(), 3);
            for line in lines {
                let words: Vec<&str> = line.split(' ').collect();
                assert!((5..=10).contains(&words.len()));
                assert!(words.iter().all(|w| LOREM_WORDS.contains(w)));
            }
        }
    }

    #[test]
    fn test_seeded_values_are_reproducible() {
        assert_eq!(RandomValues::seeded(9).email(), RandomValues::seeded(9).email());
    }

    #[test]
    fn test_profile_values_use_pattern_categories() {
        let mut values = ProfileValues::new(profile()).with_fallback(RandomValues::seeded(1));

        assert_eq!(values.generate(&field("email", "email"), InputKind::Email), "ada@example.com");
        assert_eq!(values.generate(&field("first_name", "text"), InputKind::Text), "Ada");
        assert_eq!(values.generate(&field("full_name", "text"), InputKind::Text), "Ada Lovelace");
    }

    #[test]
    fn test_profile_values_fall_back_to_random() {
        let mut values = ProfileValues::new(profile()).with_fallback(RandomValues::seeded(1));

        // Matches the phone rule, but the profile has no phone.
        let phone = values.generate(&field("phone", "tel"), InputKind::Tel);
        assert!(phone.starts_with("555"));

        let other = values.generate(&field("xyzzy", "text"), InputKind::Text);
        assert_eq!(other.len(), 10);
    }

    #[test]
    fn test_passwords_never_come_from_profile() {
        let mut values = ProfileValues::new(profile()).with_fallback(RandomValues::seeded(1));
        let password = values.generate(&field("email", "password"), InputKind::Password);
        assert_ne!(password, "ada@example.com");
        assert_eq!(password.len(), 12);
    }

    #[test]
    fn test_remote_mappings_take_precedence() {
        let mut values = ProfileValues::new(profile()).with_fallback(RandomValues::seeded(1));
        let descriptor = FieldDescriptor::new().with_name("org");
        values.set_mappings(&InterpretationResult::from_mappings(vec![
            FieldMapping::from_model(&descriptor, "company", 0.85),
        ]));

        assert_eq!(
            values.generate(&field("org", "text"), InputKind::Text),
            "Analytical Engines"
        );
    }

    #[test]
    fn test_mappings_are_replaced_per_page() {
        let mut values = ProfileValues::new(profile()).with_fallback(RandomValues::seeded(1));
        let org = FieldDescriptor::new().with_name("org");
        values.set_mappings(&InterpretationResult::from_mappings(vec![
            FieldMapping::from_model(&org, "company", 0.85),
        ]));

        let code = FieldDescriptor::new().with_name("code");
        values.set_mappings(&InterpretationResult::from_mappings(vec![
            FieldMapping::from_model(&code, "company", 0.85),
        ]));

        assert_ne!(
            values.generate(&field("org", "text"), InputKind::Text),
            "Analytical Engines"
        );
        assert_eq!(
            values.generate(&field("code", "text"), InputKind::Text),
            "Analytical Engines"
        );

        values.clear_mappings();
        assert_ne!(
            values.generate(&field("code", "text"), InputKind::Text),
            "Analytical Engines"
        );
    }
}
