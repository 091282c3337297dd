use super::ContextDocument;
use formfill_core::{FieldCategory, FieldDescriptor};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::Write;

/// Longest free-text label accepted from a model
const MAX_LABEL_LEN: usize = 64;

lazy_static! {
    static ref LABEL_RE: Regex = Regex::new(r"^[a-z][a-z0-9_]*$").unwrap();
}

/// What a model answer resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum ModelAnswer {
    Category(FieldCategory),
    FreeText(String),
}

/// Prompt asking the model to classify one field
pub fn build_prompt(field: &FieldDescriptor, context: &[&ContextDocument]) -> String {
    let mut prompt = String::new();

    prompt.push_str("You classify HTML form fields for an autofill tool.\n\n");

    if !context.is_empty() {
        prompt.push_str("Background:\n");
        for doc in context {
            let _ = writeln!(prompt, "- {}: {}", doc.title, doc.text.trim());
        }
        prompt.push('\n');
    }

    prompt.push_str("Field:\n");
    let attributes = [
        ("name", &field.name),
        ("id", &field.id),
        ("type", &field.field_type),
        ("label", &field.label),
        ("placeholder", &field.placeholder),
    ];
    for (key, value) in attributes {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            let _ = writeln!(prompt, "  {}: {}", key, value);
        }
    }

    prompt.push_str("\nCategories:\n");
    for category in FieldCategory::ALL {
        let _ = writeln!(prompt, "- {} ({})", category, category.description());
    }

    prompt.push_str(
        "\nAnswer with exactly one category name. If none fits, answer with a short \
         snake_case label for the data the field expects, or \"none\" if unsure.\n",
    );
    prompt
}

/// Normalize a raw model answer
///
/// Returns `None` for empty, "none"/"unknown" style answers and for anything
/// that does not look like a label.
pub fn parse_answer(raw: &str) -> Option<ModelAnswer> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;

    let cleaned: String = line
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect();

    if matches!(cleaned.as_str(), "" | "none" | "unknown" | "n/a" | "null") {
        return None;
    }

    if let Ok(category) = cleaned.parse::<FieldCategory>() {
        return Some(ModelAnswer::Category(category));
    }

    if cleaned.len() <= MAX_LABEL_LEN && LABEL_RE.is_match(&cleaned) {
        return Some(ModelAnswer::FreeText(cleaned));
    }
    None
}
