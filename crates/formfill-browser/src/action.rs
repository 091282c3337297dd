use crate::scanner::ScannedField;
use crate::values::ValueGenerator;
use rand::Rng;
use rand::seq::SliceRandom;

/// Kind of value a fillable control expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Email,
    Password,
    Number,
    Tel,
    Url,
    Paragraph,
}

impl InputKind {
    /// Map an `<input type>` to a kind; `None` for types that are never typed into
    pub fn from_input_type(input_type: &str) -> Option<Self> {
        match input_type {
            "text" => Some(InputKind::Text),
            "email" => Some(InputKind::Email),
            "password" => Some(InputKind::Password),
            "number" => Some(InputKind::Number),
            "tel" => Some(InputKind::Tel),
            "url" => Some(InputKind::Url),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Text => "text",
            InputKind::Email => "email",
            InputKind::Password => "password",
            InputKind::Number => "number",
            InputKind::Tel => "tel",
            InputKind::Url => "url",
            InputKind::Paragraph => "paragraph",
        }
    }
}

const SKIPPED_INPUT_TYPES: [&str; 6] = ["hidden", "submit", "button", "reset", "file", "image"];
const PLACEHOLDER_PREFIXES: [&str; 3] = ["select", "choose", "--"];

/// What the driver does with one scanned control
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillAction {
    /// Write a value and dispatch `input`/`change`
    Type(String),
    /// Select the option with this value
    Select(String),
    Check,
    /// Coin flip came up tails; the checkbox counts as handled
    LeaveUnchecked,
    /// Click the group member at `index`
    PickRadio { index: usize },
    /// A member of the group is already selected
    KeepRadio,
    Skip,
}

impl FillAction {
    /// Whether the control is done with after this action
    pub fn is_handled(&self) -> bool {
        !matches!(self, FillAction::Skip)
    }
}

/// Decide how to fill a control
pub fn plan_action<R: Rng + ?Sized>(
    field: &ScannedField,
    fill_hidden: bool,
    generator: &mut dyn ValueGenerator,
    rng: &mut R,
) -> FillAction {
    if !field.visible && !fill_hidden {
        return FillAction::Skip;
    }

    match field.tag.as_str() {
        "textarea" => FillAction::Type(generator.generate(field, InputKind::Paragraph)),
        "select" => plan_select(field, rng),
        "input" => {
            match input_type(field).as_str() {
                "checkbox" => {
                    if field.checked || !rng.gen_bool(0.5) {
                        FillAction::LeaveUnchecked
                    } else {
                        FillAction::Check
                    }
                }
                "radio" => plan_radio(field, rng),
                t if SKIPPED_INPUT_TYPES.contains(&t) => FillAction::Skip,
                t => match InputKind::from_input_type(t) {
                    Some(kind) => FillAction::Type(generator.generate(field, kind)),
                    None => FillAction::Skip,
                },
            }
        }
        _ => FillAction::Skip,
    }
}

/// Whether no later scan could ever fill this control
///
/// Hidden, button-like and unsupported input types stay that way for the life
/// of the element. Invisible controls and empty selects may still change.
pub fn never_fillable(field: &ScannedField) -> bool {
    match field.tag.as_str() {
        "textarea" | "select" => false,
        "input" => match input_type(field).as_str() {
            "checkbox" | "radio" => false,
            t => InputKind::from_input_type(t).is_none(),
        },
        _ => true,
    }
}

/// Lowercased `type` attribute, `text` when absent
fn input_type(field: &ScannedField) -> String {
    field
        .field_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("text")
        .to_lowercase()
}

fn plan_select<R: Rng + ?Sized>(field: &ScannedField, rng: &mut R) -> FillAction {
    let candidates: Vec<&str> = field
        .options
        .iter()
        .filter(|option| {
            let text = option.text.trim().to_lowercase();
            !option.value.is_empty()
                && !PLACEHOLDER_PREFIXES
                    .iter()
                    .any(|prefix| text.starts_with(prefix))
        })
        .map(|option| option.value.as_str())
        .collect();

    match candidates.choose(rng) {
        Some(value) => FillAction::Select(value.to_string()),
        None => FillAction::Skip,
    }
}

fn plan_radio<R: Rng + ?Sized>(field: &ScannedField, rng: &mut R) -> FillAction {
    let has_name = field.name.as_deref().is_some_and(|n| !n.is_empty());
    if !has_name || field.group_size == 0 {
        return FillAction::Skip;
    }

    if field.group_checked {
        FillAction::KeepRadio
    } else {
        FillAction::PickRadio {
            index: rng.gen_range(0..field.group_size),
        }
    }
}
