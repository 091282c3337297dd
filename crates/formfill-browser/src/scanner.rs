use crate::action::FillAction;
use formfill_core::FieldDescriptor;
use serde::Deserialize;

/// Attribute the scan script stamps on every control it has seen
pub(crate) const KEY_ATTRIBUTE: &str = "data-formfill-key";

/// Enumerates `input`, `textarea` and `select` elements, tagging new ones
/// with a key unique to the document, and returns a description of each
///
/// Every document gets its own random id on first scan, so keys from a page
/// that was navigated away from never collide with the next one.
pub(crate) const SCAN_SCRIPT: &str = r#"(() => {
  const KEY = 'data-formfill-key';
  if (!window.__formfillDocument) {
    window.__formfillDocument = Date.now().toString(36) + Math.random().toString(36).slice(2, 10);
    window.__formfillCounter = 0;
  }
  const doc = window.__formfillDocument;

  const labelOf = (el) => {
    if (el.id) {
      const byFor = Array.from(document.querySelectorAll('label')).find((l) => l.htmlFor === el.id);
      if (byFor && byFor.textContent.trim()) return byFor.textContent.trim();
    }
    const wrapping = el.closest('label');
    if (wrapping && wrapping.textContent.trim()) return wrapping.textContent.trim();
    return el.getAttribute('aria-label');
  };

  const isVisible = (el) => {
    const rect = el.getBoundingClientRect();
    const style = window.getComputedStyle(el);
    return rect.width > 0 && rect.height > 0 && style.visibility !== 'hidden' && style.display !== 'none';
  };

  const fields = Array.from(document.querySelectorAll('input, textarea, select')).map((el) => {
    if (!el.hasAttribute(KEY)) {
      window.__formfillCounter += 1;
      el.setAttribute(KEY, 'ff-' + doc + '-' + window.__formfillCounter);
    }
    const tag = el.tagName.toLowerCase();
    const type = tag === 'input' ? (el.getAttribute('type') || 'text').toLowerCase() : null;
    const group = type === 'radio' && el.name
      ? Array.from(document.querySelectorAll('input[type="radio"]')).filter((r) => r.name === el.name)
      : [];

    return {
      key: el.getAttribute(KEY),
      tag: tag,
      type: type,
      name: el.getAttribute('name'),
      id: el.id || null,
      label: labelOf(el) || null,
      placeholder: el.getAttribute('placeholder'),
      visible: isVisible(el),
      checked: !!el.checked,
      options: tag === 'select'
        ? Array.from(el.options).map((o) => ({ value: o.value, text: (o.text || '').trim() }))
        : [],
      group_size: group.length,
      group_checked: group.some((r) => r.checked),
    };
  });

  return { document: doc, fields: fields };
})()"#;

/// Result of one run of the scan script
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScanResult {
    /// Random id of the scanned document
    pub document: String,
    #[serde(default)]
    pub fields: Vec<ScannedField>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScannedOption {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub text: String,
}

/// One form control as reported by the scan script
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScannedField {
    pub key: String,
    pub tag: String,
    #[serde(rename = "type", default)]
    pub field_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub options: Vec<ScannedOption>,
    #[serde(default)]
    pub group_size: usize,
    #[serde(default)]
    pub group_checked: bool,
}

impl ScannedField {
    /// Interpreter view of the control
    pub fn descriptor(&self) -> FieldDescriptor {
        FieldDescriptor {
            name: non_empty(&self.name),
            id: non_empty(&self.id),
            field_type: match self.tag.as_str() {
                "input" => non_empty(&self.field_type),
                other => Some(other.to_string()),
            },
            label: non_empty(&self.label),
            placeholder: non_empty(&self.placeholder),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Script applying `action` to the control tagged `key`
///
/// Evaluates to `false` when the control is gone, `true` otherwise. Actions
/// that leave the page untouched have no script.
pub(crate) fn action_script(key: &str, action: &FillAction) -> Option<String> {
    let body = match action {
        FillAction::Type(value) => format!(
            "const value = {}; \
             const proto = el.tagName === 'TEXTAREA' ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype; \
             const setter = Object.getOwnPropertyDescriptor(proto, 'value').set; \
             el.focus(); \
             setter.call(el, value); \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return true;",
            js_string(value)
        ),
        FillAction::Select(value) => format!(
            "el.value = {}; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return true;",
            js_string(value)
        ),
        FillAction::Check => "if (!el.checked) el.click(); return true;".to_string(),
        FillAction::PickRadio { index } => format!(
            "const group = Array.from(document.querySelectorAll('input[type=\"radio\"]')).filter((r) => r.name === el.name); \
             if (group.some((r) => r.checked)) return true; \
             const target = group[{}]; \
             if (!target) return false; \
             target.click(); \
             return true;",
            index
        ),
        FillAction::LeaveUnchecked | FillAction::KeepRadio | FillAction::Skip => return None,
    };

    Some(format!(
        "(() => {{ \
         const key = {}; \
         const el = Array.from(document.querySelectorAll('[{}]')).find((e) => e.getAttribute('{}') === key); \
         if (!el) return false; \
         {} \
         }})()",
        js_string(key),
        KEY_ATTRIBUTE,
        KEY_ATTRIBUTE,
        body
    ))
}

/// JSON string literals are valid JavaScript string literals
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_scan_result() {
        let raw = json!([
            {
                "key": "ff-1",
                "tag": "input",
                "type": "email",
                "name": "email",
                "id": null,
                "label": "Email address",
                "placeholder": null,
                "visible": true,
                "checked": false,
                "options": [],
                "group_size": 0,
                "group_checked": false
            },
            {
                "key": "ff-2",
                "tag": "select",
                "type": null,
                "name": "country",
                "options": [{"value": "", "text": "Choose"}, {"value": "de", "text": "Germany"}]
            }
        ]);

        let fields: Vec<ScannedField> = serde_json::from_value(raw).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field_type.as_deref(), Some("email"));
        assert_eq!(fields[0].label.as_deref(), Some("Email address"));
        assert!(fields[0].visible);
        assert_eq!(fields[1].options[1].value, "de");
        assert!(!fields[1].visible);
    }

    #[test]
    fn test_deserialize_scan_envelope() {
        let raw = json!({
            "document": "lq2x9k3abc",
            "fields": [{"key": "ff-lq2x9k3abc-1", "tag": "textarea"}]
        });

        let scan: ScanResult = serde_json::from_value(raw).unwrap();
        assert_eq!(scan.document, "lq2x9k3abc");
        assert_eq!(scan.fields[0].key, "ff-lq2x9k3abc-1");

        let empty: ScanResult = serde_json::from_value(json!({"document": "d"})).unwrap();
        assert!(empty.fields.is_empty());
    }

    #[test]
    fn test_scan_keys_carry_document_id() {
        assert!(SCAN_SCRIPT.contains("'ff-' + doc + '-' + window.__formfillCounter"));
        assert!(SCAN_SCRIPT.contains("return { document: doc, fields: fields };"));
    }

    #[test]
    fn test_descriptor_drops_blank_attributes() {
        let field = ScannedField {
            key: "ff-3".to_string(),
            tag: "input".to_string(),
            field_type: Some("text".to_string()),
            name: Some("fname".to_string()),
            id: Some("  ".to_string()),
            label: Some(" First name ".to_string()),
            ..Default::default()
        };

        let descriptor = field.descriptor();
        assert_eq!(descriptor.name.as_deref(), Some("fname"));
        assert_eq!(descriptor.id, None);
        assert_eq!(descriptor.label.as_deref(), Some("First name"));
        assert_eq!(descriptor.type_str(), "text");
    }

    #[test]
    fn test_descriptor_uses_tag_for_non_inputs() {
        let field = ScannedField {
            key: "ff-4".to_string(),
            tag: "textarea".to_string(),
            name: Some("bio".to_string()),
            ..Default::default()
        };
        assert_eq!(field.descriptor().type_str(), "textarea");
    }

    #[test]
    fn test_action_script_escapes_values() {
        let script = action_script("ff-1", &FillAction::Type("it's \"quoted\"\n".to_string())).unwrap();
        assert!(script.contains(r#"const value = "it's \"quoted\"\n";"#));
        assert!(script.contains(r#"const key = "ff-1";"#));
        assert!(script.contains("dispatchEvent(new Event('change'"));
    }

    #[test]
    fn test_action_script_for_radio_uses_index() {
        let script = action_script("ff-9", &FillAction::PickRadio { index: 2 }).unwrap();
        assert!(script.contains("group[2]"));
        assert!(script.contains("r.name === el.name"));
    }

    #[test]
    fn test_no_script_for_untouched_controls() {
        assert!(action_script("ff-1", &FillAction::KeepRadio).is_none());
        assert!(action_script("ff-1", &FillAction::LeaveUnchecked).is_none());
        assert!(action_script("ff-1", &FillAction::Skip).is_none());
    }
}
