use crate::form::FieldCategory;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key under which nested custom fields may be supplied
const CUSTOM_FIELDS_KEY: &str = "custom_fields";

/// Personal data used to fill forms for one user
///
/// Every [`FieldCategory`] has a matching known field. Any other key a client
/// sends ends up in `custom_fields`; a known key is never stored there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_zip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_country: Option<String>,

    #[serde(default)]
    pub custom_fields: Map<String, Value>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    /// Build a profile from an arbitrary JSON object
    pub fn from_map(user_id: impl Into<String>, data: &Map<String, Value>) -> Self {
        let mut profile = Self::new(user_id);
        profile.update(data);
        profile
    }

    /// Build a profile from a JSON value, which must be an object
    pub fn from_value(user_id: impl Into<String>, data: &Value) -> Result<Self> {
        let map = data
            .as_object()
            .ok_or_else(|| Error::InvalidProfile("profile data must be a JSON object".to_string()))?;
        Ok(Self::from_map(user_id, map))
    }

    /// Merge new values into the profile
    ///
    /// Known keys overwrite the matching field (`null` clears it). A nested
    /// `custom_fields` object is merged first, so top-level keys win. Other
    /// keys with non-null values are stored as custom fields.
    ///
    /// Nesting is unwrapped at every depth: an object under `custom_fields`
    /// inside `custom_fields` is merged the same way, so a stored profile
    /// never holds a custom field named `custom_fields` and `to_map` output
    /// saves back unchanged.
    pub fn update(&mut self, data: &Map<String, Value>) {
        if let Some(Value::Object(nested)) = data.get(CUSTOM_FIELDS_KEY) {
            self.update(nested);
        }

        for (key, value) in data {
            if key == CUSTOM_FIELDS_KEY && value.is_object() {
                continue;
            }
            self.set_field(key, value);
        }
    }

    fn set_field(&mut self, key: &str, value: &Value) {
        // Only exact keys count as known; "Email" stays a custom field.
        if let Some(category) = FieldCategory::ALL.into_iter().find(|c| c.as_str() == key) {
            *self.slot_mut(category) = scalar_to_string(value);
            return;
        }
        if value.is_null() {
            return;
        }
        self.custom_fields.insert(key.to_string(), value.clone());
    }

    /// Flattened dictionary: set known fields followed by custom fields
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for category in FieldCategory::ALL {
            if let Some(value) = self.get(category) {
                map.insert(category.as_str().to_string(), Value::String(value.to_string()));
            }
        }
        for (key, value) in &self.custom_fields {
            map.insert(key.clone(), value.clone());
        }
        map
    }

    pub fn get(&self, category: FieldCategory) -> Option<&str> {
        match category {
            FieldCategory::FirstName => self.first_name.as_deref(),
            FieldCategory::LastName => self.last_name.as_deref(),
            FieldCategory::FullName => self.full_name.as_deref(),
            FieldCategory::Email => self.email.as_deref(),
            FieldCategory::Phone => self.phone.as_deref(),
            FieldCategory::AddressStreet => self.address_street.as_deref(),
            FieldCategory::AddressCity => self.address_city.as_deref(),
            FieldCategory::AddressState => self.address_state.as_deref(),
            FieldCategory::AddressZip => self.address_zip.as_deref(),
            FieldCategory::AddressCountry => self.address_country.as_deref(),
        }
    }

    fn slot_mut(&mut self, category: FieldCategory) -> &mut Option<String> {
        match category {
            FieldCategory::FirstName => &mut self.first_name,
            FieldCategory::LastName => &mut self.last_name,
            FieldCategory::FullName => &mut self.full_name,
            FieldCategory::Email => &mut self.email,
            FieldCategory::Phone => &mut self.phone,
            FieldCategory::AddressStreet => &mut self.address_street,
            FieldCategory::AddressCity => &mut self.address_city,
            FieldCategory::AddressState => &mut self.address_state,
            FieldCategory::AddressZip => &mut self.address_zip,
            FieldCategory::AddressCountry => &mut self.address_country,
        }
    }

    /// Value to type into a field of the given category
    ///
    /// `full_name` is derived from first and last name when not set directly.
    pub fn value_for(&self, category: FieldCategory) -> Option<String> {
        if let Some(value) = self.get(category) {
            return Some(value.to_string());
        }

        if category == FieldCategory::FullName {
            let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
                .into_iter()
                .flatten()
                .filter(|p| !p.is_empty())
                .collect();
            if !parts.is_empty() {
                return Some(parts.join(" "));
            }
        }

        None
    }

    /// Custom field value as text, for labels the model produced
    pub fn custom_value(&self, key: &str) -> Option<String> {
        self.custom_fields.get(key).and_then(scalar_to_string)
    }

    pub fn is_empty(&self) -> bool {
        self.to_map().is_empty()
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
