use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Profile field a form control can be mapped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    FirstName,
    LastName,
    FullName,
    Email,
    Phone,
    AddressStreet,
    AddressCity,
    AddressState,
    AddressZip,
    AddressCountry,
}

impl FieldCategory {
    pub const ALL: [FieldCategory; 10] = [
        FieldCategory::FirstName,
        FieldCategory::LastName,
        FieldCategory::FullName,
        FieldCategory::Email,
        FieldCategory::Phone,
        FieldCategory::AddressStreet,
        FieldCategory::AddressCity,
        FieldCategory::AddressState,
        FieldCategory::AddressZip,
        FieldCategory::AddressCountry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldCategory::FirstName => "first_name",
            FieldCategory::LastName => "last_name",
            FieldCategory::FullName => "full_name",
            FieldCategory::Email => "email",
            FieldCategory::Phone => "phone",
            FieldCategory::AddressStreet => "address_street",
            FieldCategory::AddressCity => "address_city",
            FieldCategory::AddressState => "address_state",
            FieldCategory::AddressZip => "address_zip",
            FieldCategory::AddressCountry => "address_country",
        }
    }

    /// Short human description, used when explaining categories to a model
    pub fn description(&self) -> &'static str {
        match self {
            FieldCategory::FirstName => "given name / first name of a person",
            FieldCategory::LastName => "family name / surname of a person",
            FieldCategory::FullName => "complete name of a person in one field",
            FieldCategory::Email => "electronic mail address",
            FieldCategory::Phone => "telephone, mobile or cell phone number",
            FieldCategory::AddressStreet => "street address line, house number and street",
            FieldCategory::AddressCity => "city, town or locality",
            FieldCategory::AddressState => "state, province, region or county",
            FieldCategory::AddressZip => "zip code, postal code or postcode",
            FieldCategory::AddressCountry => "country or nation",
        }
    }
}

impl fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        FieldCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| Error::UnknownCategory(s.to_string()))
    }
}
