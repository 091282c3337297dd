pub mod error;
pub mod form;
pub mod profile;

pub use error::{Error, Result};
pub use form::{
    FieldCategory, FieldDescriptor, FieldMapping, FormDescriptor, InterpretationResult,
    MappingEntry, MappingMethod, StoredMapping,
};
pub use profile::UserProfile;
