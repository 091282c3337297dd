mod category;
mod types;

pub use category::FieldCategory;
pub use types::{
    FieldDescriptor, FieldMapping, FormDescriptor, InterpretationResult, MappingEntry,
    MappingMethod, StoredMapping,
};
