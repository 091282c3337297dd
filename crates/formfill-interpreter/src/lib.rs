pub mod assist;
pub mod error;
pub mod interpreter;
pub mod rules;

pub use assist::{
    AssistConfig, AssistedInterpreter, ContextDocument, ContextIndex, OpenAiBackend, QueryBackend,
};
pub use error::{Error, Result};
pub use interpreter::{FieldInterpreter, FormInterpreter};
pub use rules::{FieldRule, RULES};
