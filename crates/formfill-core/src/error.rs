use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Form data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid form: {0}")]
    InvalidForm(String),

    #[error("Unknown field category: {0}")]
    UnknownCategory(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),
}

pub type Result<T> = std::result::Result<T, Error>;
