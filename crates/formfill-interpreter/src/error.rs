use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Model backend error: {0}")]
    Backend(String),

    #[error("Model API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Backend(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
