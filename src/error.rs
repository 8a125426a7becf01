use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from config, fixture or terminal access.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Malformed directory fixture.
    #[error("Invalid directory fixture: {0}")]
    Fixture(String),

    /// A distinguished name that could not be parsed.
    #[error("Invalid DN: {0}")]
    InvalidDn(String),

    /// A background fetch against the directory source failed.
    #[error("Fetch failed: {0}")]
    Fetch(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Fixture(err.to_string())
    }
}
