use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("File system error encountered when {0}: {1}")]
    FileSystemError(String, #[source] std::io::Error),
    #[error("Unable to read token stream from {0}: {1}")]
    TokenStreamError(String, #[source] serde_json::Error),
    #[error("Invalid token stream: {0}")]
    InvalidTokenStream(String),
}

#[derive(Error, Debug)]
pub enum PublicError {
    #[error("Variant not found: {0}")]
    VariantNotFound(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Setting {key} must be a non-negative integer, got {value}")]
    InvalidCount { key: String, value: String },
}
