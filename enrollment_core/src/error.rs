//! Error types for the registration roster.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    /// A draft field is missing or malformed. Nothing was changed.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate serial number: {0}")]
    DuplicateSerial(String),

    #[error("Record not found: {0}")]
    RecordNotFound(u64),

    #[error("Invalid photo: {0}")]
    InvalidPhoto(String),

    /// A roster failed an invariant check after a transition or on reload.
    #[error("Invariant violation: {0}")]
    Invariant(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
