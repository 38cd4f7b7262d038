//! Error types shared by the codec registry, profile registry and derivation engine.

use thiserror::Error;

use super::codec::MediaKind;

/// Failures surfaced while looking up, saving or deriving options for a profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("'{0}' not found")]
    NotFound(String),

    #[error("codec '{0}' is unavailable")]
    DisabledCodec(String),

    #[error("codec '{codec}' is {actual}, profile '{profile}' needs {expected}")]
    KindMismatch {
        profile: String,
        codec: String,
        expected: MediaKind,
        actual: MediaKind,
    },

    #[error("option '{key}' rejected: {cause}")]
    Derivation { key: String, cause: LibraryError },

    #[error("profile '{profile}' failed validation: {}", join_fields(.errors))]
    Validation {
        profile: String,
        errors: Vec<FieldError>,
    },

    #[error("profile store: {0}")]
    Store(#[from] std::io::Error),

    #[error("profile record: {0}")]
    Record(#[from] serde_json::Error),
}

/// Fatal registration pass failures.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("codec '{0}' registered twice")]
    RegistrationConflict(String),
}

/// Errors reported by the external codec library when an option is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LibraryError {
    #[error("unknown option for {codec}")]
    UnknownOption { codec: String },

    #[error("invalid value '{value}'")]
    InvalidValue { value: String },

    #[error("library error code {0}")]
    Code(i32),
}

/// Hardware probing failures. These degrade a codec to disabled.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("no render device")]
    NoDevice,

    #[error("{tool} failed: {status}")]
    ToolFailed { tool: String, status: String },
}

/// One field-level problem found while validating a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}
