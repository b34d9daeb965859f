//! Error types shared across EPR crates

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, EprError>;

/// Main error type for shared EPR functionality
#[derive(Error, Debug)]
pub enum EprError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown {kind} value: {value}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EprError {
    /// Create an unknown-variant error for a wire enum
    pub fn unknown_variant(kind: &'static str, value: impl ToString) -> Self {
        Self::UnknownVariant {
            kind,
            value: value.to_string(),
        }
    }
}
