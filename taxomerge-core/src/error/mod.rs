//! Core error types for taxomerge

pub mod structure;

use thiserror::Error;
pub use structure::StructureError;

/// Main error type for taxomerge operations
#[derive(Error, Debug)]
pub enum TaxomergeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A refused structural edit; the tree was left unchanged
    #[error("Structural violation: {0}")]
    Structure(#[from] StructureError),

    #[error("Other error: {0}")]
    Other(String),
}

impl TaxomergeError {
    /// Whether this error signals a programming error rather than bad data
    pub fn is_structural(&self) -> bool {
        matches!(self, TaxomergeError::Structure(_))
    }
}

/// Result type alias for taxomerge operations
pub type TaxomergeResult<T> = Result<T, TaxomergeError>;

// Conversion implementations for common error types
impl From<serde_json::Error> for TaxomergeError {
    fn from(err: serde_json::Error) -> Self {
        TaxomergeError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for TaxomergeError {
    fn from(err: toml::de::Error) -> Self {
        TaxomergeError::Configuration(format!("Failed to parse config: {}", err))
    }
}

impl From<toml::ser::Error> for TaxomergeError {
    fn from(err: toml::ser::Error) -> Self {
        TaxomergeError::Configuration(format!("Failed to serialize config: {}", err))
    }
}

impl From<anyhow::Error> for TaxomergeError {
    fn from(err: anyhow::Error) -> Self {
        TaxomergeError::Other(err.to_string())
    }
}
