//! Error types and Result aliases for manlook

use std::path::PathBuf;

/// Result type alias for manlook operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for manlook
///
/// Lookup failures that the user should simply read (unknown page, timeout)
/// are not errors; they come back from the fetcher as text. Only the
/// conditions below leave the library as `Err`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // === Lookup errors ===
    /// The OS could not start the external program
    #[error("Failed to start '{command}': {reason}")]
    ProcessCreationFailed { command: String, reason: String },

    /// Extraction produced nothing to look up
    #[error("Lookup term cannot be empty")]
    EmptyTerm,

    // === Presentation errors ===
    /// The host could not build an output surface
    #[error("Failed to create output surface: {reason}")]
    SurfaceCreationFailed { reason: String },

    // === Configuration errors ===
    /// Failed to load configuration file
    #[error("Failed to load config from '{}': {reason}", path.display())]
    ConfigLoadFailed { path: PathBuf, reason: String },

    /// Failed to save configuration file
    #[error("Failed to save config to '{}': {reason}", path.display())]
    ConfigSaveFailed { path: PathBuf, reason: String },

    /// Configuration file not found
    #[error("Configuration file not found")]
    ConfigNotFound,

    /// Configuration validation failed
    #[error("Configuration validation failed for '{field}': {reason}")]
    ConfigValidationFailed { field: String, reason: String },

    /// Failed to parse configuration
    #[error("Failed to parse {format} config: {reason}")]
    ConfigParseFailed { format: String, reason: String },

    /// Failed to serialize configuration
    #[error("Failed to serialize config as {format}: {reason}")]
    ConfigSerializationFailed { format: String, reason: String },

    // === Platform errors ===
    /// Failed to send signal to process
    #[error("Failed to send signal '{signal}': {reason}")]
    SignalSendFailed { signal: String, reason: String },

    // === I/O and serialization errors ===
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    // === Generic fallback (use sparingly) ===
    /// Generic errors (for cases not yet categorized)
    #[error("Error: {0}")]
    Other(String),
}

impl Error {
    /// Whether this error came from failing to start the external program
    pub fn is_process_creation(&self) -> bool {
        matches!(self, Error::ProcessCreationFailed { .. })
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
