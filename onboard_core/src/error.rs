//! Error types for onboardkit.

/// Main error type for core operations.
///
/// All core operations return `Result<T> = std::result::Result<T, CoreError>`.
///
/// `Provider` means the identity provider could not be reached or answered
/// with a non-success status. It is deliberately separate from any verdict:
/// a failed fetch is "could not determine status", never "status is FAILED".
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    /// Identity provider communication failed (auth, non-2xx, bad payload).
    #[error("Provider error: {0}")]
    Provider(String),

    /// Required configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Result with CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;
