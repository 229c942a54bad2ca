//! Error types for the Frankfurter dashboard library.

/// All errors that can occur when fetching or decoding exchange rates.
#[derive(Debug, thiserror::Error)]
pub enum FxError {
    /// The HTTP request could not be sent or its body could not be read.
    #[cfg(any(feature = "async", feature = "blocking"))]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The rate service answered with a non-success status code.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, or a placeholder if it could not be read.
        message: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, FxError>;
