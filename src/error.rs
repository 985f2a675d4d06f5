//! Error types for lwn2email
//!
//! One library-wide error enum covers the whole pipeline. Every variant
//! except [`Error::UpToDate`] is fatal: the run aborts before anything is
//! marked as delivered, so the next scheduled invocation retries the same
//! edition.

use thiserror::Error;

/// Result type alias for lwn2email operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for lwn2email
#[derive(Debug, Error)]
pub enum Error {
    /// Every matching feed entry has already been delivered.
    ///
    /// This is the expected outcome of most runs, not a failure. Callers
    /// must treat it as a clean "nothing new" termination.
    #[error("every weekly edition in the feed has already been delivered")]
    UpToDate,

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "address")
        key: Option<String>,
    },

    /// Feed could not be fetched or parsed
    #[error("feed error: {0}")]
    Feed(String),

    /// Site login was rejected
    #[error("login failure: {0}")]
    Login(String),

    /// Edition page could not be retrieved
    #[error("page fetch problem: {0}")]
    Fetch(String),

    /// Fetched page does not have the expected structure
    #[error("unexpected page layout: {0}")]
    Layout(String),

    /// Mail submission failed
    #[error("delivery error: {0}")]
    Delivery(String),

    /// I/O error (mark reads/writes, directory creation)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error below the HTTP status level
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}
