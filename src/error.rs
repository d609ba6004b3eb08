//! Error types for the BookBridge application.
//!
//! Uses `thiserror` for structured error definitions that provide
//! clear context about what went wrong.

use thiserror::Error;

/// Main error type for EPUB analysis operations.
///
/// All analysis errors are terminal for that call: a corrupt archive
/// will not become valid on retry, so there are no internal retries.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The archive could not be opened or extracted (corrupt zip,
    /// unsupported compression, not a zip at all).
    #[error("Invalid EPUB archive: {0}")]
    InvalidArchive(String),

    /// The archive extracted fine but lacks the expected EPUB structure
    /// (missing META-INF/container.xml or its rootfile pointer).
    #[error("Malformed EPUB container: {0}")]
    MalformedContainer(String),

    /// The source file could not be read due to permissions.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Other filesystem failure (scratch directory creation, file reads).
    #[error("I/O error during analysis: {0}")]
    Io(#[from] std::io::Error),
}

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Error type for translation job submission.
#[derive(Error, Debug)]
pub enum SubmissionError {
    /// HTTP request to the translation server failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Server returned a non-200 response
    #[error("Server error: {0}")]
    ServerError(String),

    /// URL construction or validation failed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to read the archive or write the translated result
    #[error("I/O error during submission: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using anyhow for application-level error handling.
pub type Result<T> = anyhow::Result<T>;
