/*!
 * Error types for the gpt-po application.
 *
 * This module contains custom error types for the different layers of the
 * application, using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a translation backend
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The request did not complete within the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The backend asked us to slow down
    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Message from the backend
        message: String,
        /// Value of the `retry-after` header, if the backend sent one
        retry_after_secs: Option<u64>,
    },

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether the batch should be replayed after a delay
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimitExceeded { .. })
    }

    /// Whether the connection was aborted or timed out, in which case a proxy
    /// is often what the user is missing
    pub fn is_connection_abort(&self) -> bool {
        matches!(self, Self::ConnectionError(_) | Self::Timeout(_))
    }
}

/// Errors raised by the catalog codec and catalog file operations
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog text does not follow the PO grammar
    #[error("Malformed catalog at line {line}: {message}")]
    Format {
        /// 1-based line number of the offending input
        line: usize,
        /// What went wrong
        message: String,
    },

    /// The catalog declares or was given a charset we cannot decode
    #[error("Unsupported charset: {0}")]
    UnsupportedCharset(String),

    /// A `/pattern/flags` reference filter is not a valid regular expression
    #[error("Invalid reference pattern: {0}")]
    InvalidPattern(String),

    /// Reading or writing the catalog failed
    #[error("Catalog I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Missing or invalid configuration, aborts the run
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error while loading or checkpointing the catalog
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The backend response did not address one of the submitted entries
    #[error("No translation tag for entry {index}: {msgid:?}")]
    MissingTranslationTag {
        /// Sequential index the entry was submitted with
        index: usize,
        /// Source text of the entry
        msgid: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing required input such as the API key or a catalog path
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the catalog codec
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
