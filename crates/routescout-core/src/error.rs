//! Error types and handling for routescout-core operations.
//!
//! Errors are categorized for easier handling and include context about
//! recoverability for the retry layer: a [`Error::Network`] timeout and a
//! populated remote error envelope ([`Error::Api`]) are both eligible for
//! retry, while configuration or parse failures are permanent.
//!
//! ```rust
//! use routescout_core::Error;
//!
//! let err = Error::Api("internal server error".to_string());
//! assert!(err.is_recoverable());
//! assert_eq!(err.category(), "api");
//! ```

use thiserror::Error;

/// The main error type for routescout-core operations.
///
/// All public functions in routescout-core return `Result<T, Error>` for
/// consistent error handling. Errors maintain the full source chain through
/// `source()` where an underlying error exists.
#[derive(Error, Debug)]
pub enum Error {
    /// Network operation failed.
    ///
    /// Covers the HTTP request to the content source: connection failures,
    /// timeouts, and non-2xx statuses surfaced through
    /// `Response::error_for_status`. Connection and timeout errors are
    /// recoverable; malformed URL errors are permanent.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The content source answered 2xx but carried an error envelope.
    ///
    /// The remote API reports application-level failures as a populated
    /// `errors` array alongside (or instead of) `data`. The engine treats
    /// these exactly like transport failures: the attempt failed and may be
    /// retried against the attempt budget.
    #[error("API error: {0}")]
    Api(String),

    /// Response body could not be interpreted.
    ///
    /// The envelope deserialized, but the requested collection payload was
    /// structurally unusable (e.g. `data` present without the collection
    /// key, or nodes of the wrong shape).
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration is invalid.
    ///
    /// Occurs when the discovery configuration is malformed: empty
    /// collection names, a page size of zero, prefixes that do not start
    /// with `/`, or TOML that fails to deserialize.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A synthesized route would not be a well-formed absolute path.
    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error for uncategorized failures.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable through retry logic.
    ///
    /// Returns `true` for failures that are typically temporary: connection
    /// errors, timeouts, non-2xx statuses, and remote error envelopes. The
    /// retry layer consults this before consuming budget on another attempt.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect() || e.is_status(),
            Self::Api(_) => true,
            _ => false,
        }
    }

    /// Get the error category as a string identifier.
    ///
    /// Useful for grouping failures in logs and in the per-type discovery
    /// summary.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Api(_) => "api",
            Self::Parse(_) => "parse",
            Self::Config(_) => "config",
            Self::InvalidRoute(_) => "invalid_route",
            Self::Serialization(_) => "serialization",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
