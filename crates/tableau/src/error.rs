//! Error types for Tableau REST operations.
//!
//! Errors are categorized so callers can tell "the object is gone" apart from
//! everything else. Lifecycle reads rely on that to drop vanished objects
//! from state instead of failing.

use std::fmt;
use std::io;

/// Result type alias for Tableau operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of Tableau errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The server rejected the request with a non-success status.
    Http,
    /// The request never produced a response.
    Network,
    /// The requested object does not exist.
    NotFound,
    /// The server answered with something we could not decode.
    Format,
    /// A composite identifier could not be parsed.
    InvalidId,
    /// Missing or invalid client configuration.
    Config,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Http => "Request rejected by Tableau",
            Self::Network => "Network connectivity issue",
            Self::NotFound => "Object not found",
            Self::Format => "Unexpected response format",
            Self::InvalidId => "Malformed identifier",
            Self::Config => "Invalid provider configuration",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Http => "Check the response body for the server's reason",
            Self::Network => "Check the server URL and your connection",
            Self::NotFound => "The object may have been deleted outside this provider",
            Self::Format => "Check that server_version matches the server's REST API version",
            Self::InvalidId => "Check the identifier format used for import",
            Self::Config => "Set the missing values via flags, environment or config file",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to Tableau.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Non-success status, with the raw response body.
    #[error("status: {status}, body: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// Transport-level failure (DNS, TLS, timeout, ...).
    #[error("request failed: {0}")]
    Network(String),

    /// A scan over a listing found no match.
    #[error("Did not find {entity} ID {id}")]
    NotFound {
        /// Entity kind, e.g. "group".
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Malformed JSON or unexpected response shape.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Pagination fields that are not usable numbers.
    #[error("invalid pagination: {0}")]
    Pagination(String),

    /// Composite identifier that does not parse.
    #[error("invalid ID '{id}': {reason}")]
    InvalidId {
        /// The identifier as given.
        id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Client misconfiguration.
    #[error("{0}")]
    Config(String),

    /// Resource input rejected before any request was sent.
    #[error("{0}")]
    Validation(String),

    /// Grantee or capability values that do not make sense.
    #[error(transparent)]
    Grant(#[from] grants::GrantError),

    /// IO error while reading content to publish.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create a not-found error.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an invalid-ID error.
    pub fn invalid_id(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidId {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Http { status: 404, .. } => ErrorCategory::NotFound,
            Error::Http { body, .. } if body_says_not_found(body) => ErrorCategory::NotFound,
            Error::Http { .. } => ErrorCategory::Http,
            Error::Network(_) => ErrorCategory::Network,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::InvalidResponse(_) | Error::Pagination(_) | Error::Grant(_) => ErrorCategory::Format,
            Error::InvalidId { .. } => ErrorCategory::InvalidId,
            Error::Config(_) | Error::Validation(_) => ErrorCategory::Config,
            Error::Io(_) => ErrorCategory::Other,
        }
    }

    /// Whether the object this request referred to no longer exists.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}

fn body_says_not_found(body: &str) -> bool {
    body.contains("not found") || body.contains("Did not find")
}

/// Whether an `anyhow` chain bottoms out in a Tableau not-found error.
pub fn is_not_found(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<Error>())
        .any(Error::is_not_found)
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Http {
                status: code,
                body: String::new(),
            },
            other => Self::Network(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
