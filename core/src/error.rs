//! Error taxonomy shared by the repository, the service and the transport.
//!
//! Every layer surfaces [`TodoError`] unchanged; nothing in the core retries.
//! The transport classifies errors with [`TodoError::kind`] and uses
//! [`TodoError::is_unexpected`] to log storage corruption and internal
//! failures apart from ordinary validation failures.

use crate::domain::MAX_TITLE_LEN;
use std::sync::Arc;
use thiserror::Error;

/// A shared error type for source chain tracking.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for todo operations.
pub type TodoResult<T> = Result<T, TodoError>;

/// Errors produced by todo operations.
///
/// # Non-exhaustive
///
/// New variants may be added without a breaking change; downstream matches
/// need a wildcard arm.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TodoError {
    /// The title is blank or too long after trimming.
    #[error("invalid title: must be non-blank and at most {} characters", MAX_TITLE_LEN)]
    InvalidTitle,

    /// An operation that needs an identifier was given an empty one.
    #[error("missing id")]
    MissingId,

    /// No record is stored under the identifier.
    #[error("todo not found: {id}")]
    NotFound {
        /// The identifier that was looked up.
        id: String,
    },

    /// A record is already stored under the identifier.
    #[error("todo already exists: {id}")]
    Conflict {
        /// The identifier that is already taken.
        id: String,
    },

    /// Stored bytes do not deserialize into a `Todo`.
    #[error("failed to decode record {key}: {message}")]
    Decode {
        /// Key of the malformed record.
        key: String,
        /// Description of the decoding failure.
        message: String,
        /// The underlying decoder error.
        #[source]
        source: Option<BoxError>,
    },

    /// The storage file lock could not be acquired within the configured wait.
    #[error("storage busy: {message}")]
    Busy {
        /// Description of the lock failure.
        message: String,
    },

    /// The caller's deadline passed.
    #[error("operation timed out")]
    Timeout,

    /// The caller's cancellation signal fired.
    #[error("operation cancelled")]
    Cancelled,

    /// Any other failure.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<BoxError>,
    },
}

/// Coarse error categories a transport maps onto its own status codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller supplied bad input.
    InvalidInput,
    /// The target record does not exist.
    NotFound,
    /// The target identifier is already used.
    Conflict,
    /// The store could not serve the call right now; retrying may help.
    Unavailable,
    /// Anything unexpected.
    Internal,
}

impl ErrorKind {
    /// Short label, used for metrics and log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
        }
    }
}

impl TodoError {
    /// Creates a `NotFound` error for the given identifier.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a `Conflict` error for the given identifier.
    #[must_use]
    pub fn conflict(id: impl Into<String>) -> Self {
        Self::Conflict { id: id.into() }
    }

    /// Creates a `Decode` error for the record at `key`.
    #[must_use]
    pub fn decode(
        key: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Decode {
            key: key.into(),
            message: source.to_string(),
            source: Some(Arc::new(source)),
        }
    }

    /// Creates a `Busy` error with the given message.
    #[must_use]
    pub fn busy(message: impl Into<String>) -> Self {
        Self::Busy {
            message: message.into(),
        }
    }

    /// Creates an `Internal` error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an `Internal` error with a message and source error.
    #[must_use]
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    /// Classifies the error for the transport.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTitle | Self::MissingId => ErrorKind::InvalidInput,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Busy { .. } | Self::Timeout | Self::Cancelled => ErrorKind::Unavailable,
            Self::Decode { .. } | Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Whether the error signals corruption or a bug rather than a bad request.
    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::Internal { .. })
    }
}
