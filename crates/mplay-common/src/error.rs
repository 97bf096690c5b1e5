//! Unified error type for mplay.
//!
//! All crates funnel their failures into [`Error`], which carries enough
//! context for the HTTP layer to derive a status code via
//! [`Error::http_status`].

use std::fmt;
use std::time::Duration;

/// Unified error type covering every failure mode of the streaming path.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "media", "object").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Configuration or request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backing store failed to serve a chunk.
    #[error("Fetch of chunk {chunk_index} failed: {message}")]
    Fetch {
        /// First chunk index of the failed request.
        chunk_index: u64,
        /// Human-readable error description.
        message: String,
    },

    /// The backing store returned fewer bytes than the chunk geometry requires.
    #[error("Short read at chunk {chunk_index}: expected {expected} bytes, got {actual}")]
    ShortRead {
        /// First chunk index of the short block.
        chunk_index: u64,
        /// Bytes the block had to contain.
        expected: u64,
        /// Bytes actually returned.
        actual: u64,
    },

    /// A chunk fetch did not complete in time.
    #[error("Fetch of chunk {chunk_index} timed out after {after:?}")]
    Timeout {
        /// First chunk index of the timed-out request.
        chunk_index: u64,
        /// The elapsed limit.
        after: Duration,
    },

    /// The backing store asked the caller to back off.
    #[error("Rate limited by backing store, retry after {retry_after:?}")]
    RateLimited {
        /// How long the store asked us to wait.
        retry_after: Duration,
    },

    /// The consumer went away; the stream was torn down.
    #[error("Stream cancelled")]
    Cancelled,

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Validation(_) => 400,
            Error::Fetch { .. } => 502,
            Error::ShortRead { .. } => 502,
            Error::Timeout { .. } => 504,
            Error::RateLimited { .. } => 503,
            // nginx "client closed request"; only ever logged, never sent.
            Error::Cancelled => 499,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable code for API bodies and log fields.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::Validation(_) => "validation_error",
            Error::Fetch { .. } => "fetch_failed",
            Error::ShortRead { .. } => "short_read",
            Error::Timeout { .. } => "fetch_timeout",
            Error::RateLimited { .. } => "rate_limited",
            Error::Cancelled => "cancelled",
            Error::Io { .. } => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Whether a backing-store client may reasonably try the same call again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Fetch { .. } | Error::Timeout { .. } | Error::RateLimited { .. }
        )
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Fetch`].
    pub fn fetch(chunk_index: u64, message: impl fmt::Display) -> Self {
        Error::Fetch {
            chunk_index,
            message: message.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
