//! Error types for the public interface of the library.
//!
//! Internally the crate uses `anyhow` (`Res<T>`) and attaches context as errors bubble up. At the
//! public boundary the error is tagged with an `ErrorType` via `IntoResult::pub_result`, so that
//! callers can tell a rejected input apart from a broken data directory.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// Result type used inside the crate.
pub type Res<T> = anyhow::Result<T>;

/// Result type returned from the public interface.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad categories of failure.
///
/// Store writes and notifications never fail a command; they are logged and the command carries
/// on. So the only errors that reach a caller are about setup or input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The configuration or the home directory is missing, invalid or cannot be created.
    Config,
    /// User input was rejected before anything was recorded.
    Validation,
}

serde_plain::derive_display_from_serialize!(ErrorType);

/// The public error type. It wraps an `anyhow::Error` along with the `ErrorType`.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    pub fn inner(&self) -> &anyhow::Error {
        &self.inner
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Error")
            .field("error_type", &self.error_type)
            .field("inner", &self.inner)
            .finish()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // The alternate form prints the whole context chain: "outer: inner: root cause"
        write!(f, "{:#}", self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Converts an internal result into a public `Result` tagged with an `ErrorType`.
pub trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}
