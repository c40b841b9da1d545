//! Error types at the remote boundary.

use thiserror::Error;

/// Transport-level failure of an HTTP call.
///
/// Describes what went wrong on the wire. [`HttpControlPlane`] converts
/// these into [`RemoteError`] before they reach the caller.
///
/// [`HttpControlPlane`]: super::HttpControlPlane
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network connection failed (DNS, refused, reset, TLS).
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The server did not answer within the client timeout.
    #[error("Request timed out")]
    Timeout,

    /// The request URL could not be built or used.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Normalized failure reported by a [`ControlPlane`].
///
/// Raw status codes and transport errors never cross this boundary; every
/// implementation maps its failures onto these three kinds.
///
/// [`ControlPlane`]: super::ControlPlane
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Rate limiting, a busy or in-modification resource, or a timeout.
    /// Eligible for retry.
    #[error("Transient remote error: {0}")]
    Transient(String),

    /// The remote rejected the request (unknown setting, bad value).
    #[error("Remote rejected request: {0}")]
    Validation(String),

    /// The parameter set does not exist.
    #[error("Parameter set '{0}' not found")]
    NotFound(String),
}

impl RemoteError {
    /// Creates a transient error.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a not-found error for `resource`.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// Returns true for [`RemoteError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<HttpError> for RemoteError {
    fn from(error: HttpError) -> Self {
        match error {
            HttpError::Connection(_) | HttpError::Timeout => Self::Transient(error.to_string()),
            HttpError::InvalidUrl(_) => Self::Validation(error.to_string()),
        }
    }
}

/// Extension trait for checking if an error is retryable.
///
/// The apply coordinator consults this after every failed submission to
/// decide between backing off and aborting.
pub trait IsRetryable {
    /// Returns true if the error is potentially transient and should be retried.
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for RemoteError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
