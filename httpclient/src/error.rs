//! Error types for the interception pipeline.
//!
//! This module provides [`Error`], the error type returned by every call made
//! through a [`Client`](crate::Client) and by every interceptor.

use http::StatusCode;

/// Boxed error type used to carry caller-defined interceptor failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced while building, intercepting or sending a request.
///
/// The first error encountered during a call is returned unchanged; the
/// pipeline never aggregates or retries.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request could not be constructed (malformed method or URL).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A URL produced by an interceptor could not be parsed.
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A header name or value was rejected.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The response status is not one of the expected codes.
    #[error("unexpected status code: {}", .0.as_u16())]
    UnexpectedStatus(StatusCode),

    /// The response does not carry the content type an interceptor requires.
    #[error("expected JSON response but got {0:?}")]
    UnexpectedContentType(String),

    /// A request payload could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),

    /// A response payload could not be deserialized.
    #[error("decode error: {0}")]
    Decode(String),

    /// Reading a request or response body failed.
    #[error("body error: {0}")]
    Body(String),

    /// Transport-level error (connection failed, protocol error, etc.).
    #[error("transport error: {0}")]
    Transport(String),

    /// The deadline bound to the request expired before the transport answered.
    #[error("deadline exceeded")]
    Timeout,

    /// An error raised by a caller-defined interceptor, passed through verbatim.
    #[error(transparent)]
    Interceptor(BoxError),
}

impl Error {
    /// Wrap a caller-defined error so it can be returned from an interceptor.
    pub fn interceptor<E: Into<BoxError>>(err: E) -> Self {
        Error::Interceptor(err.into())
    }

    /// The offending status code, for [`Error::UnexpectedStatus`].
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::UnexpectedStatus(status) => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the request deadline expired.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout)
    }

    /// Returns true if the transport failed or timed out.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout)
    }

    /// Downcast the error wrapped by [`Error::Interceptor`].
    ///
    /// # Example
    ///
    /// ```
    /// use httpclient::Error;
    ///
    /// #[derive(Debug, thiserror::Error)]
    /// #[error("not found")]
    /// struct NotFound;
    ///
    /// let err = Error::interceptor(NotFound);
    /// assert!(err.downcast_ref::<NotFound>().is_some());
    /// ```
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Error::Interceptor(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}
