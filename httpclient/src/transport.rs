//! HTTP transport layer.
//!
//! The client treats the transport as an opaque capability: it accepts a
//! fully intercepted [`Request`] and yields a [`Response`] or an error.
//! Connection pooling, TLS and protocol negotiation live behind the
//! [`Transport`] trait.
//!
//! [`HyperTransport`] is the default implementation, built on hyper_util's
//! legacy client. It supports:
//!
//! - HTTP/1.1 and HTTP/2 with automatic protocol negotiation
//! - TLS with rustls (feature-gated)
//! - Connection pooling
//!
//! # Feature Flags
//!
//! - `tls` (default) - Enables `tls-ring` + `tls-native-roots` for convenience
//! - `tls-ring` / `tls-aws-lc` - Crypto providers
//! - `tls-native-roots` / `tls-webpki-roots` - Root certificates
//!
//! # Example
//!
//! ```ignore
//! use httpclient::{Client, configure_transport};
//! use std::time::Duration;
//!
//! let client = Client::new([
//!     configure_transport(|t| t.pool_idle_timeout(Duration::from_secs(30))),
//! ])?;
//! ```

mod body;
mod connector;
mod hyper;

pub use body::{RequestBody, ResponseBody};
pub use connector::{build_https_connector, default_tls_config, has_tls_support};
pub use hyper::{HyperTransport, HyperTransportBuilder};

// Re-export rustls types that users might need for TLS configuration
pub use rustls::ClientConfig as TlsClientConfig;

use crate::interceptor::BoxFuture;
use crate::{Error, Request, Response};

/// Sends a fully intercepted request and returns the raw response.
///
/// A transport must not retry, follow redirects on behalf of the pipeline, or
/// run interceptors; it only performs the exchange. Failures are reported as
/// [`Error::Transport`].
pub trait Transport: Send + Sync + 'static {
    /// Send `request` and return the response.
    fn send(&self, request: Request) -> BoxFuture<'_, Result<Response, Error>>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, request: Request) -> BoxFuture<'_, Result<Response, Error>> {
        (**self).send(request)
    }
}
