//! Client builder.
//!
//! Provides a fluent API for configuring and building a [`Client`].

use std::sync::Arc;
use std::time::Duration;

use crate::client::Client;
use crate::config::{ClientOption, TransportOption};
use crate::interceptor::{RequestInterceptor, ResponseInterceptor};
use crate::transport::{HyperTransportBuilder, Transport};

/// Builder for creating a [`Client`].
///
/// Options are classified in the order they are added: transport options
/// adjust or replace the transport, interceptor options are appended to the
/// request and/or response sequences. A dual-role option is appended to both.
///
/// # Example
///
/// ```ignore
/// use httpclient::{Client, expected_status_code, with_url_prefix};
/// use std::time::Duration;
///
/// let client = Client::builder()
///     .option(with_url_prefix("https://api.example.com"))
///     .option(expected_status_code([200]))
///     .timeout(Duration::from_secs(10))
///     .build()?;
/// ```
#[derive(Default)]
pub struct ClientBuilder {
    options: Vec<ClientOption>,
    /// Deadline bound to every call, measured from call start.
    timeout: Option<Duration>,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("options", &self.options)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientBuilder {
    /// Create a new builder with no options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one client option.
    pub fn option(mut self, option: impl Into<ClientOption>) -> Self {
        self.options.push(option.into());
        self
    }

    /// Add several client options, in order.
    pub fn options<I>(mut self, options: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ClientOption>,
    {
        self.options.extend(options.into_iter().map(Into::into));
        self
    }

    /// Bind a deadline to every call, measured from the start of the call.
    ///
    /// Call-level [`with_timeout`](crate::with_timeout) and
    /// [`with_deadline`](crate::with_deadline) can only tighten it.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the default transport cannot be built.
    ///
    /// # Panics
    ///
    /// Panics if an option is not usable at client level, such as a
    /// call-only option like [`for_json`](crate::for_json).
    pub fn build(self) -> Result<Client, ClientBuildError> {
        let mut transport_builder = HyperTransportBuilder::new();
        let mut transport: Option<Arc<dyn Transport>> = None;
        let mut request_interceptors: Vec<Arc<dyn RequestInterceptor>> = Vec::new();
        let mut response_interceptors: Vec<Arc<dyn ResponseInterceptor>> = Vec::new();

        for option in self.options {
            if option.classify().is_unrecognized() {
                panic!("unexpected option: {:?}", option);
            }

            match option {
                ClientOption::Transport(TransportOption::Configure(configure)) => {
                    transport_builder = configure(transport_builder);
                }
                ClientOption::Transport(TransportOption::Replace(replacement)) => {
                    transport = Some(replacement);
                }
                ClientOption::Interceptor(option) => {
                    if let Some(request) = option.request {
                        request_interceptors.push(request);
                    }
                    if let Some(response) = option.response {
                        response_interceptors.push(response);
                    }
                }
            }
        }

        let transport = match transport {
            Some(transport) => transport,
            None => Arc::new(transport_builder.build()?) as Arc<dyn Transport>,
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            request_interceptors = request_interceptors.len(),
            response_interceptors = response_interceptors.len(),
            "built http client"
        );

        Ok(Client::from_parts(
            transport,
            request_interceptors.into(),
            response_interceptors.into(),
            self.timeout,
        ))
    }
}

/// Error type for client building failures.
#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    /// TLS configuration error.
    #[error("TLS configuration error: {0}")]
    Tls(String),
}
