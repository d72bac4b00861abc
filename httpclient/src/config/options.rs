//! Client-level and call-level options.
//!
//! Every option is a typed wrapper that tags an interceptor (or a transport
//! configuration function) with the contexts that accept it:
//!
//! - [`CallOption`] carries an optional request capability and an optional
//!   response capability. It is accepted by every call method and, unless it
//!   is call-only, can be turned into a [`ClientOption`].
//! - [`ClientOption`] is accepted by [`Client::new`](crate::Client::new) and
//!   [`ClientBuilder::option`](crate::ClientBuilder::option). It is either a
//!   transport option or an interceptor option.
//!
//! Client construction classifies each option with [`ClientOption::classify`]
//! and files it into the transport configuration, the request-interceptor
//! sequence and/or the response-interceptor sequence.

use std::sync::Arc;

use crate::interceptor::{RequestInterceptor, ResponseInterceptor};
use crate::transport::{HyperTransport, HyperTransportBuilder, Transport};

/// An option accepted by the call methods of [`Client`](crate::Client).
///
/// An option may carry a request capability, a response capability, or both
/// (a dual-role option). The lifetime lets call-level options borrow state
/// from the caller, such as the decode target of [`for_json`](crate::for_json).
#[derive(Clone)]
pub struct CallOption<'a> {
    pub(crate) request: Option<Arc<dyn RequestInterceptor + 'a>>,
    pub(crate) response: Option<Arc<dyn ResponseInterceptor + 'a>>,
    pub(crate) call_only: bool,
}

impl<'a> CallOption<'a> {
    /// An option carrying only a request capability.
    pub fn request(interceptor: impl RequestInterceptor + 'a) -> Self {
        Self {
            request: Some(Arc::new(interceptor)),
            response: None,
            call_only: false,
        }
    }

    /// An option carrying only a response capability.
    pub fn response(interceptor: impl ResponseInterceptor + 'a) -> Self {
        Self {
            request: None,
            response: Some(Arc::new(interceptor)),
            call_only: false,
        }
    }

    /// An option carrying both capabilities, backed by one shared value.
    pub fn dual<I>(interceptor: I) -> Self
    where
        I: RequestInterceptor + ResponseInterceptor + 'a,
    {
        let interceptor = Arc::new(interceptor);
        Self {
            request: Some(interceptor.clone()),
            response: Some(interceptor),
            call_only: false,
        }
    }

    /// Restrict this option to call-level use.
    ///
    /// Passing a call-only option to client construction is a programming
    /// error and panics.
    pub fn call_only(mut self) -> Self {
        self.call_only = true;
        self
    }

    /// Returns true if this option is restricted to call-level use.
    pub fn is_call_only(&self) -> bool {
        self.call_only
    }

    /// The request capability, if any.
    pub fn request_interceptor(&self) -> Option<&(dyn RequestInterceptor + 'a)> {
        self.request.as_deref()
    }

    /// The response capability, if any.
    pub fn response_interceptor(&self) -> Option<&(dyn ResponseInterceptor + 'a)> {
        self.response.as_deref()
    }
}

impl std::fmt::Debug for CallOption<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallOption")
            .field("request", &self.request.is_some())
            .field("response", &self.response.is_some())
            .field("call_only", &self.call_only)
            .finish()
    }
}

/// Configures the transport used by a client.
pub enum TransportOption {
    /// Adjust the default [`HyperTransport`](crate::HyperTransport) builder.
    Configure(Box<dyn FnOnce(HyperTransportBuilder) -> HyperTransportBuilder + Send>),
    /// Replace the transport entirely.
    Replace(Arc<dyn Transport>),
}

impl std::fmt::Debug for TransportOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportOption::Configure(_) => write!(f, "TransportOption::Configure"),
            TransportOption::Replace(_) => write!(f, "TransportOption::Replace"),
        }
    }
}

/// An option accepted at client construction.
#[derive(Debug)]
pub enum ClientOption {
    /// Applied to the transport configuration.
    Transport(TransportOption),
    /// Appended to the client's interceptor sequences.
    Interceptor(CallOption<'static>),
}

/// Which registration buckets an option falls into.
///
/// A dual-role option reports both `request` and `response`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    pub transport: bool,
    pub request: bool,
    pub response: bool,
}

impl Classification {
    /// Returns true if the option is usable in none of the buckets.
    pub fn is_unrecognized(&self) -> bool {
        !(self.transport || self.request || self.response)
    }
}

impl ClientOption {
    /// Classify this option for client construction.
    ///
    /// Call-only interceptor options, and interceptor options carrying no
    /// capability at all, classify as unrecognized.
    pub fn classify(&self) -> Classification {
        match self {
            ClientOption::Transport(_) => Classification {
                transport: true,
                ..Classification::default()
            },
            ClientOption::Interceptor(option) if option.call_only => Classification::default(),
            ClientOption::Interceptor(option) => Classification {
                transport: false,
                request: option.request.is_some(),
                response: option.response.is_some(),
            },
        }
    }
}

impl From<CallOption<'static>> for ClientOption {
    fn from(option: CallOption<'static>) -> Self {
        ClientOption::Interceptor(option)
    }
}

impl From<TransportOption> for ClientOption {
    fn from(option: TransportOption) -> Self {
        ClientOption::Transport(option)
    }
}

impl From<HyperTransport> for ClientOption {
    fn from(transport: HyperTransport) -> Self {
        with_transport(transport)
    }
}

/// Use `transport` instead of the default hyper transport.
pub fn with_transport(transport: impl Transport) -> ClientOption {
    ClientOption::Transport(TransportOption::Replace(Arc::new(transport)))
}

/// Adjust the default hyper transport's configuration.
///
/// Has no effect if the transport is replaced with [`with_transport`].
///
/// # Example
///
/// ```ignore
/// use httpclient::{Client, configure_transport};
///
/// let client = Client::new([configure_transport(|t| t.http2_only(true))])?;
/// ```
pub fn configure_transport<F>(configure: F) -> ClientOption
where
    F: FnOnce(HyperTransportBuilder) -> HyperTransportBuilder + Send + 'static,
{
    ClientOption::Transport(TransportOption::Configure(Box::new(configure)))
}
