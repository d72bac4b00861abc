//! HTTP client built around an interceptor pipeline.
//!
//! Every call made through a [`Client`] runs through an ordered, composable
//! chain of interceptors that inspect, mutate or reject the outgoing request
//! and the incoming response:
//!
//! ```text
//! client request interceptors -> call request interceptors
//!     -> transport
//! call response interceptors -> client response interceptors
//! ```
//!
//! The first error aborts the call and is returned unchanged. Interceptors
//! are registered through typed options: [`ClientOption`]s at construction
//! and [`CallOption`]s per call. A dual-role option registers one value in
//! both the request and the response phase.
//!
//! ## Features
//!
//! - Request and response interceptors, closure adapters, dual-role options
//! - Built-ins: headers, raw and JSON bodies, expected status codes, JSON
//!   response decoding, URL prefixes, deadlines
//! - Pluggable [`Transport`], defaulting to a pooled hyper client with rustls
//!
//! ## Example
//!
//! ```ignore
//! use httpclient::{Client, expected_status_code, for_json, with_json, with_url_prefix};
//!
//! #[derive(serde::Deserialize, Default)]
//! struct Echo {
//!     data: String,
//! }
//!
//! let client = Client::new([
//!     with_url_prefix("https://httpbin.org"),
//!     expected_status_code([200]),
//! ])?;
//!
//! let mut echo = Echo::default();
//! client
//!     .post("/post", [with_json("hello"), for_json(&mut echo)])
//!     .await?;
//! assert_eq!(echo.data, "\"hello\"");
//! ```
//!
//! ## Custom Interceptors
//!
//! ```ignore
//! use httpclient::{BoxFuture, Error, Response, ResponseInterceptor, with_response_interceptor};
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("not found")]
//! struct NotFound;
//!
//! struct RejectNotFound;
//!
//! impl ResponseInterceptor for RejectNotFound {
//!     fn intercept_response<'a>(
//!         &'a self,
//!         res: Response,
//!     ) -> BoxFuture<'a, Result<Response, Error>> {
//!         Box::pin(async move {
//!             if res.status() == 404 {
//!                 return Err(Error::interceptor(NotFound));
//!             }
//!             Ok(res)
//!         })
//!     }
//! }
//!
//! let err = client
//!     .get("/status/404", [with_response_interceptor(RejectNotFound)])
//!     .await
//!     .unwrap_err();
//! assert!(err.downcast_ref::<NotFound>().is_some());
//! ```
//!
//! ## Feature Flags
//!
//! - `tls` (default): `tls-ring` + `tls-native-roots`
//! - `tls-ring` / `tls-aws-lc`: rustls crypto provider
//! - `tls-native-roots` / `tls-webpki-roots`: root certificates
//! - `tracing` (default): spans and debug events for each call

mod builder;
mod client;
pub mod config;
mod error;
pub mod interceptor;
pub mod request;
pub mod response;
pub mod transport;

pub use builder::{ClientBuildError, ClientBuilder};
pub use client::Client;
pub use error::{BoxError, Error};

// Re-export from config module
pub use config::{
    CallOption, ClientOption, TransportOption, configure_transport, expected_status_code, for_json,
    try_with_request_header, with_body, with_body_stream, with_deadline, with_interceptor,
    with_json, with_request_header, with_request_interceptor, with_request_interceptor_fn,
    with_response_interceptor, with_response_interceptor_fn, with_timeout, with_transport,
    with_url_prefix,
};

pub use interceptor::{
    BoxFuture, RequestInterceptor, RequestInterceptorFn, ResponseInterceptor, ResponseInterceptorFn,
};

pub use request::{Deadline, Request};
pub use response::{RequestInfo, Response, read_body};

// Re-export transport types at the top level for convenience
pub use transport::{
    HyperTransport, HyperTransportBuilder, RequestBody, ResponseBody, TlsClientConfig, Transport,
};

pub use bytes::Bytes;
