//! Options and the built-in interceptor library.
//!
//! This module contains:
//! - [`CallOption`] / [`ClientOption`]: typed option wrappers
//! - Built-in interceptors: headers, bodies, JSON, status codes, URL prefix
//! - Deadline options: [`with_timeout`], [`with_deadline`]

mod interceptor;
mod options;

pub use interceptor::{
    BodyInterceptor, HeaderInterceptor, JsonBodyInterceptor, JsonResponseInterceptor,
    StatusCodeInterceptor, StreamBodyInterceptor, UrlPrefixInterceptor, expected_status_code,
    for_json, try_with_request_header, with_body, with_body_stream, with_deadline, with_interceptor,
    with_json, with_request_header, with_request_interceptor, with_request_interceptor_fn,
    with_response_interceptor, with_response_interceptor_fn, with_timeout, with_url_prefix,
};
pub use options::{
    CallOption, Classification, ClientOption, TransportOption, configure_transport, with_transport,
};
