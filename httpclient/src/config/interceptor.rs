//! Built-in interceptors.
//!
//! Every constructor here returns a [`CallOption`] wrapping an ordinary
//! [`RequestInterceptor`] and/or [`ResponseInterceptor`]; the client has no
//! special knowledge of any of them.
//!
//! # Example
//!
//! ```ignore
//! use httpclient::{Client, expected_status_code, for_json, with_request_header, with_url_prefix};
//!
//! let client = Client::builder()
//!     .option(with_url_prefix("https://httpbin.org"))
//!     .option(expected_status_code([200]))
//!     .build()?;
//!
//! let mut user_agent = UserAgent::default();
//! client
//!     .get("/user-agent", [
//!         with_request_header("user-agent", "httpclient/1.0"),
//!         for_json(&mut user_agent),
//!     ])
//!     .await?;
//! ```

use std::sync::Mutex;
use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use http::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderName, HeaderValue, StatusCode, Uri};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::Instant;

use super::options::CallOption;
use crate::interceptor::{
    BoxFuture, RequestInterceptor, RequestInterceptorFn, ResponseInterceptor, ResponseInterceptorFn,
};
use crate::request::{Deadline, RelativeUrl};
use crate::response::{content_type, read_body};
use crate::{Error, Request, RequestBody, Response};

const APPLICATION_JSON: &str = "application/json";

// ============================================================================
// Generic wrappers
// ============================================================================

/// Wrap a request interceptor in an option.
pub fn with_request_interceptor<'a>(interceptor: impl RequestInterceptor + 'a) -> CallOption<'a> {
    CallOption::request(interceptor)
}

/// Wrap a closure in a request-interceptor option.
pub fn with_request_interceptor_fn<'a, F>(func: F) -> CallOption<'a>
where
    F: Fn(Request) -> Result<Request, Error> + Send + Sync + 'a,
{
    CallOption::request(RequestInterceptorFn::new(func))
}

/// Wrap a response interceptor in an option.
pub fn with_response_interceptor<'a>(interceptor: impl ResponseInterceptor + 'a) -> CallOption<'a> {
    CallOption::response(interceptor)
}

/// Wrap a closure in a response-interceptor option.
pub fn with_response_interceptor_fn<'a, F>(func: F) -> CallOption<'a>
where
    F: Fn(Response) -> BoxFuture<'static, Result<Response, Error>> + Send + Sync + 'a,
{
    CallOption::response(ResponseInterceptorFn::new(func))
}

/// Wrap a value implementing both capabilities in one dual-role option.
///
/// Registered once, it runs in the request phase and in the response phase.
pub fn with_interceptor<'a, I>(interceptor: I) -> CallOption<'a>
where
    I: RequestInterceptor + ResponseInterceptor + 'a,
{
    CallOption::dual(interceptor)
}

// ============================================================================
// Header
// ============================================================================

/// Sets (overwrites) one request header.
#[derive(Clone, Debug)]
pub struct HeaderInterceptor {
    name: HeaderName,
    value: HeaderValue,
}

impl HeaderInterceptor {
    /// Create a new header interceptor.
    ///
    /// # Panics
    ///
    /// Panics if the header name or value is invalid.
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.parse().expect("invalid header name"),
            value: value.parse().expect("invalid header value"),
        }
    }

    /// Try to create a new header interceptor, returning an error if invalid.
    pub fn try_new(name: &str, value: &str) -> Result<Self, Error> {
        let name = name
            .parse()
            .map_err(|_| Error::InvalidHeader(format!("invalid header name: {}", name)))?;
        let value = value
            .parse()
            .map_err(|_| Error::InvalidHeader(format!("invalid header value: {}", value)))?;
        Ok(Self { name, value })
    }

    /// Create a new header interceptor from pre-parsed values.
    pub fn from_parts(name: HeaderName, value: HeaderValue) -> Self {
        Self { name, value }
    }
}

impl RequestInterceptor for HeaderInterceptor {
    fn intercept_request(&self, mut request: Request) -> Result<Request, Error> {
        request
            .headers_mut()
            .insert(self.name.clone(), self.value.clone());
        Ok(request)
    }
}

/// Set request header `name` to `value`, replacing any existing values.
///
/// # Panics
///
/// Panics if the header name or value is invalid. Use
/// [`try_with_request_header`] to handle that case.
pub fn with_request_header(name: &str, value: &str) -> CallOption<'static> {
    CallOption::request(HeaderInterceptor::new(name, value))
}

/// Fallible form of [`with_request_header`].
pub fn try_with_request_header(name: &str, value: &str) -> Result<CallOption<'static>, Error> {
    Ok(CallOption::request(HeaderInterceptor::try_new(name, value)?))
}

// ============================================================================
// Body
// ============================================================================

/// Replace the body of `request`, setting `Content-Type` and, when known,
/// `Content-Length`.
///
/// Any previous body is dropped first, which releases whatever it held.
fn set_body(
    mut request: Request,
    body: RequestBody,
    content_type: &str,
    length: Option<u64>,
) -> Result<Request, Error> {
    let content_type = HeaderValue::from_str(content_type)
        .map_err(|_| Error::InvalidHeader(format!("invalid content type: {}", content_type)))?;

    let previous = std::mem::replace(request.body_mut(), body);
    if !previous.is_empty() {
        #[cfg(feature = "tracing")]
        tracing::trace!(previous = ?previous, "replacing request body");
    }
    drop(previous);

    let headers = request.headers_mut();
    headers.insert(CONTENT_TYPE, content_type);
    match length {
        Some(length) => {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
        }
        None => {
            headers.remove(CONTENT_LENGTH);
        }
    }
    Ok(request)
}

/// Installs a fixed request body.
#[derive(Clone, Debug)]
pub struct BodyInterceptor {
    body: Bytes,
    content_type: String,
}

impl BodyInterceptor {
    /// Create a body interceptor for `body` with `content_type`.
    pub fn new(body: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: content_type.into(),
        }
    }
}

impl RequestInterceptor for BodyInterceptor {
    fn intercept_request(&self, request: Request) -> Result<Request, Error> {
        set_body(
            request,
            RequestBody::full(self.body.clone()),
            &self.content_type,
            Some(self.body.len() as u64),
        )
    }
}

/// Use `body` as the request body with the given content type.
///
/// The previous body, if any, is dropped. `Content-Length` is set to the
/// exact byte length of `body`.
pub fn with_body(body: impl Into<Bytes>, content_type: impl Into<String>) -> CallOption<'static> {
    CallOption::request(BodyInterceptor::new(body, content_type))
}

/// Installs a single-use streaming request body.
pub struct StreamBodyInterceptor {
    body: Mutex<Option<RequestBody>>,
    content_type: String,
    length: Option<u64>,
}

impl RequestInterceptor for StreamBodyInterceptor {
    fn intercept_request(&self, request: Request) -> Result<Request, Error> {
        let body = match self.body.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match body {
            Some(body) => set_body(request, body, &self.content_type, self.length),
            None => Err(Error::InvalidRequest(
                "streaming request body already consumed".into(),
            )),
        }
    }
}

impl std::fmt::Debug for StreamBodyInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamBodyInterceptor")
            .field("content_type", &self.content_type)
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

/// Use `stream` as the request body with the given content type.
///
/// `length` is sent as `Content-Length` when known; otherwise any existing
/// `Content-Length` is removed and the body is sent chunked. The stream can
/// be sent once, so the option is call-only.
pub fn with_body_stream<S>(
    stream: S,
    content_type: impl Into<String>,
    length: Option<u64>,
) -> CallOption<'static>
where
    S: Stream<Item = Result<Bytes, Error>> + Send + 'static,
{
    CallOption::request(StreamBodyInterceptor {
        body: Mutex::new(Some(RequestBody::streaming(stream))),
        content_type: content_type.into(),
        length,
    })
    .call_only()
}

/// Serializes a value as the JSON request body.
#[derive(Clone, Debug)]
pub struct JsonBodyInterceptor<T> {
    value: T,
}

impl<T> RequestInterceptor for JsonBodyInterceptor<T>
where
    T: Serialize + Send + Sync,
{
    fn intercept_request(&self, request: Request) -> Result<Request, Error> {
        let body = serde_json::to_vec(&self.value)
            .map_err(|e| Error::Encode(format!("JSON encoding failed: {}", e)))?;
        let length = body.len() as u64;
        set_body(
            request,
            RequestBody::full(body),
            APPLICATION_JSON,
            Some(length),
        )
    }
}

/// Use `value`, encoded as JSON, as the request body.
///
/// The value is serialized each time the interceptor runs, so `value` may be
/// a reference. Sets `Content-Type: application/json` and the exact
/// `Content-Length`. Serialization failures abort the call with
/// [`Error::Encode`].
pub fn with_json<'a, T>(value: T) -> CallOption<'a>
where
    T: Serialize + Send + Sync + 'a,
{
    CallOption::request(JsonBodyInterceptor { value })
}

// ============================================================================
// Status code
// ============================================================================

/// Rejects responses whose status is not one of the expected codes.
#[derive(Clone, Debug)]
pub struct StatusCodeInterceptor {
    expected: Vec<u16>,
}

impl StatusCodeInterceptor {
    /// Accept only the given status codes.
    pub fn new<I>(expected: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<u16>,
    {
        Self {
            expected: expected.into_iter().map(Into::into).collect(),
        }
    }

    fn accepts(&self, status: StatusCode) -> bool {
        self.expected.contains(&status.as_u16())
    }
}

impl ResponseInterceptor for StatusCodeInterceptor {
    fn intercept_response<'a>(
        &'a self,
        response: Response,
    ) -> BoxFuture<'a, Result<Response, Error>> {
        Box::pin(async move {
            if self.accepts(response.status()) {
                Ok(response)
            } else {
                Err(Error::UnexpectedStatus(response.status()))
            }
        })
    }
}

/// Expect the response status to be one of `codes`.
///
/// Accepts `u16` values or [`StatusCode`]s. A matching response passes
/// through unchanged; any other fails with [`Error::UnexpectedStatus`].
pub fn expected_status_code<I>(codes: I) -> CallOption<'static>
where
    I: IntoIterator,
    I::Item: Into<u16>,
{
    CallOption::response(StatusCodeInterceptor::new(codes))
}

// ============================================================================
// JSON response
// ============================================================================

/// Captures a JSON response body into a caller-owned value.
///
/// In the request phase it appends `Accept: application/json`. In the
/// response phase it requires a `Content-Type` starting with
/// `application/json`, reads the full body, deserializes it into the target
/// and puts the buffered body back on the response.
pub struct JsonResponseInterceptor<'a, T> {
    target: Mutex<&'a mut T>,
}

impl<T> RequestInterceptor for JsonResponseInterceptor<'_, T>
where
    T: DeserializeOwned + Send,
{
    fn intercept_request(&self, mut request: Request) -> Result<Request, Error> {
        request
            .headers_mut()
            .append(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
        Ok(request)
    }
}

impl<T> ResponseInterceptor for JsonResponseInterceptor<'_, T>
where
    T: DeserializeOwned + Send,
{
    fn intercept_response<'a>(
        &'a self,
        mut response: Response,
    ) -> BoxFuture<'a, Result<Response, Error>> {
        Box::pin(async move {
            let content_type = content_type(&response);
            if !content_type.starts_with(APPLICATION_JSON) {
                return Err(Error::UnexpectedContentType(content_type.to_string()));
            }

            let body = read_body(&mut response).await?;
            let value: T = serde_json::from_slice(&body)
                .map_err(|e| Error::Decode(format!("JSON decoding failed: {}", e)))?;

            let mut target = match self.target.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            **target = value;
            Ok(response)
        })
    }
}

/// Decode the JSON response body into `target`.
///
/// The returned option is dual-role and call-only: it borrows `target` for
/// the duration of one call and cannot be registered on a client.
///
/// # Example
///
/// ```ignore
/// let mut body = Echo::default();
/// client.post("/post", [with_json("hello"), for_json(&mut body)]).await?;
/// ```
pub fn for_json<'a, T>(target: &'a mut T) -> CallOption<'a>
where
    T: DeserializeOwned + Send + 'a,
{
    CallOption::dual(JsonResponseInterceptor {
        target: Mutex::new(target),
    })
    .call_only()
}

// ============================================================================
// URL prefix
// ============================================================================

/// Prefixes relative request URIs.
#[derive(Clone, Debug)]
pub struct UrlPrefixInterceptor {
    prefix: String,
}

impl UrlPrefixInterceptor {
    /// Create an interceptor prefixing relative URIs with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl RequestInterceptor for UrlPrefixInterceptor {
    fn intercept_request(&self, mut request: Request) -> Result<Request, Error> {
        if request.uri().scheme().is_some() {
            return Ok(request);
        }

        let url = match RelativeUrl::of(&request) {
            Some(raw) => format!("{}{}", self.prefix, raw),
            None => format!("{}{}", self.prefix, request.uri()),
        };
        let uri: Uri = match url.parse() {
            Ok(uri) => uri,
            Err(e) => {
                return Err(Error::InvalidUrl {
                    reason: format!("{}", e),
                    url,
                });
            }
        };
        request.extensions_mut().remove::<RelativeUrl>();
        *request.uri_mut() = uri;
        Ok(request)
    }
}

/// Apply a common URL prefix to requests whose URI has no scheme.
///
/// The prefix and the relative target are joined as plain text, so
/// `with_url_prefix("https://host/")` turns `status/404` into
/// `https://host/status/404` and `https://host` turns `/get` into
/// `https://host/get`. A combined URL that fails to parse aborts the call
/// with [`Error::InvalidUrl`]. Absolute URIs are left unchanged.
pub fn with_url_prefix(prefix: impl Into<String>) -> CallOption<'static> {
    CallOption::request(UrlPrefixInterceptor::new(prefix))
}

// ============================================================================
// Deadline
// ============================================================================

/// Bind a deadline `timeout` after the interceptor runs.
///
/// An earlier deadline already bound to the request is kept.
pub fn with_timeout(timeout: Duration) -> CallOption<'static> {
    with_request_interceptor_fn(move |mut request| {
        Deadline::after(timeout).apply(&mut request);
        Ok(request)
    })
}

/// Bind the deadline `instant` to the request.
///
/// An earlier deadline already bound to the request is kept.
pub fn with_deadline(instant: Instant) -> CallOption<'static> {
    with_request_interceptor_fn(move |mut request| {
        Deadline::at(instant).apply(&mut request);
        Ok(request)
    })
}
