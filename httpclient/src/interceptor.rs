//! Interceptor capability traits.
//!
//! Interceptors add cross-cutting logic to HTTP calls, such as:
//! - Adding authentication headers
//! - Setting request bodies
//! - Validating status codes
//! - Decoding response payloads
//!
//! A request interceptor receives the outgoing [`Request`] by value and
//! returns either the same request (possibly mutated) or a replacement. A
//! response interceptor does the same for the incoming [`Response`]. Returning
//! an error aborts the call; no later interceptor runs.
//!
//! # Example
//!
//! ```ignore
//! use httpclient::{Client, Error, with_request_interceptor_fn, with_response_interceptor_fn};
//!
//! let client = Client::builder()
//!     .option(with_request_interceptor_fn(|mut req| {
//!         req.headers_mut().insert("x-trace-id", "abc123".parse().unwrap());
//!         Ok(req)
//!     }))
//!     .option(with_response_interceptor_fn(|res| {
//!         Box::pin(async move {
//!             if res.status().is_server_error() {
//!                 return Err(Error::interceptor("server failed"));
//!             }
//!             Ok(res)
//!         })
//!     }))
//!     .build()?;
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::{Error, Request, Response};

/// Type alias for a boxed future returning a result.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Intercepts an outgoing request.
///
/// Implementations can modify the request, replace it, or reject it by
/// returning an error. Request interceptors are synchronous; the returned
/// request is passed to the next interceptor in line.
pub trait RequestInterceptor: Send + Sync {
    /// Intercept `request` and return it, a replacement, or an error.
    fn intercept_request(&self, request: Request) -> Result<Request, Error>;
}

/// Intercepts an incoming response.
///
/// Implementations can validate (status, headers), transform (buffer or
/// decode the body) or reject the response. They are asynchronous because
/// reading the body requires polling the transport.
pub trait ResponseInterceptor: Send + Sync {
    /// Intercept `response` and return it, a replacement, or an error.
    fn intercept_response<'a>(
        &'a self,
        response: Response,
    ) -> BoxFuture<'a, Result<Response, Error>>;
}

impl<T: RequestInterceptor + ?Sized> RequestInterceptor for &T {
    fn intercept_request(&self, request: Request) -> Result<Request, Error> {
        (**self).intercept_request(request)
    }
}

impl<T: RequestInterceptor + ?Sized> RequestInterceptor for Arc<T> {
    fn intercept_request(&self, request: Request) -> Result<Request, Error> {
        (**self).intercept_request(request)
    }
}

impl<T: ResponseInterceptor + ?Sized> ResponseInterceptor for &T {
    fn intercept_response<'a>(
        &'a self,
        response: Response,
    ) -> BoxFuture<'a, Result<Response, Error>> {
        (**self).intercept_response(response)
    }
}

impl<T: ResponseInterceptor + ?Sized> ResponseInterceptor for Arc<T> {
    fn intercept_response<'a>(
        &'a self,
        response: Response,
    ) -> BoxFuture<'a, Result<Response, Error>> {
        (**self).intercept_response(response)
    }
}

/// A request interceptor backed by a closure.
///
/// # Example
///
/// ```ignore
/// use httpclient::RequestInterceptorFn;
///
/// let interceptor = RequestInterceptorFn::new(|req| Ok(req));
/// ```
#[derive(Clone)]
pub struct RequestInterceptorFn<F> {
    func: F,
}

impl<F> RequestInterceptorFn<F>
where
    F: Fn(Request) -> Result<Request, Error> + Send + Sync,
{
    /// Create a new request interceptor from a closure.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> RequestInterceptor for RequestInterceptorFn<F>
where
    F: Fn(Request) -> Result<Request, Error> + Send + Sync,
{
    fn intercept_request(&self, request: Request) -> Result<Request, Error> {
        (self.func)(request)
    }
}

impl<F> std::fmt::Debug for RequestInterceptorFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestInterceptorFn").finish()
    }
}

/// A response interceptor backed by a closure returning a boxed future.
///
/// # Example
///
/// ```ignore
/// use httpclient::ResponseInterceptorFn;
///
/// let interceptor = ResponseInterceptorFn::new(|res| Box::pin(async move { Ok(res) }));
/// ```
#[derive(Clone)]
pub struct ResponseInterceptorFn<F> {
    func: F,
}

impl<F> ResponseInterceptorFn<F>
where
    F: Fn(Response) -> BoxFuture<'static, Result<Response, Error>> + Send + Sync,
{
    /// Create a new response interceptor from a closure.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> ResponseInterceptor for ResponseInterceptorFn<F>
where
    F: Fn(Response) -> BoxFuture<'static, Result<Response, Error>> + Send + Sync,
{
    fn intercept_response<'a>(
        &'a self,
        response: Response,
    ) -> BoxFuture<'a, Result<Response, Error>> {
        (self.func)(response)
    }
}

impl<F> std::fmt::Debug for ResponseInterceptorFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseInterceptorFn").finish()
    }
}
