//! HTTP client implementation.
//!
//! This module provides the main [`Client`] type and its execution engine.

use std::sync::Arc;
use std::time::Duration;

use http::Method;
#[cfg(feature = "tracing")]
use tracing::{Instrument, debug_span};

use crate::builder::{ClientBuildError, ClientBuilder};
use crate::config::{CallOption, ClientOption};
use crate::interceptor::{RequestInterceptor, ResponseInterceptor};
use crate::request::{self, Deadline};
use crate::response::RequestInfo;
use crate::transport::Transport;
use crate::{Error, Request, Response};

/// HTTP client with an interceptor pipeline.
///
/// Every call runs, in order: client-level request interceptors, call-level
/// request interceptors, the transport, call-level response interceptors and
/// client-level response interceptors. The first error aborts the call.
///
/// The client is cheap to clone; clones share the transport and interceptor
/// sequences, which are never mutated after construction.
///
/// # Example
///
/// ```ignore
/// use httpclient::{Client, expected_status_code, for_json, with_json, with_url_prefix};
///
/// let client = Client::new([
///     with_url_prefix("https://httpbin.org"),
///     expected_status_code([200]),
/// ])?;
///
/// let mut echoed = Echo::default();
/// let response = client
///     .post("/post", [with_json("hello"), for_json(&mut echoed)])
///     .await?;
/// ```
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    request_interceptors: Arc<[Arc<dyn RequestInterceptor>]>,
    response_interceptors: Arc<[Arc<dyn ResponseInterceptor>]>,
    /// Deadline bound to requests built by [`Client::execute`].
    timeout: Option<Duration>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("request_interceptors", &self.request_interceptors.len())
            .field("response_interceptors", &self.response_interceptors.len())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client from client-level options.
    ///
    /// Equivalent to adding each option to [`Client::builder`] in order.
    ///
    /// # Panics
    ///
    /// Panics with `unexpected option` if an option is not usable at client
    /// level.
    pub fn new<I>(options: I) -> Result<Self, ClientBuildError>
    where
        I: IntoIterator,
        I::Item: Into<ClientOption>,
    {
        ClientBuilder::new().options(options).build()
    }

    /// Create a builder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn from_parts(
        transport: Arc<dyn Transport>,
        request_interceptors: Arc<[Arc<dyn RequestInterceptor>]>,
        response_interceptors: Arc<[Arc<dyn ResponseInterceptor>]>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            transport,
            request_interceptors,
            response_interceptors,
            timeout,
        }
    }

    /// Number of client-level request interceptors.
    pub fn request_interceptor_count(&self) -> usize {
        self.request_interceptors.len()
    }

    /// Number of client-level response interceptors.
    pub fn response_interceptor_count(&self) -> usize {
        self.response_interceptors.len()
    }

    /// Issue a `GET` request.
    pub async fn get<'a, I>(&self, url: &str, options: I) -> Result<Response, Error>
    where
        I: IntoIterator<Item = CallOption<'a>>,
    {
        self.execute(Method::GET, url, options).await
    }

    /// Issue a `POST` request.
    ///
    /// The body is empty unless an option such as
    /// [`with_body`](crate::with_body) or [`with_json`](crate::with_json)
    /// installs one.
    pub async fn post<'a, I>(&self, url: &str, options: I) -> Result<Response, Error>
    where
        I: IntoIterator<Item = CallOption<'a>>,
    {
        self.execute(Method::POST, url, options).await
    }

    /// Issue a `PUT` request.
    pub async fn put<'a, I>(&self, url: &str, options: I) -> Result<Response, Error>
    where
        I: IntoIterator<Item = CallOption<'a>>,
    {
        self.execute(Method::PUT, url, options).await
    }

    /// Issue a `DELETE` request.
    pub async fn delete<'a, I>(&self, url: &str, options: I) -> Result<Response, Error>
    where
        I: IntoIterator<Item = CallOption<'a>>,
    {
        self.execute(Method::DELETE, url, options).await
    }

    /// Build a request with an arbitrary method and URL, then [`send`](Self::send) it.
    ///
    /// The URL may be relative, with or without a leading `/`, if an
    /// interceptor such as [`with_url_prefix`](crate::with_url_prefix) makes
    /// it absolute. A URL that cannot be parsed fails with [`Error::InvalidRequest`] before any
    /// interceptor runs.
    pub async fn execute<'a, I>(
        &self,
        method: Method,
        url: &str,
        options: I,
    ) -> Result<Response, Error>
    where
        I: IntoIterator<Item = CallOption<'a>>,
    {
        let mut request = request::build(method, url)?;
        if let Some(timeout) = self.timeout {
            Deadline::after(timeout).apply(&mut request);
        }
        self.send(request, options).await
    }

    /// Run a caller-built request through the pipeline.
    ///
    /// Client-level request interceptors run first, then the request
    /// capability of each call option in order. The transport then sends the
    /// request, bounded by its [`Deadline`] if one is bound. Response
    /// interceptors run in reverse nesting: call options first, then the
    /// client-level sequence.
    pub async fn send<'a, I>(&self, request: Request, options: I) -> Result<Response, Error>
    where
        I: IntoIterator<Item = CallOption<'a>>,
    {
        let options: Vec<CallOption<'a>> = options.into_iter().collect();

        #[cfg(feature = "tracing")]
        let span = debug_span!(
            "http.call",
            http.method = %request.method(),
            http.url = %request.uri(),
            otel.kind = "client",
        );

        let call = self.run(request, options);

        #[cfg(feature = "tracing")]
        let call = call.instrument(span);

        call.await
    }

    async fn run(
        &self,
        mut request: Request,
        options: Vec<CallOption<'_>>,
    ) -> Result<Response, Error> {
        // Request phase: client-level, then call-level.
        for (position, interceptor) in self.request_interceptors.iter().enumerate() {
            request = interceptor
                .intercept_request(request)
                .inspect_err(|e| log_abort("client.request", position, e))?;
        }
        for (position, option) in options.iter().enumerate() {
            if let Some(interceptor) = option.request_interceptor() {
                request = interceptor
                    .intercept_request(request)
                    .inspect_err(|e| log_abort("call.request", position, e))?;
            }
        }

        let info = RequestInfo {
            method: request.method().clone(),
            uri: request.uri().clone(),
        };
        let deadline = Deadline::of(&request);

        #[cfg(feature = "tracing")]
        tracing::debug!(url = %info.uri, deadline = ?deadline, "sending request");

        let sent = self.transport.send(request);
        let result = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline.instant(), sent)
                .await
                .unwrap_or(Err(Error::Timeout)),
            None => sent.await,
        };
        let mut response = result.inspect_err(|_e| {
            #[cfg(feature = "tracing")]
            tracing::debug!(error = %_e, "transport failed");
        })?;

        #[cfg(feature = "tracing")]
        tracing::debug!(status = response.status().as_u16(), "received response");

        response.extensions_mut().insert(info);

        // Response phase: call-level, then client-level. The body is owned
        // by `response`, so every early return drops it exactly once.
        for (position, option) in options.iter().enumerate() {
            if let Some(interceptor) = option.response_interceptor() {
                response = interceptor
                    .intercept_response(response)
                    .await
                    .inspect_err(|e| log_abort("call.response", position, e))?;
            }
        }
        for (position, interceptor) in self.response_interceptors.iter().enumerate() {
            response = interceptor
                .intercept_response(response)
                .await
                .inspect_err(|e| log_abort("client.response", position, e))?;
        }

        Ok(response)
    }
}

/// Record which interceptor aborted a call.
///
/// `position` is the index within the client sequence or the call options.
fn log_abort(_phase: &'static str, _position: usize, _error: &Error) {
    #[cfg(feature = "tracing")]
    tracing::debug!(
        phase = _phase,
        position = _position,
        error = %_error,
        "interceptor aborted call"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        expected_status_code, for_json, with_deadline, with_interceptor, with_json,
        with_request_header, with_request_interceptor_fn, with_response_interceptor_fn,
        with_timeout, with_transport, with_url_prefix,
    };
    use crate::interceptor::BoxFuture;
    use crate::{RequestBody, ResponseBody};
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::BodyExt;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Log = Arc<Mutex<Vec<String>>>;

    /// Echoes the request URI, headers and body as a JSON document.
    #[derive(Clone, Default)]
    struct EchoTransport {
        log: Log,
        status: u16,
        delay: Option<Duration>,
        calls: Arc<AtomicUsize>,
    }

    impl EchoTransport {
        fn new(log: &Log) -> Self {
            Self {
                log: log.clone(),
                status: 200,
                ..Self::default()
            }
        }
    }

    impl Transport for EchoTransport {
        fn send(&self, request: Request) -> BoxFuture<'_, Result<Response, Error>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.log.lock().unwrap().push("transport".into());
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }

                let (parts, body) = request.into_parts();
                let body = body.collect().await?.to_bytes();
                let headers: serde_json::Map<String, serde_json::Value> = parts
                    .headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_str().unwrap().into()))
                    .collect();
                let echo = serde_json::json!({
                    "url": parts.uri.to_string(),
                    "method": parts.method.as_str(),
                    "headers": headers,
                    "data": String::from_utf8_lossy(&body),
                });

                Ok(http::Response::builder()
                    .status(self.status)
                    .header(http::header::CONTENT_TYPE, "application/json")
                    .body(ResponseBody::full(echo.to_string()))
                    .unwrap())
            })
        }
    }

    struct FailingTransport;

    impl Transport for FailingTransport {
        fn send(&self, _request: Request) -> BoxFuture<'_, Result<Response, Error>> {
            Box::pin(async { Err(Error::Transport("connection refused".into())) })
        }
    }

    fn record_request(log: &Log, name: &'static str) -> CallOption<'static> {
        let log = log.clone();
        with_request_interceptor_fn(move |request| {
            log.lock().unwrap().push(format!("{name}.req"));
            Ok(request)
        })
    }

    fn record_response(log: &Log, name: &'static str) -> CallOption<'static> {
        let log = log.clone();
        with_response_interceptor_fn(move |response| {
            log.lock().unwrap().push(format!("{name}.res"));
            Box::pin(async move { Ok(response) })
        })
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[derive(Debug, Default, serde::Deserialize)]
    struct Echo {
        url: String,
        method: String,
        headers: std::collections::HashMap<String, String>,
        data: String,
    }

    #[tokio::test]
    async fn test_interceptor_ordering() {
        let log: Log = Arc::default();
        let client = Client::new([
            with_transport(EchoTransport::new(&log)),
            record_request(&log, "R1").into(),
            record_response(&log, "R1").into(),
            record_request(&log, "R2").into(),
            record_response(&log, "R2").into(),
        ])
        .unwrap();

        client
            .get(
                "http://test/get",
                [
                    record_request(&log, "C1"),
                    record_response(&log, "C1"),
                    record_request(&log, "C2"),
                    record_response(&log, "C2"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(
            entries(&log),
            vec![
                "R1.req", "R2.req", "C1.req", "C2.req", "transport", "C1.res", "C2.res", "R1.res",
                "R2.res"
            ]
        );
    }

    #[tokio::test]
    async fn test_request_error_short_circuits() {
        let log: Log = Arc::default();
        let transport = EchoTransport::new(&log);
        let calls = transport.calls.clone();
        let client = Client::new([
            with_transport(transport),
            with_request_interceptor_fn(|_| Err(Error::interceptor("denied"))).into(),
            record_request(&log, "R2").into(),
            record_response(&log, "R2").into(),
        ])
        .unwrap();

        let err = client
            .get("http://test/get", [record_request(&log, "C1")])
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "denied");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(entries(&log).is_empty());
    }

    #[tokio::test]
    async fn test_response_error_short_circuits() {
        let log: Log = Arc::default();
        let client = Client::new([
            with_transport(EchoTransport::new(&log)),
            record_response(&log, "R1").into(),
        ])
        .unwrap();

        let err = client
            .get(
                "http://test/get",
                [
                    with_response_interceptor_fn(|_| {
                        Box::pin(async { Err(Error::interceptor("rejected")) })
                    }),
                    record_response(&log, "C2"),
                ],
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "rejected");
        assert_eq!(entries(&log), vec!["transport"]);
    }

    #[tokio::test]
    async fn test_abort_midway_through_call_options() {
        let log: Log = Arc::default();
        let client = Client::new([
            with_transport(EchoTransport::new(&log)),
            record_request(&log, "R1").into(),
        ])
        .unwrap();

        let err = client
            .get(
                "http://test/get",
                [
                    record_request(&log, "C1"),
                    with_request_interceptor_fn(|_| Err(Error::interceptor("denied"))),
                    record_request(&log, "C3"),
                ],
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "denied");
        assert_eq!(entries(&log), vec!["R1.req", "C1.req"]);
    }

    #[tokio::test]
    async fn test_transport_error_skips_response_interceptors() {
        let log: Log = Arc::default();
        let client = Client::new([
            with_transport(FailingTransport),
            record_response(&log, "R1").into(),
        ])
        .unwrap();

        let err = client
            .get("http://test/get", [record_response(&log, "C1")])
            .await
            .unwrap_err();

        assert!(err.is_transport());
        assert!(entries(&log).is_empty());
    }

    struct Counting {
        requests: AtomicUsize,
        responses: AtomicUsize,
    }

    impl RequestInterceptor for Counting {
        fn intercept_request(&self, request: Request) -> Result<Request, Error> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            Ok(request)
        }
    }

    impl ResponseInterceptor for Counting {
        fn intercept_response<'a>(
            &'a self,
            response: Response,
        ) -> BoxFuture<'a, Result<Response, Error>> {
            Box::pin(async move {
                self.responses.fetch_add(1, Ordering::SeqCst);
                Ok(response)
            })
        }
    }

    #[tokio::test]
    async fn test_dual_role_runs_once_per_phase() {
        let log: Log = Arc::default();
        let counting = Counting {
            requests: AtomicUsize::new(0),
            responses: AtomicUsize::new(0),
        };

        let client = Client::new([with_transport(EchoTransport::new(&log))]).unwrap();
        client
            .get("http://test/get", [with_interceptor(&counting)])
            .await
            .unwrap();

        assert_eq!(counting.requests.load(Ordering::SeqCst), 1);
        assert_eq!(counting.responses.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unexpected_status() {
        let log: Log = Arc::default();
        let transport = EchoTransport {
            status: 404,
            ..EchoTransport::new(&log)
        };
        let client = Client::new([
            with_transport(transport),
            expected_status_code([200u16]).into(),
        ])
        .unwrap();

        let err = client.get("http://test/status/404", []).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(err.to_string(), "unexpected status code: 404");
    }

    #[tokio::test]
    async fn test_url_prefix_joins_relative_path() {
        let log: Log = Arc::default();
        let client = Client::new([
            with_transport(EchoTransport::new(&log)),
            with_url_prefix("http://test/").into(),
        ])
        .unwrap();

        for (url, expected) in [
            ("status/404", "http://test/status/404"),
            ("?x=1", "http://test/?x=1"),
            ("", "http://test/"),
        ] {
            let mut echo = Echo::default();
            let response = client.get(url, [for_json(&mut echo)]).await.unwrap();
            assert_eq!(echo.url, expected);
            assert_eq!(RequestInfo::of(&response).unwrap().uri, expected);
        }
    }

    #[tokio::test]
    async fn test_url_prefix_and_header() {
        let log: Log = Arc::default();
        let client = Client::new([
            with_transport(EchoTransport::new(&log)),
            with_url_prefix("http://test").into(),
            with_request_header("x-client", "1").into(),
        ])
        .unwrap();

        let mut echo = Echo::default();
        let response = client
            .get(
                "/get?a=1",
                [with_request_header("x-call", "2"), for_json(&mut echo)],
            )
            .await
            .unwrap();

        let info = RequestInfo::of(&response).unwrap();
        assert_eq!(info.method, Method::GET);
        assert_eq!(info.uri, "http://test/get?a=1");

        assert_eq!(echo.url, "http://test/get?a=1");
        assert_eq!(echo.method, "GET");
        assert_eq!(echo.headers["x-client"], "1");
        assert_eq!(echo.headers["x-call"], "2");
        assert_eq!(echo.headers["accept"], "application/json");
    }

    #[tokio::test]
    async fn test_post_json_round_trip() {
        let log: Log = Arc::default();
        let client = Client::new([with_transport(EchoTransport::new(&log))]).unwrap();

        let mut echo = Echo::default();
        let response = client
            .post("http://test/post", [with_json("hello"), for_json(&mut echo)])
            .await
            .unwrap();

        assert_eq!(echo.method, "POST");
        assert_eq!(echo.data, "\"hello\"");
        assert_eq!(echo.headers["content-type"], "application/json");
        assert_eq!(echo.headers["content-length"], "7");

        // The buffered body is still readable by the caller.
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(!body.is_empty());
    }

    #[tokio::test]
    async fn test_send_caller_built_request() {
        let log: Log = Arc::default();
        let client = Client::new([with_transport(EchoTransport::new(&log))]).unwrap();

        let request = http::Request::builder()
            .method(Method::PATCH)
            .uri("http://test/patch")
            .body(RequestBody::full(Bytes::from_static(b"raw")))
            .unwrap();

        let mut echo = Echo::default();
        client.send(request, [for_json(&mut echo)]).await.unwrap();
        assert_eq!(echo.method, "PATCH");
        assert_eq!(echo.data, "raw");
    }

    #[tokio::test]
    async fn test_malformed_url_runs_no_interceptor() {
        let log: Log = Arc::default();
        let client = Client::new([
            with_transport(EchoTransport::new(&log)),
            record_request(&log, "R1").into(),
        ])
        .unwrap();

        let err = client.get("http://[::1", []).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert!(entries(&log).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_deadline_times_out() {
        let log: Log = Arc::default();
        let transport = EchoTransport {
            delay: Some(Duration::from_secs(10)),
            ..EchoTransport::new(&log)
        };
        let client = Client::new([
            with_transport(transport),
            record_response(&log, "R1").into(),
        ])
        .unwrap();

        let err = client
            .get("http://test/get", [with_timeout(Duration::from_secs(1))])
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(entries(&log), vec!["transport"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_timeout_applies_to_execute() {
        let log: Log = Arc::default();
        let transport = EchoTransport {
            delay: Some(Duration::from_secs(10)),
            ..EchoTransport::new(&log)
        };
        let client = Client::builder()
            .option(with_transport(transport))
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        let err = client.get("http://test/get", []).await.unwrap_err();
        assert!(err.is_timeout());

        // A later call deadline cannot extend the client deadline.
        let later = tokio::time::Instant::now() + Duration::from_secs(60);
        let err = client
            .get("http://test/get", [with_deadline(later)])
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_not_reached() {
        let log: Log = Arc::default();
        let transport = EchoTransport {
            delay: Some(Duration::from_millis(10)),
            ..EchoTransport::new(&log)
        };
        let client = Client::new([with_transport(transport)]).unwrap();

        let response = client
            .get("http://test/get", [with_timeout(Duration::from_secs(1))])
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_client() {
        let log: Log = Arc::default();
        let transport = EchoTransport::new(&log);
        let calls = transport.calls.clone();
        let client = Client::new([
            with_transport(transport),
            with_url_prefix("http://test").into(),
            expected_status_code([200u16]).into(),
        ])
        .unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let client = client.clone();
            handles.push(tokio::spawn(async move {
                let mut echo = Echo::default();
                let url = format!("/get?i={i}");
                client.get(&url, [for_json(&mut echo)]).await.unwrap();
                echo.url
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.unwrap(), format!("http://test/get?i={i}"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 8);
    }

    #[test]
    #[should_panic(expected = "unexpected option")]
    fn test_new_rejects_call_only_option() {
        let target: &'static mut Echo = Box::leak(Box::default());
        let _ = Client::new([for_json(target)]);
    }

    #[test]
    fn test_client_debug() {
        let client = Client::new([
            with_transport(FailingTransport),
            with_request_header("x-a", "1").into(),
        ])
        .unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("request_interceptors: 1"));
        assert!(debug.contains("response_interceptors: 0"));
    }
}
