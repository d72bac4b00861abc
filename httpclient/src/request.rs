//! Request type and construction.
//!
//! A [`Request`] is a plain [`http::Request`] carrying a [`RequestBody`].
//! Its deadline, if any, travels with it as a [`Deadline`] extension so that
//! interceptors can tighten it and the transport invocation can observe it.
//!
//! A relative target such as `status/404` or `?page=2` cannot be expressed
//! exactly by [`http::Uri`], so [`build`] also keeps the caller's raw text as
//! a [`RelativeUrl`] extension for interceptors that resolve it.

use std::time::Duration;

use http::uri::{Parts, PathAndQuery};
use http::{Method, Uri};
use tokio::time::Instant;

use crate::{Error, RequestBody};

/// An outgoing HTTP request.
pub type Request = http::Request<RequestBody>;

/// The point in time after which a request is abandoned.
///
/// Stored in the request extensions. When present, the transport invocation
/// is bounded by it and fails with [`Error::Timeout`] once it passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline(Instant);

impl Deadline {
    /// A deadline at `instant`.
    pub fn at(instant: Instant) -> Self {
        Self(instant)
    }

    /// A deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self(Instant::now() + timeout)
    }

    /// The instant this deadline expires.
    pub fn instant(&self) -> Instant {
        self.0
    }

    /// Bind this deadline to `request`, keeping an earlier existing one.
    pub fn apply(self, request: &mut Request) {
        let deadline = match request.extensions().get::<Deadline>() {
            Some(existing) => (*existing).min(self),
            None => self,
        };
        request.extensions_mut().insert(deadline);
    }

    /// The deadline bound to `request`, if any.
    pub fn of(request: &Request) -> Option<Deadline> {
        request.extensions().get::<Deadline>().copied()
    }
}

/// The relative target a request was built from, exactly as written.
///
/// Only meaningful while the request URI is still the one derived from it;
/// [`RelativeUrl::of`] returns `None` once an interceptor replaces the URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeUrl {
    raw: String,
    uri: Uri,
}

impl RelativeUrl {
    /// The raw relative target bound to `request`, if its URI is unchanged.
    pub fn of(request: &Request) -> Option<&str> {
        request
            .extensions()
            .get::<RelativeUrl>()
            .filter(|relative| relative.uri == *request.uri())
            .map(|relative| relative.raw.as_str())
    }
}

/// Build a fresh request for `method` and `url` with an empty body.
///
/// `url` is either absolute or relative. Relative targets need not start
/// with `/`; they are kept as a [`RelativeUrl`] so that
/// [`with_url_prefix`](crate::with_url_prefix) can join them verbatim.
pub(crate) fn build(method: Method, url: &str) -> Result<Request, Error> {
    let malformed = |e: &dyn std::fmt::Display| {
        Error::InvalidRequest(format!("malformed URL {:?}: {}", url, e))
    };

    let (uri, relative) = match url.parse::<Uri>() {
        Ok(uri) if uri.scheme().is_some() => (uri, None),
        Err(e) if url.contains("://") => return Err(malformed(&e)),
        _ => {
            let uri = relative_uri(url).map_err(|e| malformed(&e))?;
            let relative = RelativeUrl {
                raw: url.to_string(),
                uri: uri.clone(),
            };
            (uri, Some(relative))
        }
    };

    let mut request = http::Request::builder()
        .method(method)
        .uri(uri)
        .body(RequestBody::empty())
        .map_err(|e| Error::InvalidRequest(e.to_string()))?;
    if let Some(relative) = relative {
        request.extensions_mut().insert(relative);
    }
    Ok(request)
}

/// A scheme-less URI carrying only a path and query.
fn relative_uri(url: &str) -> Result<Uri, http::Error> {
    let path_and_query = if url.is_empty() {
        PathAndQuery::from_static("/")
    } else {
        PathAndQuery::try_from(url)?
    };

    let mut parts = Parts::default();
    parts.path_and_query = Some(path_and_query);
    Ok(Uri::from_parts(parts)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_relative() {
        let req = build(Method::GET, "/status/404").unwrap();
        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.uri(), "/status/404");
        assert!(req.uri().scheme().is_none());
        assert!(req.body().is_empty());
        assert!(Deadline::of(&req).is_none());
    }

    #[test]
    fn test_build_absolute() {
        let req = build(Method::POST, "https://example.test/post?x=1").unwrap();
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.uri().host(), Some("example.test"));
        assert_eq!(req.uri().query(), Some("x=1"));
    }

    #[test]
    fn test_build_relative_without_leading_slash() {
        for url in ["status/404", "a/b?x=1", "?page=2", ""] {
            let req = build(Method::GET, url).unwrap();
            assert!(req.uri().scheme().is_none(), "{url:?}");
            assert_eq!(RelativeUrl::of(&req), Some(url));
        }
    }

    #[test]
    fn test_build_absolute_has_no_relative_url() {
        let req = build(Method::GET, "http://example.test/get").unwrap();
        assert!(RelativeUrl::of(&req).is_none());
    }

    #[test]
    fn test_relative_url_forgotten_after_uri_change() {
        let mut req = build(Method::GET, "status/404").unwrap();
        *req.uri_mut() = Uri::from_static("/other");
        assert!(RelativeUrl::of(&req).is_none());
    }

    #[test]
    fn test_build_invalid_relative() {
        let err = build(Method::GET, "a b").unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn test_build_malformed_url() {
        let err = build(Method::GET, "http://[::1").unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn test_build_custom_method() {
        let method = Method::from_bytes(b"PURGE").unwrap();
        let req = build(method.clone(), "/cache").unwrap();
        assert_eq!(req.method(), method);
    }

    #[tokio::test]
    async fn test_deadline_keeps_earlier() {
        let mut req = build(Method::GET, "/").unwrap();
        let soon = Deadline::after(Duration::from_secs(1));
        let later = Deadline::after(Duration::from_secs(60));

        soon.apply(&mut req);
        later.apply(&mut req);
        assert_eq!(Deadline::of(&req), Some(soon));
    }

    #[tokio::test]
    async fn test_deadline_tightens() {
        let mut req = build(Method::GET, "/").unwrap();
        let later = Deadline::after(Duration::from_secs(60));
        let soon = Deadline::at(later.instant() - Duration::from_secs(30));

        later.apply(&mut req);
        soon.apply(&mut req);
        assert_eq!(Deadline::of(&req), Some(soon));
    }
}
