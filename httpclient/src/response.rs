//! Response type and body helpers.

use bytes::Bytes;
use http::{Method, Uri};
use http_body_util::BodyExt;

use crate::{Error, ResponseBody};

/// An incoming HTTP response.
pub type Response = http::Response<ResponseBody>;

/// The request a response answers.
///
/// Inserted into the response extensions by the client before any response
/// interceptor runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    /// Method of the originating request.
    pub method: Method,
    /// Final URI of the originating request, after all request interceptors.
    pub uri: Uri,
}

impl RequestInfo {
    /// The request information attached to `response`, if any.
    pub fn of(response: &Response) -> Option<&RequestInfo> {
        response.extensions().get::<RequestInfo>()
    }
}

/// Read the whole body of `response` and put the buffered bytes back.
///
/// After this call the response body is [`ResponseBody::Full`], so later
/// interceptors and the caller can read it again.
pub async fn read_body(response: &mut Response) -> Result<Bytes, Error> {
    let body = std::mem::take(response.body_mut());
    let bytes = body.collect().await?.to_bytes();
    *response.body_mut() = ResponseBody::full(bytes.clone());
    Ok(bytes)
}

/// The response's `Content-Type` header, or an empty string.
pub(crate) fn content_type(response: &Response) -> &str {
    response
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
