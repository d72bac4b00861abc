//! Body types for requests and responses.
//!
//! [`RequestBody`] is what interceptors install on outgoing requests and what
//! the transport sends. [`ResponseBody`] wraps whatever the transport
//! received so interceptors can consume it or replace it with buffered bytes.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use http_body::{Body, Frame, SizeHint};
use hyper::body::Incoming;
use pin_project_lite::pin_project;

use crate::Error;

pin_project! {
    /// A request body.
    ///
    /// This type can represent:
    /// - Empty bodies (the default for freshly built requests)
    /// - Full bodies (installed by [`with_body`](crate::with_body) and
    ///   [`with_json`](crate::with_json))
    /// - Streaming bodies (for caller-built requests)
    #[project = RequestBodyProj]
    pub enum RequestBody {
        /// Empty request body.
        Empty,
        /// Full request body with all data available.
        Full {
            data: Option<Bytes>,
        },
        /// Streaming request body from an async stream.
        Streaming {
            #[pin]
            stream: Pin<Box<dyn Stream<Item = Result<Bytes, Error>> + Send>>,
        },
    }
}

impl RequestBody {
    /// Create an empty body.
    pub fn empty() -> Self {
        RequestBody::Empty
    }

    /// Create a body with the given data.
    pub fn full(data: impl Into<Bytes>) -> Self {
        RequestBody::Full {
            data: Some(data.into()),
        }
    }

    /// Create a streaming body from the given stream.
    pub fn streaming<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, Error>> + Send + 'static,
    {
        RequestBody::Streaming {
            stream: Box::pin(stream),
        }
    }

    /// Returns true if the body carries no data.
    pub fn is_empty(&self) -> bool {
        match self {
            RequestBody::Empty => true,
            RequestBody::Full { data } => data.as_ref().is_none_or(|d| d.is_empty()),
            RequestBody::Streaming { .. } => false,
        }
    }
}

impl Body for RequestBody {
    type Data = Bytes;
    type Error = Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.project() {
            RequestBodyProj::Empty => Poll::Ready(None),
            RequestBodyProj::Full { data } => Poll::Ready(data.take().map(|d| Ok(Frame::data(d)))),
            RequestBodyProj::Streaming { stream } => match stream.poll_next(cx) {
                Poll::Ready(Some(Ok(data))) => Poll::Ready(Some(Ok(Frame::data(data)))),
                Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => Poll::Ready(None),
                Poll::Pending => Poll::Pending,
            },
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            RequestBody::Empty => true,
            RequestBody::Full { data } => data.is_none(),
            RequestBody::Streaming { .. } => false,
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            RequestBody::Empty => SizeHint::with_exact(0),
            RequestBody::Full { data } => {
                SizeHint::with_exact(data.as_ref().map_or(0, |d| d.len() as u64))
            }
            RequestBody::Streaming { .. } => SizeHint::default(),
        }
    }
}

impl Default for RequestBody {
    fn default() -> Self {
        RequestBody::Empty
    }
}

impl From<Bytes> for RequestBody {
    fn from(data: Bytes) -> Self {
        RequestBody::full(data)
    }
}

impl std::fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestBody::Empty => write!(f, "RequestBody::Empty"),
            RequestBody::Full { data } => f
                .debug_struct("RequestBody::Full")
                .field("data_len", &data.as_ref().map(|d| d.len()))
                .finish(),
            RequestBody::Streaming { .. } => write!(f, "RequestBody::Streaming"),
        }
    }
}

pin_project! {
    /// A response body.
    ///
    /// Starts out as the transport's streaming body. Interceptors that read
    /// the body (such as [`for_json`](crate::for_json)) put the buffered bytes
    /// back as [`ResponseBody::Full`] so later consumers still see them.
    /// Dropping the body releases the underlying connection.
    #[project = ResponseBodyProj]
    pub enum ResponseBody {
        /// Empty response body.
        Empty,
        /// Buffered response body.
        Full {
            data: Option<Bytes>,
        },
        /// Body streamed from a hyper connection.
        Incoming {
            #[pin]
            body: Incoming,
        },
    }
}

impl ResponseBody {
    /// Create an empty body.
    pub fn empty() -> Self {
        ResponseBody::Empty
    }

    /// Create a buffered body with the given data.
    pub fn full(data: impl Into<Bytes>) -> Self {
        ResponseBody::Full {
            data: Some(data.into()),
        }
    }
}

impl From<Incoming> for ResponseBody {
    fn from(body: Incoming) -> Self {
        ResponseBody::Incoming { body }
    }
}

impl Body for ResponseBody {
    type Data = Bytes;
    type Error = Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.project() {
            ResponseBodyProj::Empty => Poll::Ready(None),
            ResponseBodyProj::Full { data } => Poll::Ready(data.take().map(|d| Ok(Frame::data(d)))),
            ResponseBodyProj::Incoming { body } => body
                .poll_frame(cx)
                .map_err(|e| Error::Body(format!("failed to read response body: {}", e))),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            ResponseBody::Empty => true,
            ResponseBody::Full { data } => data.is_none(),
            ResponseBody::Incoming { body } => body.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            ResponseBody::Empty => SizeHint::with_exact(0),
            ResponseBody::Full { data } => {
                SizeHint::with_exact(data.as_ref().map_or(0, |d| d.len() as u64))
            }
            ResponseBody::Incoming { body } => body.size_hint(),
        }
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        ResponseBody::Empty
    }
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseBody::Empty => write!(f, "ResponseBody::Empty"),
            ResponseBody::Full { data } => f
                .debug_struct("ResponseBody::Full")
                .field("data_len", &data.as_ref().map(|d| d.len()))
                .finish(),
            ResponseBody::Incoming { .. } => write!(f, "ResponseBody::Incoming"),
        }
    }
}
