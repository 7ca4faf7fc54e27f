use std::{
    fmt,
    pin::Pin,
    task::{Context, Poll},
};

use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};
use http_body_util::{combinators::UnsyncBoxBody, BodyExt, Empty, Full};
use tower::BoxError;

/// A request or response body.
///
/// Requests carry buffered JSON in a [`Full`]; responses box whatever the transport hands back.
pub struct Body(UnsyncBoxBody<Bytes, BoxError>);

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body").finish_non_exhaustive()
    }
}

impl Body {
    /// Create an empty body
    pub fn empty() -> Self {
        Self::wrap_body(Empty::<Bytes>::new())
    }

    pub(crate) fn wrap_body<B>(body: B) -> Self
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Body(body.map_err(Into::into).boxed_unsync())
    }

    /// Read the whole body into memory.
    pub async fn collect_bytes(self) -> Result<Bytes, crate::Error> {
        Ok(self.collect().await?.to_bytes())
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::wrap_body(Full::new(bytes))
    }
}

impl From<Vec<u8>> for Body {
    fn from(json: Vec<u8>) -> Self {
        Self::from(Bytes::from(json))
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Self::from(Bytes::from_static(text.as_bytes()))
    }
}

impl HttpBody for Body {
    type Data = Bytes;
    type Error = crate::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Pin::new(&mut self.0).poll_frame(cx).map_err(crate::Error::Service)
    }

    fn size_hint(&self) -> SizeHint {
        self.0.size_hint()
    }

    fn is_end_stream(&self) -> bool {
        self.0.is_end_stream()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn buffered_and_wrapped_bodies_collect() {
        let json = Body::from(b"{\"code\":0}".to_vec());
        assert_eq!(json.size_hint().exact(), Some(10));
        assert_eq!(json.collect_bytes().await.unwrap(), "{\"code\":0}");

        let wrapped = Body::wrap_body(Full::new(Bytes::from_static(b"[]")));
        assert_eq!(wrapped.collect_bytes().await.unwrap(), "[]");

        let empty = Body::empty();
        assert!(empty.is_end_stream());
        assert!(empty.collect_bytes().await.unwrap().is_empty());
    }
}
