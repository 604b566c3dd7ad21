//! HTTP transport used by the client.
//!
//! The client never talks to `reqwest` directly; it goes through the
//! [`Transport`] trait so the request/response handling can be driven by a
//! fake transport serving staged byte chunks.

use std::io;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use reqwest::Url;

use crate::error::Result;

/// Response body as a stream of byte chunks.
pub type BodyStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Status line and body of an HTTP response whose headers have arrived.
///
/// The body has not been read yet; dropping the response releases the
/// underlying connection.
pub struct RawResponse {
    status: u16,
    body: BodyStream,
}

impl RawResponse {
    /// Wrap a status code and an unread body.
    pub fn new(status: u16, body: BodyStream) -> Self {
        Self { status, body }
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// True for status codes of 400 and above.
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    /// Take the unread body stream.
    pub fn into_body(self) -> BodyStream {
        self.body
    }

    /// Read the whole body into memory.
    pub async fn bytes(self) -> Result<Vec<u8>> {
        let mut body = self.body;
        let mut out = Vec::new();
        while let Some(chunk) = body.next().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }

    /// Read the whole body as text, replacing invalid UTF-8.
    pub async fn text(self) -> Result<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl std::fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Something that can issue an HTTP GET.
///
/// Implementations return as soon as the response headers are available and
/// must not read the body.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET request for `url`.
    async fn get(&self, url: Url) -> Result<RawResponse>;
}

/// [`Transport`] backed by a `reqwest::Client`.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Transport with a default `reqwest::Client`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport with a custom reqwest client (timeouts, proxies, TLS, ...).
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: Url) -> Result<RawResponse> {
        let response = self.http.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes_stream().map_err(io::Error::other).boxed();
        Ok(RawResponse::new(status, body))
    }
}
