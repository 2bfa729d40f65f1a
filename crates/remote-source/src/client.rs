//! Network protocol boundary.
//!
//! A [`RemoteFileClient`] knows how to ask a file server for the length of a
//! resource and how to open a byte stream over it. Metadata and stream
//! retrieval are separate calls, and credentials are set once on a freshly
//! built client before its first request.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::io::StreamReader;
use url::Url;

use crate::config::RemoteSourceConfig;
use crate::credentials::Credentials;
use crate::error::ClientError;

/// An open byte stream over a remote resource.
pub trait RemoteInput: AsyncRead + Send + Unpin {
    /// Release the underlying connection.
    ///
    /// Dropping the input also releases it; `close` exists so that
    /// transports with an explicit shutdown can report failures.
    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

pub type BoxRemoteInput = Box<dyn RemoteInput>;

/// Client for one file-server protocol (WebDAV, SMB, plain HTTP).
#[async_trait]
pub trait RemoteFileClient: Send + Sync {
    /// Set the credentials used by every later request.
    fn set_credentials(&mut self, credentials: &Credentials);

    /// Byte length of the resource, `None` when the server does not report one.
    async fn content_length(&self, uri: &Url) -> Result<Option<u64>, ClientError>;

    /// Open a stream over the whole resource, starting at byte zero.
    async fn get_stream(&self, uri: &Url) -> Result<BoxRemoteInput, ClientError>;
}

/// Builds protocol clients.
///
/// A [`RemoteFileStream`](crate::RemoteFileStream) calls this on its first
/// `open` and again after every `close`.
pub trait ClientConnector: Send + Sync {
    fn connect(&self, config: &RemoteSourceConfig)
    -> Result<Box<dyn RemoteFileClient>, ClientError>;
}

/// Body of a streaming HTTP response exposed as [`AsyncRead`].
pub struct ResponseBody {
    reader: StreamReader<BoxStream<'static, io::Result<Bytes>>, Bytes>,
}

impl ResponseBody {
    pub fn new(response: reqwest::Response) -> Self {
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(io::Error::other))
            .boxed();
        Self {
            reader: StreamReader::new(stream),
        }
    }
}

impl AsyncRead for ResponseBody {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.reader).poll_read(cx, buf)
    }
}

impl RemoteInput for ResponseBody {}
