//! Shared fixtures: an in-memory file server behind the client traits.

#![allow(dead_code)]

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use remote_source::{
    BoxRemoteInput, ClientConnector, ClientError, Credentials, RemoteFileClient, RemoteInput,
    RemoteSourceConfig,
};
use tokio::io::{AsyncRead, ReadBuf};
use url::Url;

/// Initialize tracing for tests with appropriate settings
#[inline]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn video_url() -> Url {
    Url::parse("http://nas.local/dav/videos/beach.mp4").unwrap()
}

pub fn sample_bytes(len: usize) -> Bytes {
    (0..len).map(|i| (i % 251) as u8).collect::<Vec<_>>().into()
}

/// How the stream handed out by [`MemoryServer`] behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputBehavior {
    /// Deliver the data, at most `chunk` bytes per read.
    Chunked,
    /// Fail with `ConnectionReset` once `n` bytes were delivered.
    ResetAfter(usize),
    /// Never produce data.
    Stall,
    /// Deliver normally but fail on close.
    FailOnClose,
}

#[derive(Debug, Clone)]
pub struct MemoryServer {
    pub data: Bytes,
    pub reported_length: Option<u64>,
    pub fail_metadata: bool,
    pub fail_stream: bool,
    pub chunk: usize,
    pub behavior: InputBehavior,
    pub connects: Arc<AtomicUsize>,
    pub stream_closes: Arc<AtomicUsize>,
    pub credentials_seen: Arc<Mutex<Vec<Credentials>>>,
}

impl MemoryServer {
    pub fn new(data: Bytes) -> Self {
        let reported_length = Some(data.len() as u64);
        Self {
            data,
            reported_length,
            fail_metadata: false,
            fail_stream: false,
            chunk: 1000,
            behavior: InputBehavior::Chunked,
            connects: Arc::new(AtomicUsize::new(0)),
            stream_closes: Arc::new(AtomicUsize::new(0)),
            credentials_seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_reported_length(mut self, length: Option<u64>) -> Self {
        self.reported_length = length;
        self
    }

    pub fn with_chunk(mut self, chunk: usize) -> Self {
        self.chunk = chunk;
        self
    }

    pub fn with_behavior(mut self, behavior: InputBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn failing_metadata(mut self) -> Self {
        self.fail_metadata = true;
        self
    }

    pub fn failing_stream(mut self) -> Self {
        self.fail_stream = true;
        self
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.stream_closes.load(Ordering::SeqCst)
    }
}

impl ClientConnector for MemoryServer {
    fn connect(
        &self,
        _config: &RemoteSourceConfig,
    ) -> Result<Box<dyn RemoteFileClient>, ClientError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryClient {
            server: self.clone(),
        }))
    }
}

pub struct MemoryClient {
    server: MemoryServer,
}

#[async_trait]
impl RemoteFileClient for MemoryClient {
    fn set_credentials(&mut self, credentials: &Credentials) {
        self.server
            .credentials_seen
            .lock()
            .unwrap()
            .push(credentials.clone());
    }

    async fn content_length(&self, uri: &Url) -> Result<Option<u64>, ClientError> {
        if self.server.fail_metadata {
            return Err(ClientError::Unauthorized {
                url: uri.to_string(),
            });
        }
        Ok(self.server.reported_length)
    }

    async fn get_stream(&self, uri: &Url) -> Result<BoxRemoteInput, ClientError> {
        if self.server.fail_stream {
            return Err(ClientError::NotFound {
                url: uri.to_string(),
            });
        }
        Ok(Box::new(MemoryInput {
            data: self.server.data.clone(),
            pos: 0,
            chunk: self.server.chunk,
            behavior: self.server.behavior,
            closes: self.server.stream_closes.clone(),
        }))
    }
}

pub struct MemoryInput {
    data: Bytes,
    pos: usize,
    chunk: usize,
    behavior: InputBehavior,
    closes: Arc<AtomicUsize>,
}

impl AsyncRead for MemoryInput {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.behavior {
            InputBehavior::Stall => return Poll::Pending,
            InputBehavior::ResetAfter(limit) if self.pos >= limit => {
                return Poll::Ready(Err(io::Error::from(io::ErrorKind::ConnectionReset)));
            }
            _ => {}
        }

        let mut end = self.data.len().min(self.pos + self.chunk);
        if let InputBehavior::ResetAfter(limit) = self.behavior {
            end = end.min(limit);
        }
        let n = (end - self.pos).min(buf.remaining());
        let start = self.pos;
        buf.put_slice(&self.data[start..start + n]);
        self.pos += n;
        Poll::Ready(Ok(()))
    }
}

impl RemoteInput for MemoryInput {
    fn close(self: Box<Self>) -> io::Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.behavior == InputBehavior::FailOnClose {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        } else {
            Ok(())
        }
    }
}
