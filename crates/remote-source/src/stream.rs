//! # Remote file stream
//!
//! Adapts a [`RemoteFileClient`] into a [`DataSource`]. The stream lazily
//! builds one client on the first `open`, issues a metadata query for the
//! resource length, opens a stream over the whole resource and skips to the
//! requested offset. `close` drops the input and the cached client, so the
//! next `open` starts from a fresh connection.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, instrument, trace, warn};
use url::Url;

use crate::client::{BoxRemoteInput, ClientConnector, RemoteFileClient};
use crate::config::RemoteSourceConfig;
use crate::credentials::CredentialProvider;
use crate::error::{ClientError, Result, SourceError};
use crate::session::{OpenSession, RemoteFileHandle};
use crate::source::{DataRequest, DataSource, ReadOutcome};
use crate::transfer::TransferListener;

pub struct RemoteFileStream {
    connector: Arc<dyn ClientConnector>,
    credentials: Arc<dyn CredentialProvider>,
    config: RemoteSourceConfig,
    listener: Option<Arc<dyn TransferListener>>,
    client: Option<Box<dyn RemoteFileClient>>,
    session: Option<OpenSession>,
    uri: Option<Url>,
}

impl RemoteFileStream {
    pub fn new(
        connector: Arc<dyn ClientConnector>,
        credentials: Arc<dyn CredentialProvider>,
        config: RemoteSourceConfig,
    ) -> Self {
        Self {
            connector,
            credentials,
            config,
            listener: None,
            client: None,
            session: None,
            uri: None,
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn TransferListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn config(&self) -> &RemoteSourceConfig {
        &self.config
    }

    /// Handle of the open session, if any.
    pub fn handle(&self) -> Option<&RemoteFileHandle> {
        self.session.as_ref().map(OpenSession::handle)
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Whether a client is cached from a previous `open`.
    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    fn client(&mut self) -> std::result::Result<&dyn RemoteFileClient, ClientError> {
        if self.client.is_none() {
            debug!(
                connect_timeout = ?self.config.connect_timeout,
                read_timeout = ?self.config.read_timeout,
                "Building remote file client"
            );
            let mut client = self.connector.connect(&self.config)?;
            if let Some(credentials) = self.credentials.credentials() {
                client.set_credentials(&credentials);
            }
            self.client = Some(client);
        }

        match self.client.as_deref() {
            Some(client) => Ok(client),
            None => Err(ClientError::configuration("remote file client unavailable")),
        }
    }

    async fn open_session(&mut self, request: &DataRequest) -> Result<OpenSession> {
        let uri = request.uri.clone();
        let request_timeout = self.config.request_timeout();
        let client = self
            .client()
            .map_err(|e| SourceError::unavailable(uri.as_str(), e))?;

        let total_length = bounded(request_timeout, "metadata query", client.content_length(&uri))
            .await
            .map_err(|e| SourceError::unavailable(uri.as_str(), e))?;

        match total_length {
            Some(length) => debug!(uri = %uri, length, "Resource length reported"),
            None => debug!(uri = %uri, "Resource length unknown"),
        }

        if let Some(length) = total_length
            && request.position > length
        {
            warn!(
                uri = %uri,
                requested = request.position,
                length,
                "Requested offset is past the reported length"
            );
            return Err(SourceError::truncated(
                uri.as_str(),
                length,
                Some(length),
                None,
            ));
        }

        let input = bounded(request_timeout, "stream request", client.get_stream(&uri))
            .await
            .map_err(|e| SourceError::unavailable(uri.as_str(), e))?;

        // From here on the guard releases the input on every early return.
        let mut session = OpenSession::new(
            RemoteFileHandle::new(uri.clone(), total_length, request.position),
            input,
        );

        if request.position > 0 {
            let input = session.input.get_mut().ok_or(SourceError::NotOpen)?;
            let skipped = skip_bytes(input, request.position, self.config.read_timeout)
                .await
                .map_err(|e| SourceError::truncated(uri.as_str(), 0, total_length, Some(e)))?;

            if skipped < request.position {
                warn!(
                    uri = %uri,
                    requested = request.position,
                    skipped,
                    "Stream ended before the requested offset"
                );
                return Err(SourceError::truncated(
                    uri.as_str(),
                    skipped,
                    total_length,
                    None,
                ));
            }
        }

        Ok(session)
    }
}

const SKIP_BUFFER_SIZE: usize = 64 * 1024;

/// Discard up to `count` bytes, applying `read_timeout` to each underlying read.
///
/// Returns fewer than `count` only when the stream ended early.
async fn skip_bytes(
    input: &mut BoxRemoteInput,
    count: u64,
    read_timeout: Duration,
) -> io::Result<u64> {
    let mut scratch = vec![0u8; SKIP_BUFFER_SIZE.min(usize::try_from(count).unwrap_or(usize::MAX))];
    let mut skipped = 0u64;
    while skipped < count {
        let want = usize::try_from(count - skipped)
            .unwrap_or(usize::MAX)
            .min(scratch.len());
        let n = tokio::time::timeout(read_timeout, input.read(&mut scratch[..want]))
            .await
            .map_err(|_| io::Error::from(io::ErrorKind::TimedOut))??;
        if n == 0 {
            break;
        }
        skipped += n as u64;
    }
    Ok(skipped)
}

async fn bounded<T>(
    limit: Duration,
    operation: &'static str,
    fut: impl Future<Output = std::result::Result<T, ClientError>>,
) -> std::result::Result<T, ClientError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| ClientError::Timeout { operation })?
}

#[async_trait]
impl DataSource for RemoteFileStream {
    #[instrument(skip(self), fields(uri = %request.uri, position = request.position), level = "debug")]
    async fn open(&mut self, request: &DataRequest) -> Result<Option<u64>> {
        if let Some(session) = &self.session {
            return Err(SourceError::AlreadyOpen {
                uri: session.handle().uri().to_string(),
            });
        }

        info!(uri = %request.uri, position = request.position, "Opening remote file");
        self.uri = Some(request.uri.clone());
        if let Some(listener) = &self.listener {
            listener.on_transfer_initializing(&request.uri);
        }

        let session = self.open_session(request).await?;
        let total_length = session.handle().total_length();
        self.session = Some(session);

        if let Some(listener) = &self.listener {
            listener.on_transfer_start(&request.uri);
        }
        Ok(total_length)
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        let session = self.session.as_mut().ok_or(SourceError::NotOpen)?;
        trace!(requested = buf.len(), "Reading remote file");

        if buf.is_empty() {
            return Ok(ReadOutcome::Read(0));
        }

        let mut len = buf.len();
        if let Some(remaining) = session.handle.remaining() {
            if remaining == 0 {
                return Ok(ReadOutcome::EndOfInput);
            }
            len = len.min(usize::try_from(remaining).unwrap_or(usize::MAX));
        }

        let handle = &session.handle;
        let input = session.input.get_mut().ok_or(SourceError::NotOpen)?;
        let read = match tokio::time::timeout(self.config.read_timeout, input.read(&mut buf[..len]))
            .await
        {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                warn!(uri = %handle.uri(), delivered = handle.cursor(), error = %e, "Remote read failed");
                return Err(SourceError::truncated(
                    handle.uri().as_str(),
                    handle.cursor(),
                    handle.total_length(),
                    Some(e),
                ));
            }
            Err(_) => {
                warn!(uri = %handle.uri(), delivered = handle.cursor(), "Remote read timed out");
                return Err(SourceError::truncated(
                    handle.uri().as_str(),
                    handle.cursor(),
                    handle.total_length(),
                    Some(io::Error::from(io::ErrorKind::TimedOut)),
                ));
            }
        };

        if read == 0 {
            if handle.total_length().is_some() {
                warn!(
                    uri = %handle.uri(),
                    delivered = handle.cursor(),
                    expected = ?handle.total_length(),
                    "Server closed the stream early"
                );
                return Err(SourceError::truncated(
                    handle.uri().as_str(),
                    handle.cursor(),
                    handle.total_length(),
                    None,
                ));
            }
            return Ok(ReadOutcome::EndOfInput);
        }

        session.handle.advance(read as u64);
        if let Some(listener) = &self.listener {
            listener.on_bytes_transferred(session.handle.uri(), read as u64);
        }
        Ok(ReadOutcome::Read(read))
    }

    fn close(&mut self) -> Result<()> {
        let session = self.session.take();
        self.client = None;

        let Some(mut session) = session else {
            return Ok(());
        };

        debug!(uri = %session.handle().uri(), delivered = session.handle().cursor(), "Closing remote file");
        let released = session.release();
        if let Some(listener) = &self.listener {
            listener.on_transfer_end(session.handle().uri());
        }

        released.map_err(|source| SourceError::Close {
            uri: session.handle().uri().to_string(),
            source,
        })
    }

    fn uri(&self) -> Option<&Url> {
        self.uri.as_ref()
    }
}

impl Drop for RemoteFileStream {
    fn drop(&mut self) {
        if self.session.is_some()
            && let Err(e) = DataSource::close(self)
        {
            warn!(error = %e, "Failed to close remote file on drop");
        }
    }
}
