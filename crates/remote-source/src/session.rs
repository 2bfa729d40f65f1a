//! State of one open/read/close lifecycle.

use std::io;

use tracing::warn;
use url::Url;

use crate::client::BoxRemoteInput;

/// Position bookkeeping for an open remote resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileHandle {
    uri: Url,
    total_length: Option<u64>,
    cursor: u64,
}

impl RemoteFileHandle {
    pub fn new(uri: Url, total_length: Option<u64>, start: u64) -> Self {
        Self {
            uri,
            total_length,
            cursor: start,
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// `None` while the server has not reported a length.
    pub fn total_length(&self) -> Option<u64> {
        self.total_length
    }

    /// Absolute offset of the next byte handed to the consumer.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Bytes left before the known end, `None` when the length is unknown.
    pub fn remaining(&self) -> Option<u64> {
        self.total_length
            .map(|total| total.saturating_sub(self.cursor))
    }

    pub(crate) fn advance(&mut self, n: u64) {
        self.cursor += n;
        debug_assert!(
            self.total_length.is_none_or(|total| self.cursor <= total),
            "cursor moved past the end of the resource"
        );
    }
}

/// Owns the input stream and releases it exactly once.
///
/// [`InputGuard::release`] reports transport errors; if the guard is dropped
/// without an explicit release (error path, task cancellation) the input is
/// released in `Drop` and any error is only logged.
pub struct InputGuard {
    input: Option<BoxRemoteInput>,
}

impl InputGuard {
    pub fn new(input: BoxRemoteInput) -> Self {
        Self { input: Some(input) }
    }

    pub fn get_mut(&mut self) -> Option<&mut BoxRemoteInput> {
        self.input.as_mut()
    }

    pub fn is_released(&self) -> bool {
        self.input.is_none()
    }

    pub fn release(&mut self) -> io::Result<()> {
        match self.input.take() {
            Some(input) => input.close(),
            None => Ok(()),
        }
    }
}

impl Drop for InputGuard {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(error = %e, "Failed to release remote input");
        }
    }
}

/// One network connection's worth of state: the handle plus its input.
pub struct OpenSession {
    pub(crate) handle: RemoteFileHandle,
    pub(crate) input: InputGuard,
}

impl OpenSession {
    pub fn new(handle: RemoteFileHandle, input: BoxRemoteInput) -> Self {
        Self {
            handle,
            input: InputGuard::new(input),
        }
    }

    pub fn handle(&self) -> &RemoteFileHandle {
        &self.handle
    }

    /// Release the input. Safe to call more than once.
    pub fn release(&mut self) -> io::Result<()> {
        self.input.release()
    }
}
