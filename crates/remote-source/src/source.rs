//! Media pipeline boundary.

use async_trait::async_trait;
use url::Url;

use crate::error::Result;

/// What the pipeline asks a data source to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRequest {
    pub uri: Url,
    /// Absolute byte offset the first `read` should return.
    pub position: u64,
}

impl DataRequest {
    pub fn new(uri: Url) -> Self {
        Self { uri, position: 0 }
    }

    pub fn at(uri: Url, position: u64) -> Self {
        Self { uri, position }
    }
}

/// Result of a single [`DataSource::read`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` bytes were written to the front of the buffer.
    Read(usize),
    /// The resource is exhausted.
    EndOfInput,
}

impl ReadOutcome {
    pub fn bytes(self) -> usize {
        match self {
            Self::Read(n) => n,
            Self::EndOfInput => 0,
        }
    }

    pub fn is_end_of_input(self) -> bool {
        matches!(self, Self::EndOfInput)
    }
}

/// A progressive media source reads from this.
///
/// One instance serves one sequential open/read/close lifecycle at a time.
#[async_trait]
pub trait DataSource: Send {
    /// Open the resource and position it at `request.position`.
    ///
    /// Returns the total length of the resource, or `None` when unknown.
    async fn open(&mut self, request: &DataRequest) -> Result<Option<u64>>;

    /// Read up to `buf.len()` bytes.
    async fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome>;

    /// Release the open resource. Calling it again, or before `open`, is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Uri of the most recently opened resource.
    fn uri(&self) -> Option<&Url>;
}

/// Creates a fresh [`DataSource`] for every load the pipeline starts.
pub trait DataSourceFactory: Send + Sync {
    fn create_data_source(&self) -> Box<dyn DataSource>;
}
