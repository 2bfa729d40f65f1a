use reqwest::StatusCode;

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, SourceError>;

/// Errors raised by a [`RemoteFileClient`](crate::RemoteFileClient) while
/// talking to the file server.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("request failed with HTTP {status} during {operation} for {url}")]
    HttpStatus {
        status: StatusCode,
        url: String,
        operation: &'static str,
    },

    #[error("server rejected credentials for {url}")]
    Unauthorized { url: String },

    #[error("resource not found: {url}")]
    NotFound { url: String },

    #[error("invalid response from server: {reason}")]
    InvalidResponse { reason: String },

    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("configuration error: {reason}")]
    Configuration { reason: String },
}

impl ClientError {
    pub fn http_status(
        status: StatusCode,
        url: impl Into<String>,
        operation: &'static str,
    ) -> Self {
        let url = url.into();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized { url },
            StatusCode::NOT_FOUND | StatusCode::GONE => Self::NotFound { url },
            _ => Self::HttpStatus {
                status,
                url,
                operation,
            },
        }
    }

    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Whether a caller-side retry has a chance of succeeding.
    ///
    /// Nothing in this crate retries; the classification is for the media
    /// pipeline's own load-error policy.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unauthorized { .. }
            | Self::NotFound { .. }
            | Self::InvalidResponse { .. }
            | Self::Configuration { .. } => false,
            Self::HttpStatus { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::Network { source } => {
                source.is_connect() || source.is_timeout() || source.is_request() || source.is_body()
            }
            Self::Timeout { .. } | Self::Io { .. } => true,
        }
    }
}

/// Errors surfaced by a [`DataSource`](crate::DataSource).
///
/// Reaching the end of the resource is not an error; see
/// [`ReadOutcome::EndOfInput`](crate::ReadOutcome::EndOfInput).
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Metadata or stream retrieval failed while opening.
    #[error("resource unavailable: {uri}: {source}")]
    ResourceUnavailable {
        uri: String,
        #[source]
        source: ClientError,
    },

    /// The server delivered fewer bytes than required.
    #[error("truncated stream for {uri}: {delivered} of {} bytes delivered", .expected.map_or_else(|| "unknown".to_string(), |n| n.to_string()))]
    TruncatedStream {
        uri: String,
        delivered: u64,
        expected: Option<u64>,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Releasing the input stream failed. Internal state is already reset.
    #[error("failed to close {uri}: {source}")]
    Close {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    #[error("data source is not open")]
    NotOpen,

    #[error("data source is already open for {uri}")]
    AlreadyOpen { uri: String },

    #[error("no data source registered for `{kind}`")]
    UnsupportedSource { kind: String },
}

impl SourceError {
    pub fn unavailable(uri: impl Into<String>, source: ClientError) -> Self {
        Self::ResourceUnavailable {
            uri: uri.into(),
            source,
        }
    }

    pub fn truncated(
        uri: impl Into<String>,
        delivered: u64,
        expected: Option<u64>,
        source: Option<std::io::Error>,
    ) -> Self {
        Self::TruncatedStream {
            uri: uri.into(),
            delivered,
            expected,
            source,
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::TruncatedStream { .. })
    }
}

impl From<SourceError> for std::io::Error {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::TruncatedStream { .. } => {
                std::io::Error::new(std::io::ErrorKind::UnexpectedEof, err)
            }
            SourceError::ResourceUnavailable { .. } => {
                std::io::Error::new(std::io::ErrorKind::NotConnected, err)
            }
            other => std::io::Error::other(other),
        }
    }
}
