use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::ClientError;

pub const DEFAULT_USER_AGENT: &str = concat!("remote-source/", env!("CARGO_PKG_VERSION"));

/// Header carrying an Immich API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Network settings for the client a [`RemoteFileStream`](crate::RemoteFileStream) builds.
///
/// The defaults are the short-timeout profile used for LAN file servers:
/// a stalled server should fail the read quickly so the player can move on
/// to the next asset.
#[derive(Debug, Clone)]
pub struct RemoteSourceConfig {
    /// Connection timeout (time to establish the initial connection)
    pub connect_timeout: Duration,

    /// Read timeout (maximum time between receiving data chunks)
    pub read_timeout: Duration,

    /// Write timeout (maximum time for sending request data).
    ///
    /// Note: `reqwest` does not expose a dedicated write-timeout setting on the
    /// `ClientBuilder`; custom connectors may honour it.
    pub write_timeout: Duration,

    /// Whether to follow redirects, including cross-protocol ones
    pub follow_redirects: bool,

    /// User agent string
    pub user_agent: String,

    /// Extra headers sent with every request
    pub headers: HeaderMap,

    pub danger_accept_invalid_certs: bool,
}

impl Default for RemoteSourceConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            read_timeout: Duration::from_secs(3),
            write_timeout: Duration::from_secs(3),
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: HeaderMap::new(),
            danger_accept_invalid_certs: false,
        }
    }
}

impl RemoteSourceConfig {
    /// Profile for media servers reached over the internet (30s timeouts).
    pub fn long_haul() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            ..Self::default()
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, ClientError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ClientError::configuration(format!("invalid header name `{name}`: {e}")))?;
        let mut value = HeaderValue::from_str(value)
            .map_err(|e| ClientError::configuration(format!("invalid value for `{name}`: {e}")))?;
        value.set_sensitive(true);
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Skip TLS certificate validation (self-signed home servers).
    pub fn with_invalid_certs_accepted(mut self, accept: bool) -> Self {
        self.danger_accept_invalid_certs = accept;
        self
    }

    /// Upper bound for a single metadata or stream-open request.
    pub fn request_timeout(&self) -> Duration {
        self.connect_timeout + self.read_timeout
    }

    /// Build the `reqwest` client described by this configuration.
    pub fn build_http_client(&self) -> Result<reqwest::Client, ClientError> {
        let redirect = if self.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        };

        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .read_timeout(self.read_timeout)
            .user_agent(self.user_agent.clone())
            .default_headers(self.headers.clone())
            .redirect(redirect)
            .danger_accept_invalid_certs(self.danger_accept_invalid_certs)
            .build()
            .map_err(|e| ClientError::configuration(format!("failed to build HTTP client: {e}")))
    }
}
