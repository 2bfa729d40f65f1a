//! Data source selection per media source kind.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::ClientConnector;
use crate::config::{API_KEY_HEADER, RemoteSourceConfig};
use crate::credentials::{CredentialProvider, NoCredentials};
use crate::error::{ClientError, Result, SourceError};
use crate::http::HttpConnector;
use crate::source::{DataSource, DataSourceFactory};
use crate::stream::RemoteFileStream;
use crate::transfer::TransferListener;
use crate::webdav::WebDavConnector;

/// Where an asset's bytes come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSourceKind {
    #[serde(rename = "webdav")]
    WebDav,
    Samba,
    Immich,
    /// Device storage or any uri the pipeline's default reader handles.
    Local,
}

impl fmt::Display for MediaSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::WebDav => "webdav",
            Self::Samba => "samba",
            Self::Immich => "immich",
            Self::Local => "local",
        };
        f.write_str(name)
    }
}

/// Creates [`RemoteFileStream`]s sharing one connector, credentials and config.
#[derive(Clone)]
pub struct RemoteFileStreamFactory {
    connector: Arc<dyn ClientConnector>,
    credentials: Arc<dyn CredentialProvider>,
    config: RemoteSourceConfig,
    listener: Option<Arc<dyn TransferListener>>,
}

impl RemoteFileStreamFactory {
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
        }
    }

    /// WebDAV share with the short-timeout profile.
    pub fn webdav(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self::new(
            Arc::new(WebDavConnector),
            credentials,
            RemoteSourceConfig::default(),
        )
    }

    /// Immich server: long timeouts, optional API key, optional TLS validation.
    pub fn immich(api_key: Option<&str>, validate_ssl: bool) -> std::result::Result<Self, ClientError> {
        let mut config = RemoteSourceConfig::long_haul().with_invalid_certs_accepted(!validate_ssl);
        if let Some(key) = api_key {
            config = config.with_header(API_KEY_HEADER, key)?;
        }
        Ok(Self::new(Arc::new(HttpConnector), Arc::new(NoCredentials), config))
    }

    pub fn with_listener(mut self, listener: Arc<dyn TransferListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn config(&self) -> &RemoteSourceConfig {
        &self.config
    }

    pub fn create_stream(&self) -> RemoteFileStream {
        let stream = RemoteFileStream::new(
            self.connector.clone(),
            self.credentials.clone(),
            self.config.clone(),
        );
        match &self.listener {
            Some(listener) => stream.with_listener(listener.clone()),
            None => stream,
        }
    }
}

impl DataSourceFactory for RemoteFileStreamFactory {
    fn create_data_source(&self) -> Box<dyn DataSource> {
        Box::new(self.create_stream())
    }
}

/// Maps media source kinds to data source factories.
///
/// `Local` is never registered: the pipeline reads those uris itself.
#[derive(Default, Clone)]
pub struct SourceRegistry {
    factories: HashMap<MediaSourceKind, Arc<dyn DataSourceFactory>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: MediaSourceKind, factory: Arc<dyn DataSourceFactory>) {
        debug!(%kind, "Registering data source factory");
        self.factories.insert(kind, factory);
    }

    pub fn with(mut self, kind: MediaSourceKind, factory: Arc<dyn DataSourceFactory>) -> Self {
        self.register(kind, factory);
        self
    }

    /// Whether `kind` is served by a registered remote data source.
    pub fn is_remote(&self, kind: MediaSourceKind) -> bool {
        self.factories.contains_key(&kind)
    }

    pub fn factory(&self, kind: MediaSourceKind) -> Result<Arc<dyn DataSourceFactory>> {
        self.factories
            .get(&kind)
            .cloned()
            .ok_or_else(|| SourceError::UnsupportedSource {
                kind: kind.to_string(),
            })
    }

    pub fn create_data_source(&self, kind: MediaSourceKind) -> Result<Box<dyn DataSource>> {
        Ok(self.factory(kind)?.create_data_source())
    }
}
