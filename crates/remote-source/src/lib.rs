//! # Remote Source
//!
//! Exposes files on network shares as seekable byte streams for a
//! progressive media pipeline.
//!
//! ## Core Types
//!
//! - [`DataSource`] - The open/read/close contract the pipeline drives
//! - [`RemoteFileStream`] - `DataSource` over any [`RemoteFileClient`]
//! - [`ReadOutcome`] - Bytes read, or the end-of-input marker
//! - [`SourceError`] - Unavailable resource, truncated stream, close failure
//!
//! ## Clients
//!
//! - [`WebDavClient`] - `PROPFIND` for the length, `GET` for the bytes
//! - [`HttpFileClient`] - `HEAD` for the length, `GET` for the bytes
//! - SMB shares plug in through [`ClientConnector`]
//!
//! ## Selection
//!
//! - [`RemoteFileStreamFactory`] - Builds streams sharing config and credentials
//! - [`SourceRegistry`] - Picks a factory per [`MediaSourceKind`]

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod factory;
pub mod http;
pub mod session;
pub mod source;
pub mod stream;
pub mod transfer;
pub mod webdav;

pub use client::{BoxRemoteInput, ClientConnector, RemoteFileClient, RemoteInput, ResponseBody};
pub use config::RemoteSourceConfig;
pub use credentials::{CredentialProvider, Credentials, NoCredentials};
pub use error::{ClientError, Result, SourceError};
pub use factory::{MediaSourceKind, RemoteFileStreamFactory, SourceRegistry};
pub use http::{HttpConnector, HttpFileClient};
pub use session::{InputGuard, OpenSession, RemoteFileHandle};
pub use source::{DataRequest, DataSource, DataSourceFactory, ReadOutcome};
pub use stream::RemoteFileStream;
pub use transfer::{TransferListener, TransferSnapshot, TransferStats};
pub use webdav::{WebDavClient, WebDavConnector};
