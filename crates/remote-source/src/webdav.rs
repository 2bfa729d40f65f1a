//! WebDAV client backed by `reqwest`.
//!
//! The resource length comes from a depth-0 `PROPFIND` asking for
//! `getcontentlength`; the bytes come from a plain `GET`. Credentials are
//! sent preemptively as HTTP basic auth.

use std::sync::LazyLock;

use async_trait::async_trait;
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use crate::client::{BoxRemoteInput, ClientConnector, RemoteFileClient, ResponseBody};
use crate::config::RemoteSourceConfig;
use crate::credentials::Credentials;
use crate::error::ClientError;

const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:"><d:prop><d:getcontentlength/></d:prop></d:propfind>"#;

static PROPFIND: LazyLock<Method> = LazyLock::new(|| {
    Method::from_bytes(b"PROPFIND").expect("PROPFIND is a valid method token")
});

pub struct WebDavClient {
    http: Client,
    credentials: Option<Credentials>,
}

impl WebDavClient {
    pub fn new(config: &RemoteSourceConfig) -> Result<Self, ClientError> {
        Ok(Self {
            http: config.build_http_client()?,
            credentials: None,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(creds) if !creds.is_anonymous() => {
                request.basic_auth(&creds.username, Some(&creds.password))
            }
            _ => request,
        }
    }
}

#[async_trait]
impl RemoteFileClient for WebDavClient {
    fn set_credentials(&mut self, credentials: &Credentials) {
        self.credentials = Some(credentials.clone());
    }

    #[instrument(skip(self), fields(uri = %uri), level = "debug")]
    async fn content_length(&self, uri: &Url) -> Result<Option<u64>, ClientError> {
        let request = self
            .http
            .request(PROPFIND.clone(), uri.clone())
            .header("Depth", "0")
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/xml; charset=utf-8"),
            )
            .body(PROPFIND_BODY);
        let response = self.authorize(request).send().await?;

        let status = response.status();
        if !(status.is_success() || status == StatusCode::MULTI_STATUS) {
            return Err(ClientError::http_status(status, uri.as_str(), "PROPFIND"));
        }

        let body = response.text().await?;
        let length = parse_content_length(&body)?;
        debug!(?length, "PROPFIND complete");
        Ok(length)
    }

    #[instrument(skip(self), fields(uri = %uri), level = "debug")]
    async fn get_stream(&self, uri: &Url) -> Result<BoxRemoteInput, ClientError> {
        let response = self.authorize(self.http.get(uri.clone())).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::http_status(
                response.status(),
                uri.as_str(),
                "GET",
            ));
        }
        Ok(Box::new(ResponseBody::new(response)))
    }
}

/// Extract the first `getcontentlength` value from a multistatus document.
///
/// Namespace prefixes differ between servers (`d:`, `D:`, `lp1:`), so only
/// the local name is matched. A missing or empty element means the length
/// is unknown.
pub fn parse_content_length(body: &str) -> Result<Option<u64>, ClientError> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut in_length = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"getcontentlength" => {
                in_length = true;
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"getcontentlength" => {
                in_length = false;
            }
            Ok(Event::Text(text)) if in_length => {
                let value = text
                    .unescape()
                    .map_err(|e| ClientError::invalid_response(format!("bad PROPFIND text: {e}")))?;
                return Ok(value.trim().parse::<u64>().ok());
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => {
                return Err(ClientError::invalid_response(format!(
                    "malformed PROPFIND response at {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
    }
}

/// Builds a [`WebDavClient`] per stream session.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebDavConnector;

impl ClientConnector for WebDavConnector {
    fn connect(
        &self,
        config: &RemoteSourceConfig,
    ) -> Result<Box<dyn RemoteFileClient>, ClientError> {
        Ok(Box::new(WebDavClient::new(config)?))
    }
}
