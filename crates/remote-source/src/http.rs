//! Plain HTTP(S) file client, used for media servers such as Immich that
//! serve originals over regular GET requests.

use async_trait::async_trait;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, RequestBuilder};
use tracing::{debug, instrument};
use url::Url;

use crate::client::{BoxRemoteInput, ClientConnector, RemoteFileClient, ResponseBody};
use crate::config::RemoteSourceConfig;
use crate::credentials::Credentials;
use crate::error::ClientError;

pub struct HttpFileClient {
    http: Client,
    credentials: Option<Credentials>,
}

impl HttpFileClient {
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
impl RemoteFileClient for HttpFileClient {
    fn set_credentials(&mut self, credentials: &Credentials) {
        self.credentials = Some(credentials.clone());
    }

    #[instrument(skip(self), fields(uri = %uri), level = "debug")]
    async fn content_length(&self, uri: &Url) -> Result<Option<u64>, ClientError> {
        let response = self.authorize(self.http.head(uri.clone())).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::http_status(
                response.status(),
                uri.as_str(),
                "HEAD",
            ));
        }

        // `Response::content_length` reports the (empty) HEAD body, not the header.
        let length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        debug!(?length, "HEAD complete");
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

#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

impl ClientConnector for HttpConnector {
    fn connect(
        &self,
        config: &RemoteSourceConfig,
    ) -> Result<Box<dyn RemoteFileClient>, ClientError> {
        Ok(Box::new(HttpFileClient::new(config)?))
    }
}
