use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;
use url::Url;

use crate::error::StanzaError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: Url,
    pub accept: &'static str,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, StanzaError>;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, StanzaError> {
        Self::with_user_agent(&default_user_agent())
    }

    pub fn with_user_agent(user_agent: &str) -> Result<Self, StanzaError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|err| StanzaError::Transport(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| StanzaError::Transport(err.to_string()))?;
        Ok(Self { client })
    }

    async fn handle_status(response: reqwest::Response) -> Result<reqwest::Response, StanzaError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "request failed".to_string());
        Err(StanzaError::Status { status, message })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, StanzaError> {
        debug!(url = %request.url, accept = request.accept, "sending request");
        let response = self
            .client
            .get(request.url.clone())
            .header(ACCEPT, request.accept)
            .send()
            .await
            .map_err(|err| StanzaError::Transport(err.to_string()))?;
        let response = Self::handle_status(response).await?;
        response
            .text()
            .await
            .map_err(|err| StanzaError::Transport(err.to_string()))
    }
}

pub fn default_user_agent() -> String {
    format!("stanza-loader/{}", env!("CARGO_PKG_VERSION"))
}
