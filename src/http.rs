//! HTTP collaborator used by the orchestrator
//!
//! The orchestrator only needs three calls: a JSON POST, a buffered GET and a
//! streaming GET. [`ReqwestClient`] implements them on top of a shared
//! `reqwest::Client`; tests plug in scripted implementations.

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use url::Url;

/// Response body delivered chunk by chunk as it arrives
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Fully buffered response
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Bytes,
}

impl HttpResponse {
    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Response whose body has not been read yet
pub struct StreamingResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: ByteStream,
}

impl StreamingResponse {
    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Authenticated HTTP client
///
/// Implementations own authentication and transport concerns. A non-2xx status
/// is not an error at this level; it is returned to the caller, which decides
/// what it means for the call it made. Implementations must be safe to share
/// between concurrent downloads.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// POST a JSON body and buffer the response
    async fn post_json(&self, url: &Url, body: &serde_json::Value) -> Result<HttpResponse>;

    /// GET a URL and buffer the response
    async fn get(&self, url: &Url) -> Result<HttpResponse>;

    /// GET a URL and hand back the body as a stream
    async fn get_stream(&self, url: &Url) -> Result<StreamingResponse>;
}

/// [`HttpClient`] backed by `reqwest`
#[derive(Clone, Debug)]
pub struct ReqwestClient {
    client: reqwest::Client,
    access_token: Option<String>,
    request_timeout: std::time::Duration,
}

impl ReqwestClient {
    /// Build a client from API settings
    pub fn new(api: &ApiConfig) -> Result<Self> {
        // Only the connect phase is bounded here; buffered calls set their own timeout
        let client = reqwest::Client::builder()
            .user_agent(api.user_agent.clone())
            .connect_timeout(api.request_timeout)
            .build()?;

        Ok(Self {
            client,
            access_token: api.access_token.clone(),
            request_timeout: api.request_timeout,
        })
    }

    /// Wrap an existing `reqwest::Client`, sharing its connection pool
    pub fn with_client(
        client: reqwest::Client,
        access_token: Option<String>,
        request_timeout: std::time::Duration,
    ) -> Self {
        Self {
            client,
            access_token,
            request_timeout,
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn buffered(&self, request: reqwest::RequestBuilder) -> Result<HttpResponse> {
        let response = self
            .authorize(request)
            .timeout(self.request_timeout)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn post_json(&self, url: &Url, body: &serde_json::Value) -> Result<HttpResponse> {
        self.buffered(self.client.post(url.clone()).json(body)).await
    }

    async fn get(&self, url: &Url) -> Result<HttpResponse> {
        self.buffered(self.client.get(url.clone())).await
    }

    async fn get_stream(&self, url: &Url) -> Result<StreamingResponse> {
        let response = self.authorize(self.client.get(url.clone())).send().await?;
        let status = response.status().as_u16();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(Error::from));
        Ok(StreamingResponse {
            status,
            body: Box::pin(body),
        })
    }
}
