//! HTTP client for the catalog backend with rate limiting and cancellation
//!
//! Every call takes a `CancellationToken` and races it against the rate
//! limiter, the request and the body read, so a superseded query stops
//! touching the network as soon as it is cancelled.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{Quota, RateLimiter, clock::DefaultClock, state::{InMemoryState, direct::NotKeyed}};
use reqwest::{
    Client, Method, RequestBuilder, Response,
    header::{HeaderMap, HeaderValue, USER_AGENT},
};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::infrastructure::config::ApiConfig;

/// Failures talking to the backend
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request cancelled")]
    Cancelled,

    #[error("Failed to reach {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}{}", .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    Status {
        status: u16,
        url: String,
        detail: Option<String>,
    },

    #[error("Invalid response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Progress stream error: {0}")]
    Stream(String),

    #[error("HTTP client setup failed: {0}")]
    Setup(String),
}

impl ApiError {
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Short text suitable for an inline message or alert
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { detail: Some(detail), .. } => detail.clone(),
            Self::Status { status, .. } => format!("Server responded with status {status}"),
            other => other.to_string(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, serde::Serialize)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for HttpClientConfig {
    fn from(api: &ApiConfig) -> Self {
        Self {
            user_agent: api.user_agent.clone(),
            timeout_seconds: api.timeout_seconds,
            max_requests_per_second: api.max_requests_per_second,
        }
    }
}

/// Rate-limited, cancellable reqwest wrapper
pub struct HttpClient {
    client: Client,
    /// No overall timeout: progress streams stay open for the whole import
    stream_client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    config: HttpClientConfig,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).map_err(|e| ApiError::Setup(format!("Invalid user agent: {e}")))?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers.clone())
            .build()
            .map_err(|e| ApiError::Setup(e.to_string()))?;

        let stream_client = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Setup(e.to_string()))?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .ok_or_else(|| ApiError::Setup("Rate limit must be greater than 0".into()))?,
        );

        Ok(Self {
            client,
            stream_client,
            rate_limiter: RateLimiter::direct(quota),
            config,
        })
    }

    pub const fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Sends `request` honouring the rate limit and `cancel`; non-2xx becomes `ApiError::Status`
    async fn execute(&self, request: RequestBuilder, url: &Url, cancel: &CancellationToken) -> Result<Response, ApiError> {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        tokio::select! {
            () = self.rate_limiter.until_ready() => {},
            () = cancel.cancelled() => return Err(ApiError::Cancelled),
        }

        tracing::debug!("➡️ {}", url);

        let response = tokio::select! {
            result = request.send() => result.map_err(|source| ApiError::Transport { url: url.to_string(), source })?,
            () = cancel.cancelled() => {
                tracing::debug!("🛑 Request cancelled: {}", url);
                return Err(ApiError::Cancelled);
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = tokio::select! {
            body = response.text() => body.unwrap_or_default(),
            () = cancel.cancelled() => return Err(ApiError::Cancelled),
        };
        tracing::warn!("HTTP {} from {}", status, url);
        Err(ApiError::Status {
            status: status.as_u16(),
            url: url.to_string(),
            detail: extract_detail(&body),
        })
    }

    async fn read_json<T: DeserializeOwned>(response: Response, url: &Url, cancel: &CancellationToken) -> Result<T, ApiError> {
        tokio::select! {
            result = response.json::<T>() => result.map_err(|e| ApiError::Decode { url: url.to_string(), message: e.to_string() }),
            () = cancel.cancelled() => Err(ApiError::Cancelled),
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: Url, cancel: &CancellationToken) -> Result<T, ApiError> {
        let response = self.execute(self.client.get(url.clone()), &url, cancel).await?;
        Self::read_json(response, &url, cancel).await
    }

    /// Sends an optional JSON body and decodes a JSON reply
    pub async fn send_json<B, T>(&self, method: Method, url: Url, body: Option<&B>, cancel: &CancellationToken) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.client.request(method, url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = self.execute(request, &url, cancel).await?;
        Self::read_json(response, &url, cancel).await
    }

    /// Sends a request and ignores the reply body
    pub async fn send_empty(&self, method: Method, url: Url, cancel: &CancellationToken) -> Result<(), ApiError> {
        self.execute(self.client.request(method, url.clone()), &url, cancel).await?;
        Ok(())
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        url: Url,
        form: reqwest::multipart::Form,
        cancel: &CancellationToken,
    ) -> Result<T, ApiError> {
        let response = self.execute(self.client.post(url.clone()).multipart(form), &url, cancel).await?;
        Self::read_json(response, &url, cancel).await
    }

    /// Opens a long-lived response (Server-Sent Events)
    pub async fn open_stream(&self, url: Url, cancel: &CancellationToken) -> Result<Response, ApiError> {
        let request = self.stream_client.get(url.clone()).header("Accept", "text/event-stream");
        self.execute(request, &url, cancel).await
    }
}

/// Pulls FastAPI's `{"detail": ...}` out of an error body
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
