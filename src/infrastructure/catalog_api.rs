//! Catalog backend contracts and their HTTP implementation
//!
//! The orchestrator only talks to `CatalogApi` / `ImportApi`; tests swap in
//! in-memory implementations.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use crate::domain::import_job::{JobStatus, ProgressEvent};
use crate::domain::product::{NewProduct, PageResult, Product, ProductListResponse, ProductUpdate};
use crate::domain::signature::QuerySignature;
use crate::infrastructure::config::ApiConfig;
use crate::infrastructure::http_client::{ApiError, HttpClient, HttpClientConfig};
use crate::infrastructure::sse::{SseDecoder, SseFrame};

/// Typed progress frames for one job
pub type ProgressStream = BoxStream<'static, Result<ProgressEvent, ApiError>>;

#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// `GET /products/` with the signature's query parameters
    async fn list_products(&self, query: &QuerySignature, cancel: CancellationToken) -> Result<PageResult, ApiError>;

    async fn get_product(&self, id: i64) -> Result<Product, ApiError>;
    async fn create_product(&self, product: &NewProduct) -> Result<Product, ApiError>;
    async fn update_product(&self, id: i64, update: &ProductUpdate) -> Result<Product, ApiError>;
    async fn delete_product(&self, id: i64) -> Result<(), ApiError>;
    async fn delete_all_products(&self) -> Result<(), ApiError>;
}

#[async_trait]
pub trait ImportApi: Send + Sync {
    /// Creates a job; may hand back credentials for a direct upload
    async fn init_import(&self) -> Result<ImportInit, ApiError>;

    /// Uploads straight to the storage provider; returns the stored file URL
    async fn upload_direct(&self, credentials: &DirectUploadCredentials, file_name: &str, bytes: Vec<u8>) -> Result<String, ApiError>;

    /// Tells the backend the direct upload finished and queues processing
    async fn complete_import(&self, job_id: Uuid, file_url: &str) -> Result<ImportAccepted, ApiError>;

    /// Server-side upload fallback when no direct-upload credentials exist
    async fn upload_csv(&self, file_name: &str, bytes: Vec<u8>) -> Result<ImportAccepted, ApiError>;

    async fn subscribe_progress(&self, job_id: Uuid) -> Result<ProgressStream, ApiError>;
}

/// Reply of `POST /upload/csv/init`
#[derive(Debug, Clone, Deserialize)]
pub struct ImportInit {
    pub job_id: Uuid,
    #[serde(default, rename = "cloudinary")]
    pub direct_upload: Option<DirectUploadCredentials>,
}

/// Signed bundle for uploading the CSV without going through the backend
#[derive(Debug, Clone, Deserialize)]
pub struct DirectUploadCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub timestamp: i64,
    pub signature: String,
    pub folder: String,
    pub public_id: String,
    pub upload_url: String,
}

/// Reply of the endpoints that queue an import
#[derive(Debug, Clone, Deserialize)]
pub struct ImportAccepted {
    pub job_id: Uuid,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectUploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
}

/// Parses the payload of one progress frame.
///
/// The backend sends JSON objects, but falls back to a bare status word when
/// its own store holds a non-JSON value.
pub fn parse_progress_frame(frame: &SseFrame) -> Result<ProgressEvent, ApiError> {
    let data = frame.data.trim();
    if let Ok(event) = serde_json::from_str::<ProgressEvent>(data) {
        return Ok(event);
    }
    match data {
        "complete" => Ok(ProgressEvent { status: JobStatus::Complete, message: None, progress: 100.0 }),
        "failed" => Ok(ProgressEvent { status: JobStatus::Failed, message: None, progress: 0.0 }),
        other => Err(ApiError::Stream(format!("Malformed progress frame: {other}"))),
    }
}

/// reqwest-backed implementation of both contracts
#[derive(Clone)]
pub struct HttpCatalogApi {
    http: Arc<HttpClient>,
    base_url: Url,
}

impl HttpCatalogApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = HttpClient::new(HttpClientConfig::from(config))?;
        Self::with_client(Arc::new(http), &config.base_url)
    }

    pub fn with_client(http: Arc<HttpClient>, base_url: &str) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        // join() replaces the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Full list URL for a signature
    pub fn list_url(&self, query: &QuerySignature) -> Result<Url, ApiError> {
        let mut url = self.endpoint("products/")?;
        url.query_pairs_mut().extend_pairs(query.query_pairs());
        Ok(url)
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn list_products(&self, query: &QuerySignature, cancel: CancellationToken) -> Result<PageResult, ApiError> {
        let url = self.list_url(query)?;
        let response: ProductListResponse = self.http.get_json(url, &cancel).await?;
        Ok(response.into())
    }

    async fn get_product(&self, id: i64) -> Result<Product, ApiError> {
        let url = self.endpoint(&format!("products/{id}"))?;
        self.http.get_json(url, &CancellationToken::new()).await
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, ApiError> {
        let url = self.endpoint("products/")?;
        self.http.send_json(Method::POST, url, Some(product), &CancellationToken::new()).await
    }

    async fn update_product(&self, id: i64, update: &ProductUpdate) -> Result<Product, ApiError> {
        let url = self.endpoint(&format!("products/{id}"))?;
        self.http.send_json(Method::PUT, url, Some(update), &CancellationToken::new()).await
    }

    async fn delete_product(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("products/{id}"))?;
        self.http.send_empty(Method::DELETE, url, &CancellationToken::new()).await
    }

    async fn delete_all_products(&self) -> Result<(), ApiError> {
        let url = self.endpoint("products/all")?;
        self.http.send_empty(Method::DELETE, url, &CancellationToken::new()).await
    }
}

#[async_trait]
impl ImportApi for HttpCatalogApi {
    async fn init_import(&self) -> Result<ImportInit, ApiError> {
        let url = self.endpoint("upload/csv/init")?;
        self.http
            .send_json::<(), _>(Method::POST, url, None, &CancellationToken::new())
            .await
    }

    async fn upload_direct(&self, credentials: &DirectUploadCredentials, file_name: &str, bytes: Vec<u8>) -> Result<String, ApiError> {
        let url = Url::parse(&credentials.upload_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", credentials.upload_url)))?;
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()))
            .text("api_key", credentials.api_key.clone())
            .text("timestamp", credentials.timestamp.to_string())
            .text("signature", credentials.signature.clone())
            .text("folder", credentials.folder.clone())
            .text("public_id", credentials.public_id.clone());

        let response: DirectUploadResponse = self.http.post_multipart(url.clone(), form, &CancellationToken::new()).await?;
        response.secure_url.or(response.url).ok_or_else(|| ApiError::Decode {
            url: url.to_string(),
            message: "upload response carries no file URL".into(),
        })
    }

    async fn complete_import(&self, job_id: Uuid, file_url: &str) -> Result<ImportAccepted, ApiError> {
        let mut url = self.endpoint("upload/csv/complete")?;
        url.query_pairs_mut()
            .append_pair("job_id", &job_id.to_string())
            .append_pair("file_url", file_url);
        self.http
            .send_json::<(), _>(Method::POST, url, None, &CancellationToken::new())
            .await
    }

    async fn upload_csv(&self, file_name: &str, bytes: Vec<u8>) -> Result<ImportAccepted, ApiError> {
        let url = self.endpoint("upload/csv")?;
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("text/csv")
            .map_err(|e| ApiError::Setup(e.to_string()))?;
        self.http
            .post_multipart(url, Form::new().part("file", part), &CancellationToken::new())
            .await
    }

    async fn subscribe_progress(&self, job_id: Uuid) -> Result<ProgressStream, ApiError> {
        let url = self.endpoint(&format!("upload/progress/{job_id}"))?;
        let response = self.http.open_stream(url, &CancellationToken::new()).await?;
        tracing::info!("📡 Subscribed to progress of job {}", job_id);

        let body = response.bytes_stream().map(|chunk| chunk.map_err(std::io::Error::other));
        let frames = FramedRead::new(StreamReader::new(body), SseDecoder::new());
        Ok(frames
            .map(|frame| match frame {
                Ok(frame) => parse_progress_frame(&frame),
                Err(e) => Err(ApiError::Stream(e.to_string())),
            })
            .boxed())
    }
}
