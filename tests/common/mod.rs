//! In-memory backend shared by the integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::channel::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use catalog_console_lib::domain::{
    FilterState, JobStatus, NewProduct, PageResult, Product, ProductUpdate, ProgressEvent, QuerySignature, SearchType,
};
use catalog_console_lib::infrastructure::catalog_api::{
    CatalogApi, DirectUploadCredentials, ImportAccepted, ImportApi, ImportInit, ProgressStream,
};
use catalog_console_lib::infrastructure::config::QueryConfig;
use catalog_console_lib::infrastructure::http_client::ApiError;

pub const PAGE_SIZE: u32 = 10;

pub fn query_config() -> QueryConfig {
    QueryConfig {
        page_size: PAGE_SIZE,
        ..QueryConfig::default()
    }
}

pub fn product(id: i64, sku: &str, name: &str) -> Product {
    Product {
        id,
        sku: sku.to_string(),
        name: name.to_string(),
        description: None,
        active: id % 2 == 0,
        created_at: None,
        updated_at: None,
    }
}

/// `n` products with SKUs `SKU-0001`, `SKU-0002`, ...
pub fn products(n: usize) -> Vec<Product> {
    (1..=n as i64)
        .map(|id| product(id, &format!("SKU-{id:04}"), &format!("Product {id}")))
        .collect()
}

/// Lets spawned tasks run without advancing the paused clock
pub async fn settle() {
    for _ in 0..100 {
        tokio::task::yield_now().await;
    }
}

pub fn page(filter: &FilterState, page: u32) -> FilterState {
    filter.at_page(page)
}

/// Catalog backed by a vector, recording every list call in issue order
pub struct MockCatalog {
    rows: Mutex<Vec<Product>>,
    calls: Mutex<Vec<QuerySignature>>,
    latency: Mutex<Duration>,
    latency_by_search: Mutex<HashMap<String, Duration>>,
    report_total: AtomicBool,
    fail_lists: AtomicBool,
    next_id: Mutex<i64>,
}

impl MockCatalog {
    pub fn new(rows: Vec<Product>) -> Self {
        let next_id = rows.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        Self {
            rows: Mutex::new(rows),
            calls: Mutex::new(Vec::new()),
            latency: Mutex::new(Duration::ZERO),
            latency_by_search: Mutex::new(HashMap::new()),
            report_total: AtomicBool::new(true),
            fail_lists: AtomicBool::new(false),
            next_id: Mutex::new(next_id),
        }
    }

    /// List responses carry `total: null`
    pub fn without_total(self) -> Self {
        self.report_total.store(false, Ordering::SeqCst);
        self
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn set_latency_for_search(&self, search: &str, latency: Duration) {
        self.latency_by_search.lock().unwrap().insert(search.to_string(), latency);
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_lists.store(failing, Ordering::SeqCst);
    }

    pub fn push_row(&self, row: Product) {
        self.rows.lock().unwrap().push(row);
    }

    pub fn calls(&self) -> Vec<QuerySignature> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// List calls for one page number
    pub fn calls_for_page(&self, page: u32) -> Vec<QuerySignature> {
        self.calls().into_iter().filter(|c| c.page() == page).collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn matches(row: &Product, query: &QuerySignature) -> bool {
        if let Some(active) = query.active {
            if row.active != active {
                return false;
            }
        }
        let Some(term) = query.search.as_deref() else { return true };
        let term = term.to_lowercase();
        let field = match query.search_type.unwrap_or_default() {
            SearchType::Sku => row.sku.to_lowercase(),
            SearchType::Name => row.name.to_lowercase(),
            SearchType::Description => row.description.clone().unwrap_or_default().to_lowercase(),
        };
        field.contains(&term)
    }
}

#[async_trait]
impl CatalogApi for MockCatalog {
    async fn list_products(&self, query: &QuerySignature, _cancel: CancellationToken) -> Result<PageResult, ApiError> {
        self.calls.lock().unwrap().push(query.clone());

        let latency = query
            .search
            .as_ref()
            .and_then(|s| self.latency_by_search.lock().unwrap().get(s).copied())
            .unwrap_or_else(|| *self.latency.lock().unwrap());
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 500,
                url: "http://mock/products/".into(),
                detail: Some("Database unavailable".into()),
            });
        }

        let matching: Vec<Product> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| Self::matches(row, query))
            .cloned()
            .collect();
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.skip as usize)
            .take(query.limit as usize)
            .collect();
        let total_count = self.report_total.load(Ordering::SeqCst).then_some(total);
        Ok(PageResult::new(items, total_count))
    }

    async fn get_product(&self, id: i64) -> Result<Product, ApiError> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(ApiError::Status { status: 404, url: format!("http://mock/products/{id}"), detail: Some("Product not found".into()) })
    }

    async fn create_product(&self, new: &NewProduct) -> Result<Product, ApiError> {
        let mut next_id = self.next_id.lock().unwrap();
        let created = Product {
            id: *next_id,
            sku: new.sku.clone(),
            name: new.name.clone(),
            description: new.description.clone(),
            active: true,
            created_at: None,
            updated_at: None,
        };
        *next_id += 1;
        self.rows.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_product(&self, id: i64, update: &ProductUpdate) -> Result<Product, ApiError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(ApiError::Status { status: 404, url: format!("http://mock/products/{id}"), detail: None })?;
        if let Some(sku) = &update.sku {
            row.sku = sku.clone();
        }
        if let Some(name) = &update.name {
            row.name = name.clone();
        }
        if let Some(active) = update.active {
            row.active = active;
        }
        Ok(row.clone())
    }

    async fn delete_product(&self, id: i64) -> Result<(), ApiError> {
        self.rows.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }

    async fn delete_all_products(&self) -> Result<(), ApiError> {
        self.rows.lock().unwrap().clear();
        Ok(())
    }
}

/// Import backend whose progress frames are pushed by the test
pub struct MockImports {
    job_id: Uuid,
    direct_upload: bool,
    fail_direct_upload: AtomicBool,
    stream: Mutex<Option<mpsc::UnboundedReceiver<Result<ProgressEvent, ApiError>>>>,
    calls: Mutex<Vec<String>>,
}

/// Test side of a job's progress stream
pub struct ProgressFeed {
    tx: mpsc::UnboundedSender<Result<ProgressEvent, ApiError>>,
}

impl ProgressFeed {
    pub fn send(&self, status: JobStatus, progress: f64, message: Option<&str>) {
        let event = ProgressEvent {
            status,
            message: message.map(str::to_string),
            progress,
        };
        self.tx.unbounded_send(Ok(event)).unwrap();
    }

    pub fn fail(&self, reason: &str) {
        self.tx.unbounded_send(Err(ApiError::Stream(reason.to_string()))).unwrap();
    }

    /// Ends the stream without a terminal status
    pub fn close(self) {
        self.tx.close_channel();
    }
}

impl MockImports {
    pub fn new(direct_upload: bool) -> (Self, ProgressFeed) {
        let (tx, rx) = mpsc::unbounded();
        let imports = Self {
            job_id: Uuid::new_v4(),
            direct_upload,
            fail_direct_upload: AtomicBool::new(false),
            stream: Mutex::new(Some(rx)),
            calls: Mutex::new(Vec::new()),
        };
        (imports, ProgressFeed { tx })
    }

    pub const fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn fail_direct_upload(&self) {
        self.fail_direct_upload.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn credentials() -> DirectUploadCredentials {
        DirectUploadCredentials {
            cloud_name: "demo".into(),
            api_key: "key".into(),
            timestamp: 1_700_000_000,
            signature: "sig".into(),
            folder: "imports".into(),
            public_id: "products".into(),
            upload_url: "http://mock/upload".into(),
        }
    }
}

#[async_trait]
impl ImportApi for MockImports {
    async fn init_import(&self) -> Result<ImportInit, ApiError> {
        self.record("init");
        Ok(ImportInit {
            job_id: self.job_id,
            direct_upload: self.direct_upload.then(Self::credentials),
        })
    }

    async fn upload_direct(&self, _credentials: &DirectUploadCredentials, file_name: &str, _bytes: Vec<u8>) -> Result<String, ApiError> {
        self.record("upload_direct");
        if self.fail_direct_upload.load(Ordering::SeqCst) {
            return Err(ApiError::Status { status: 401, url: "http://mock/upload".into(), detail: None });
        }
        Ok(format!("http://mock/files/{file_name}"))
    }

    async fn complete_import(&self, job_id: Uuid, _file_url: &str) -> Result<ImportAccepted, ApiError> {
        self.record("complete");
        Ok(ImportAccepted { job_id, message: Some("Import queued".into()) })
    }

    async fn upload_csv(&self, _file_name: &str, _bytes: Vec<u8>) -> Result<ImportAccepted, ApiError> {
        self.record("upload_csv");
        Ok(ImportAccepted { job_id: self.job_id, message: Some("Import queued".into()) })
    }

    async fn subscribe_progress(&self, job_id: Uuid) -> Result<ProgressStream, ApiError> {
        self.record("subscribe");
        assert_eq!(job_id, self.job_id);
        let rx = self
            .stream
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| ApiError::Stream("already subscribed".into()))?;
        Ok(rx.boxed())
    }
}
