use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Product record as returned by the catalog backend.
///
/// Treated as an immutable snapshot: edits go through `ProductUpdate` and the
/// refreshed row replaces the old one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for `POST /products/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Partial update for `PUT /products/{id}`; `None` fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.sku.is_none() && self.name.is_none() && self.description.is_none() && self.active.is_none()
    }
}

/// One page of the list endpoint.
///
/// `total_count` is `None` when the backend could not compute an exact count.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageResult {
    pub items: Vec<Product>,
    pub total_count: Option<u64>,
}

impl PageResult {
    pub fn new(items: Vec<Product>, total_count: Option<u64>) -> Self {
        Self { items, total_count }
    }
}

/// Wire shape of `GET /products/`
#[derive(Debug, Clone, Deserialize)]
pub struct ProductListResponse {
    #[serde(default)]
    pub total: Option<u64>,
    pub products: Vec<Product>,
}

impl From<ProductListResponse> for PageResult {
    fn from(response: ProductListResponse) -> Self {
        Self {
            items: response.products,
            total_count: response.total,
        }
    }
}
