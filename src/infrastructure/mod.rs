//! Infrastructure layer - backend access, configuration, logging

pub mod catalog_api;
pub mod config;
pub mod http_client;
pub mod logging;
pub mod sse;

pub use catalog_api::{CatalogApi, HttpCatalogApi, ImportApi, ProgressStream};
pub use config::{ConfigError, ConsoleConfig};
pub use http_client::{ApiError, HttpClient, HttpClientConfig};
