//! Catalog Console - query & progress orchestration for a product catalog
//!
//! Turns list interactions (typing, filter changes, page clicks) into a
//! disciplined sequence of backend queries with debouncing, single-flight
//! cancellation and page prefetching, and folds live CSV-import progress into
//! the same view.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{
    ImportWorkflow, ProgressSynchronizer, QueryError, QueryOrchestrator, RequestController, ViewState,
};
pub use domain::{FilterState, PaginationMode, QuerySignature, SearchType};
pub use infrastructure::{ApiError, ConsoleConfig, HttpCatalogApi};
