//! Domain module - catalog entities and pure query logic
//!
//! Nothing in here performs I/O: filters, signatures and pagination layout
//! are plain values so the orchestrator can reason about them synchronously.

pub mod constants;
pub mod filter;
pub mod import_job;
pub mod pagination;
pub mod product;
pub mod signature;

// Re-export commonly used items
pub use filter::{FilterState, SearchType};
pub use import_job::{ImportJob, JobStatus, ProgressEvent};
pub use pagination::{PageLink, PageWindow, PaginationMode, RenderStrategy};
pub use product::{NewProduct, PageResult, Product, ProductUpdate};
pub use signature::{QuerySignature, SignatureBuilder};
