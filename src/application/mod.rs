//! Application layer - the query & progress orchestrator
//!
//! Coordinates user input, in-flight requests, the lookahead cache and import
//! progress into one consistent view of the product list.

pub mod debounce;
pub mod errors;
pub mod import_workflow;
pub mod orchestrator;
pub mod prefetch_cache;
pub mod progress_sync;
pub mod request_controller;
pub mod view_state;

// Re-export commonly used items
pub use debounce::DebounceScheduler;
pub use errors::QueryError;
pub use import_workflow::{ImportError, ImportWorkflow};
pub use orchestrator::QueryOrchestrator;
pub use prefetch_cache::{PrefetchCache, PrefetchSlot};
pub use progress_sync::{ProgressHandle, ProgressSynchronizer, SyncOutcome, UploadPhase, UploadStatus};
pub use request_controller::{PageOutcome, RequestController, ResolveOptions};
pub use view_state::{ViewMessage, ViewState};
