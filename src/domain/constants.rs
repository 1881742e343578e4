//! Catalog console domain constants
//!
//! Query shaping and progress-refresh defaults. Runtime values come from
//! `ConsoleConfig`; these are the defaults it starts from.

/// Query shaping constants
pub mod query {
    /// Rows requested per page
    pub const DEFAULT_PAGE_SIZE: u32 = 20;

    /// Largest `limit` the backend accepts on the list endpoint
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// Trimmed search terms shorter than this are not sent to the backend
    pub const MIN_SEARCH_LENGTH: usize = 2;

    /// Quiet period before a free-text search fires (milliseconds)
    pub const SEARCH_DEBOUNCE_MS: u64 = 400;

    /// Pages shown on each side of the current page in the page window
    pub const PAGE_WINDOW: u32 = 2;

    /// Pages are 1-based
    pub const FIRST_PAGE: u32 = 1;
}

/// Import progress constants
pub mod progress {
    /// Refresh floor while a job is queued or has not reported progress yet
    pub const BASE_REFRESH_INTERVAL_MS: u64 = 2000;

    /// Tightened refresh floor while a job is processing with progress > 0
    pub const ACTIVE_REFRESH_INTERVAL_MS: u64 = 1000;

    /// Shown when the progress subscription drops
    pub const CONNECTION_LOST_MESSAGE: &str = "Connection lost";
}

/// User-facing messages
pub mod messages {
    /// Guidance shown while the search term is too short
    pub fn search_too_short(min_len: usize) -> String {
        format!("Enter at least {min_len} characters to search")
    }

    /// Inline message shown in the list area when a query fails
    pub const LOAD_FAILED: &str = "Failed to load products";

    pub const NO_PRODUCTS: &str = "No products found";
}
