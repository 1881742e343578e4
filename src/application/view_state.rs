//! Visible list state: rows, pagination mode, page window and status line
//!
//! Only the request controller mutates this; everyone else reads snapshots.

use serde::Serialize;

use crate::domain::constants::messages;
use crate::domain::constants::query::FIRST_PAGE;
use crate::domain::pagination::{PageWindow, PaginationMode, RenderStrategy};
use crate::domain::product::{PageResult, Product};

/// Status line shown in place of (or above) the rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum ViewMessage {
    /// "type more to search"; not an error
    Guidance(String),
    /// Inline failure in the list area
    Error(String),
    /// Query succeeded with zero rows
    Empty(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub rows: Vec<Product>,
    pub mode: Option<PaginationMode>,
    pub current_page: u32,
    pub page_window: Option<PageWindow>,
    pub loading: bool,
    pub message: Option<ViewMessage>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            mode: None,
            current_page: FIRST_PAGE,
            page_window: None,
            loading: false,
            message: None,
        }
    }
}

impl ViewState {
    /// Renders a fresh page through the pagination mode selector.
    ///
    /// Returns the selected mode and the strategy that was applied to the rows.
    pub fn apply_page(
        &mut self,
        result: PageResult,
        page: u32,
        page_size: u32,
        window: u32,
        continuation: bool,
    ) -> (PaginationMode, RenderStrategy) {
        let mode = PaginationMode::select(&result, page_size);
        let strategy = RenderStrategy::decide(self.mode, mode, page, continuation);

        match strategy {
            RenderStrategy::Replace => self.rows = result.items,
            RenderStrategy::Append => self.rows.extend(result.items),
        }

        self.page_window = match mode {
            PaginationMode::Bounded { total_pages } => Some(PageWindow::with_window(page, total_pages, window)),
            PaginationMode::Unbounded { .. } => None,
        };
        self.mode = Some(mode);
        self.current_page = page;
        self.loading = false;
        self.message = self.rows.is_empty().then(|| ViewMessage::Empty(messages::NO_PRODUCTS.to_string()));

        (mode, strategy)
    }

    pub fn show_guidance(&mut self, min_len: usize) {
        self.rows.clear();
        self.mode = None;
        self.page_window = None;
        self.current_page = FIRST_PAGE;
        self.loading = false;
        self.message = Some(ViewMessage::Guidance(messages::search_too_short(min_len)));
    }

    /// Failure keeps whatever rows were visible and clears the spinner
    pub fn show_error(&mut self, detail: &str) {
        self.loading = false;
        self.message = Some(ViewMessage::Error(format!("{}: {detail}", messages::LOAD_FAILED)));
    }

    pub fn has_next_page(&self) -> bool {
        self.mode.is_some_and(|mode| mode.has_next(self.current_page))
    }
}
