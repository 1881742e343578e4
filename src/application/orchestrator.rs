//! Query orchestrator: the entry point for every user action on the list
//!
//! Translates keystrokes, filter changes, page clicks and catalog mutations
//! into request-controller resolutions:
//! - free-text search is debounced
//! - type/status changes and pagination fire immediately
//! - every filter change invalidates the prefetch slot before anything else

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::application::debounce::DebounceScheduler;
use crate::application::errors::QueryError;
use crate::application::request_controller::{PageOutcome, RequestController, ResolveOptions};
use crate::application::view_state::ViewState;
use crate::domain::constants::query::FIRST_PAGE;
use crate::domain::filter::{FilterState, SearchType};
use crate::domain::pagination::PaginationMode;
use crate::domain::product::{NewProduct, Product, ProductUpdate};
use crate::infrastructure::catalog_api::CatalogApi;
use crate::infrastructure::config::QueryConfig;
use crate::infrastructure::http_client::ApiError;

#[derive(Clone)]
pub struct QueryOrchestrator {
    catalog: Arc<dyn CatalogApi>,
    controller: RequestController,
    filter: Arc<Mutex<FilterState>>,
    debouncer: Arc<Mutex<DebounceScheduler>>,
}

impl QueryOrchestrator {
    pub fn new(catalog: Arc<dyn CatalogApi>, config: &QueryConfig) -> Self {
        let controller =
            RequestController::new(catalog.clone(), config.signature_builder()).with_page_window(config.page_window);
        Self {
            catalog,
            controller,
            filter: Arc::new(Mutex::new(FilterState::default())),
            debouncer: Arc::new(Mutex::new(DebounceScheduler::new(config.debounce()))),
        }
    }

    pub const fn controller(&self) -> &RequestController {
        &self.controller
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.controller.subscribe()
    }

    pub async fn view(&self) -> ViewState {
        self.controller.view().await
    }

    pub async fn filter(&self) -> FilterState {
        self.filter.lock().await.clone()
    }

    pub async fn is_search_pending(&self) -> bool {
        self.debouncer.lock().await.is_pending()
    }

    /// Initial load of page 1 with the current filters
    pub async fn load(&self) -> Result<PageOutcome, QueryError> {
        let filter = {
            let mut filter = self.filter.lock().await;
            filter.page = FIRST_PAGE;
            filter.clone()
        };
        self.controller.resolve(&filter, ResolveOptions::interactive()).await
    }

    /// Free-text keystroke: debounced.
    ///
    /// Synchronously cancels the pending timer, invalidates the prefetch slot
    /// and resets the page before the new timer starts. The query that
    /// eventually fires reads the filter state at fire time.
    pub async fn on_search_input(&self, term: impl Into<String>) {
        let term = term.into();
        let mut debouncer = self.debouncer.lock().await;
        debouncer.cancel();
        self.controller.invalidate_prefetch().await;
        self.filter.lock().await.set_search_term(term);

        let this = self.clone();
        debouncer.schedule(move || async move { this.fire_debounced_search().await });
    }

    async fn fire_debounced_search(&self) {
        let filter = self.filter.lock().await.clone();
        debug!("⏱️ Debounced search fired for {:?}", filter.trimmed_term());
        log_outcome("search", self.controller.resolve(&filter, ResolveOptions::interactive()).await);
    }

    /// Search-type change: immediate
    pub async fn set_search_type(&self, search_type: Option<SearchType>) -> Result<PageOutcome, QueryError> {
        self.apply_filter_change(|filter| filter.set_search_type(search_type)).await
    }

    /// Active/inactive filter change: immediate
    pub async fn set_status_filter(&self, status: Option<bool>) -> Result<PageOutcome, QueryError> {
        self.apply_filter_change(|filter| filter.set_status_filter(status)).await
    }

    /// Replaces every filter at once and resolves immediately, skipping the
    /// debounce. Used by non-interactive callers.
    pub async fn apply_filters(&self, filter: FilterState) -> Result<PageOutcome, QueryError> {
        self.apply_filter_change(|current| *current = filter).await
    }

    async fn apply_filter_change(&self, change: impl FnOnce(&mut FilterState)) -> Result<PageOutcome, QueryError> {
        // a pending keystroke timer would re-issue the same query
        self.debouncer.lock().await.cancel();
        self.controller.invalidate_prefetch().await;
        let filter = {
            let mut filter = self.filter.lock().await;
            change(&mut filter);
            filter.clone()
        };
        self.controller.resolve(&filter, ResolveOptions::interactive()).await
    }

    /// Page click (Bounded mode). Pages outside `1..=total_pages` are clamped.
    pub async fn go_to_page(&self, page: u32) -> Result<PageOutcome, QueryError> {
        let page = match self.controller.view().await.mode {
            Some(PaginationMode::Bounded { total_pages }) => page.clamp(FIRST_PAGE, total_pages.max(FIRST_PAGE)),
            _ => page.max(FIRST_PAGE),
        };
        let filter = {
            let mut filter = self.filter.lock().await;
            filter.page = page;
            filter.clone()
        };
        self.controller.resolve(&filter, ResolveOptions::interactive()).await
    }

    pub async fn next_page(&self) -> Result<PageOutcome, QueryError> {
        let current = self.controller.view().await.current_page;
        self.go_to_page(current.saturating_add(1)).await
    }

    pub async fn prev_page(&self) -> Result<PageOutcome, QueryError> {
        let current = self.controller.view().await.current_page;
        self.go_to_page(current.saturating_sub(1)).await
    }

    /// "Load more" in Unbounded mode; `None` when there is nothing more to load
    pub async fn load_more(&self) -> Option<Result<PageOutcome, QueryError>> {
        let view = self.controller.view().await;
        match view.mode {
            Some(PaginationMode::Unbounded { has_more: true }) => {}
            _ => return None,
        }
        let filter = {
            let mut filter = self.filter.lock().await;
            filter.page = view.current_page + 1;
            filter.clone()
        };
        Some(self.controller.resolve(&filter, ResolveOptions::load_more()).await)
    }

    /// Silent re-resolution of the requested page, bypassing the prefetch slot.
    ///
    /// Skipped with `QueryError::Canceled` while a search timer is pending: the
    /// filter already holds the half-typed term and the search will fetch fresh
    /// rows itself. The shared filter is only read here, except when the
    /// requested page no longer exists.
    ///
    /// In Unbounded mode the list is reloaded from page 1, since re-fetching
    /// only the last continuation would drop the rows above it. In Bounded mode
    /// a page past the new last page (rows were deleted) is re-resolved as the
    /// last page.
    pub async fn refresh_current(&self) -> Result<PageOutcome, QueryError> {
        let requested = {
            let debouncer = self.debouncer.lock().await;
            if debouncer.is_pending() {
                debug!("Refresh skipped, search input pending");
                return Err(QueryError::Canceled);
            }
            self.filter.lock().await.clone()
        };

        self.controller.invalidate_prefetch().await;
        let page = match self.controller.view().await.mode {
            Some(PaginationMode::Unbounded { .. }) => FIRST_PAGE,
            _ => requested.page,
        };
        let outcome = self
            .controller
            .resolve(&requested.at_page(page), ResolveOptions::background_refresh())
            .await?;

        match outcome.mode {
            PaginationMode::Bounded { total_pages } if total_pages >= FIRST_PAGE && outcome.page > total_pages => {
                debug!("Page {} is past the last page {}, refreshing that instead", outcome.page, total_pages);
                {
                    let mut filter = self.filter.lock().await;
                    if *filter == requested {
                        filter.page = total_pages;
                    }
                }
                self.controller
                    .resolve(&requested.at_page(total_pages), ResolveOptions::background_refresh())
                    .await
            }
            _ => Ok(outcome),
        }
    }

    /// Cancels all pending work and forgets filters and rows
    pub async fn reset(&self) {
        self.debouncer.lock().await.cancel();
        *self.filter.lock().await = FilterState::default();
        self.controller.reset().await;
        info!("🔄 Query orchestrator reset");
    }

    pub async fn get_product(&self, id: i64) -> Result<Product, ApiError> {
        self.catalog.get_product(id).await
    }

    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, ApiError> {
        let created = self.catalog.create_product(product).await?;
        info!("Created product {} ({})", created.id, created.sku);
        self.after_mutation().await;
        Ok(created)
    }

    pub async fn update_product(&self, id: i64, update: &ProductUpdate) -> Result<Product, ApiError> {
        let updated = self.catalog.update_product(id, update).await?;
        info!("Updated product {}", id);
        self.after_mutation().await;
        Ok(updated)
    }

    pub async fn delete_product(&self, id: i64) -> Result<(), ApiError> {
        self.catalog.delete_product(id).await?;
        info!("Deleted product {}", id);
        self.after_mutation().await;
        Ok(())
    }

    pub async fn delete_all_products(&self) -> Result<(), ApiError> {
        self.catalog.delete_all_products().await?;
        warn!("🗑️ All products deleted");
        self.after_mutation().await;
        Ok(())
    }

    async fn after_mutation(&self) {
        log_outcome("refresh after mutation", self.refresh_current().await);
    }
}

/// Logs a resolution whose caller has nobody to report to
pub(crate) fn log_outcome(context: &str, outcome: Result<PageOutcome, QueryError>) {
    match outcome {
        Ok(outcome) => debug!("{} resolved page {} ({} rows)", context, outcome.page, outcome.row_count),
        Err(QueryError::Canceled) => debug!("{} superseded", context),
        Err(QueryError::SearchTooShort { .. }) => debug!("{} waiting for more input", context),
        Err(err) => warn!("{} failed: {}", context, err),
    }
}
