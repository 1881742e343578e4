//! Request controller: single-flight resolution of the visible page
//!
//! Owns the only mutable view state (rows, pagination mode, current page) and
//! the prefetch slot. At most one authoritative request is live at a time;
//! starting a new one cancels the previous one before anything else happens,
//! and a cancelled request never writes to shared state.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::application::errors::QueryError;
use crate::application::prefetch_cache::{PrefetchCache, PrefetchSlot, PrefetchTicket};
use crate::application::view_state::ViewState;
use crate::domain::constants::query::PAGE_WINDOW;
use crate::domain::filter::FilterState;
use crate::domain::pagination::{PaginationMode, RenderStrategy};
use crate::domain::product::PageResult;
use crate::domain::signature::SignatureBuilder;
use crate::infrastructure::catalog_api::CatalogApi;
use crate::infrastructure::http_client::ApiError;

/// How a resolution should behave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Toggle the loading indicator around the network step
    pub show_loading: bool,
    /// Allow consuming the prefetch slot
    pub use_cache: bool,
    /// "Load more": rows may be appended in Unbounded mode
    pub continuation: bool,
}

impl ResolveOptions {
    /// Search, filter and page-click paths
    pub const fn interactive() -> Self {
        Self { show_loading: true, use_cache: true, continuation: false }
    }

    pub const fn load_more() -> Self {
        Self { show_loading: false, use_cache: true, continuation: true }
    }

    /// Progress- and mutation-driven refreshes: no spinner, always hit the network
    pub const fn background_refresh() -> Self {
        Self { show_loading: false, use_cache: false, continuation: false }
    }
}

/// What a successful resolution rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutcome {
    pub page: u32,
    pub mode: PaginationMode,
    pub strategy: RenderStrategy,
    pub from_cache: bool,
    pub row_count: usize,
}

#[derive(Debug, Default)]
struct ControllerState {
    view: ViewState,
    prefetch: PrefetchCache,
    /// Id and token of the live authoritative request
    authoritative: Option<(u64, CancellationToken)>,
    next_request_id: u64,
}

impl ControllerState {
    fn cancel_authoritative(&mut self) {
        if let Some((id, token)) = self.authoritative.take() {
            debug!("🛑 Cancelling authoritative request #{}", id);
            token.cancel();
        }
    }

    fn is_live(&self, request_id: u64, token: &CancellationToken) -> bool {
        !token.is_cancelled() && self.authoritative.as_ref().is_some_and(|(id, _)| *id == request_id)
    }
}

#[derive(Clone)]
pub struct RequestController {
    api: Arc<dyn CatalogApi>,
    signatures: SignatureBuilder,
    page_window: u32,
    state: Arc<Mutex<ControllerState>>,
    view_tx: Arc<watch::Sender<ViewState>>,
}

impl RequestController {
    pub fn new(api: Arc<dyn CatalogApi>, signatures: SignatureBuilder) -> Self {
        let (view_tx, _) = watch::channel(ViewState::default());
        Self {
            api,
            signatures,
            page_window: PAGE_WINDOW,
            state: Arc::new(Mutex::new(ControllerState::default())),
            view_tx: Arc::new(view_tx),
        }
    }

    #[must_use]
    pub const fn with_page_window(mut self, window: u32) -> Self {
        self.page_window = window;
        self
    }

    pub const fn signatures(&self) -> &SignatureBuilder {
        &self.signatures
    }

    /// Receives a fresh `ViewState` after every change
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.view_tx.subscribe()
    }

    pub async fn view(&self) -> ViewState {
        self.state.lock().await.view.clone()
    }

    pub async fn prefetch_slot(&self) -> Option<PrefetchSlot> {
        self.state.lock().await.prefetch.peek().cloned()
    }

    pub async fn is_prefetching(&self) -> bool {
        self.state.lock().await.prefetch.is_fetching()
    }

    /// Drops the lookahead page and cancels its fetch
    pub async fn invalidate_prefetch(&self) {
        let mut state = self.state.lock().await;
        if !state.prefetch.is_empty() || state.prefetch.is_fetching() {
            debug!("🧹 Prefetch cache invalidated");
        }
        state.prefetch.invalidate();
    }

    /// Cancels everything in flight and returns to an empty view
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.cancel_authoritative();
        state.prefetch.invalidate();
        state.view = ViewState::default();
        self.publish(&state);
    }

    /// Resolves `filter.page` into the visible rows.
    ///
    /// Order: cancel the previous authoritative request, try the prefetch
    /// slot, short-circuit too-short searches, then go to the network.
    pub async fn resolve(&self, filter: &FilterState, options: ResolveOptions) -> Result<PageOutcome, QueryError> {
        let signature = self.signatures.build(filter);
        let page = filter.page.max(1);
        let min_len = self.signatures.min_search_len();

        let (request_id, token) = {
            let mut state = self.state.lock().await;
            state.cancel_authoritative();
            state.next_request_id += 1;
            let request_id = state.next_request_id;
            let token = CancellationToken::new();
            state.authoritative = Some((request_id, token.clone()));

            if options.use_cache {
                if let Some(slot) = state.prefetch.take(&signature) {
                    debug!("⚡ Prefetch hit for page {} ({})", page, signature);
                    state.authoritative = None;
                    let outcome = self.render(&mut state, slot.result, page, options, true);
                    let ticket = self.begin_next_prefetch(&mut state, filter, &outcome);
                    self.publish(&state);
                    drop(state);
                    self.spawn_prefetch(ticket);
                    return Ok(outcome);
                }
            }

            if filter.is_search_too_short(min_len) {
                debug!("✋ Search term below {} characters, not querying", min_len);
                state.authoritative = None;
                state.view.show_guidance(min_len);
                self.publish(&state);
                return Err(QueryError::SearchTooShort { min_len });
            }

            if options.show_loading {
                state.view.loading = true;
                self.publish(&state);
            }
            (request_id, token)
        };

        debug!("🔎 Request #{} querying {}", request_id, signature);
        let fetched = tokio::select! {
            result = self.api.list_products(&signature, token.clone()) => result,
            () = token.cancelled() => Err(ApiError::Cancelled),
        };

        let mut state = self.state.lock().await;
        if !state.is_live(request_id, &token) {
            debug!("Discarding superseded request #{}", request_id);
            return Err(QueryError::Canceled);
        }
        state.authoritative = None;

        match fetched {
            Ok(result) => {
                let outcome = self.render(&mut state, result, page, options, false);
                let ticket = self.begin_next_prefetch(&mut state, filter, &outcome);
                self.publish(&state);
                drop(state);
                self.spawn_prefetch(ticket);
                Ok(outcome)
            }
            Err(err) if err.is_cancelled() => Err(QueryError::Canceled),
            Err(err) => {
                warn!("Request #{} failed: {}", request_id, err);
                state.view.show_error(&err.user_message());
                self.publish(&state);
                Err(QueryError::Network(err))
            }
        }
    }

    fn render(
        &self,
        state: &mut ControllerState,
        result: PageResult,
        page: u32,
        options: ResolveOptions,
        from_cache: bool,
    ) -> PageOutcome {
        let row_count = result.items.len();
        let (mode, strategy) = state.view.apply_page(
            result,
            page,
            self.signatures.page_size(),
            self.page_window,
            options.continuation,
        );
        debug!("Rendered page {} ({} rows, {:?}, {:?})", page, row_count, mode, strategy);
        PageOutcome { page, mode, strategy, from_cache, row_count }
    }

    /// Registers the page+1 prefetch while the state lock is still held, so a
    /// filter change can never slip in between rendering and prefetching.
    fn begin_next_prefetch(&self, state: &mut ControllerState, filter: &FilterState, outcome: &PageOutcome) -> Option<PrefetchTicket> {
        if !outcome.mode.has_next(outcome.page) {
            return None;
        }
        let next = filter.at_page(outcome.page + 1);
        Some(state.prefetch.begin(self.signatures.build(&next), next.page))
    }

    fn spawn_prefetch(&self, ticket: Option<PrefetchTicket>) {
        let Some(ticket) = ticket else { return };
        let this = self.clone();
        tokio::spawn(async move { this.run_prefetch(ticket).await });
    }

    async fn run_prefetch(&self, ticket: PrefetchTicket) {
        debug!("🔮 Prefetching page {}", ticket.for_page);
        let fetched = tokio::select! {
            result = self.api.list_products(&ticket.signature, ticket.token.clone()) => result,
            () = ticket.token.cancelled() => Err(ApiError::Cancelled),
        };

        let mut state = self.state.lock().await;
        let for_page = ticket.for_page;
        match fetched {
            Ok(result) => {
                if state.prefetch.complete(ticket, result) {
                    debug!("Prefetched page {} stored", for_page);
                } else {
                    debug!("Prefetched page {} discarded (superseded)", for_page);
                }
            }
            Err(err) => {
                state.prefetch.abandon(&ticket);
                if !err.is_cancelled() {
                    debug!("Prefetch of page {} failed: {}", for_page, err);
                }
            }
        }
    }

    fn publish(&self, state: &ControllerState) {
        self.view_tx.send_replace(state.view.clone());
    }
}
