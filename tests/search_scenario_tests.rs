//! End-to-end input scenarios through the query orchestrator
mod common;

use std::sync::Arc;
use std::time::Duration;

use catalog_console_lib::application::{QueryError, QueryOrchestrator, ViewMessage};
use catalog_console_lib::domain::{FilterState, NewProduct, PaginationMode, ProductUpdate, SearchType};
use common::{MockCatalog, products, query_config, settle};
use rstest::rstest;
use tokio::time::sleep;
use tokio_test::assert_ok;

fn orchestrator(catalog: &Arc<MockCatalog>) -> QueryOrchestrator {
    QueryOrchestrator::new(catalog.clone(), &query_config())
}

fn guidance() -> Option<ViewMessage> {
    Some(ViewMessage::Guidance("Enter at least 2 characters to search".into()))
}

#[tokio::test(start_paused = true)]
async fn keystroke_burst_issues_one_query_with_the_final_term() {
    let catalog = Arc::new(MockCatalog::new(products(25)));
    let orchestrator = orchestrator(&catalog);

    for term in ["S", "SK", "SKU", "SKU-", "SKU-0"] {
        orchestrator.on_search_input(term).await;
        sleep(Duration::from_millis(100)).await;
    }
    // last keystroke at t=400, timer due at t=800
    sleep(Duration::from_millis(299)).await;
    assert_eq!(catalog.call_count(), 0);
    assert!(orchestrator.is_search_pending().await);

    sleep(Duration::from_millis(2)).await;
    settle().await;
    let first_page = catalog.calls_for_page(1);
    assert_eq!(first_page.len(), 1);
    assert_eq!(first_page[0].search.as_deref(), Some("SKU-0"));
    assert!(!orchestrator.is_search_pending().await);
    assert_eq!(orchestrator.view().await.rows.len(), 10);
}

#[tokio::test(start_paused = true)]
async fn single_character_shows_guidance_and_stays_offline() {
    let catalog = Arc::new(MockCatalog::new(products(5)));
    let orchestrator = orchestrator(&catalog);

    orchestrator.on_search_input("a").await;
    sleep(Duration::from_millis(450)).await;
    settle().await;

    assert_eq!(catalog.call_count(), 0);
    assert_eq!(orchestrator.view().await.message, guidance());
}

#[tokio::test(start_paused = true)]
async fn shortening_the_term_cancels_the_in_flight_search() {
    let catalog = Arc::new(MockCatalog::new(products(5)));
    catalog.set_latency_for_search("ab", Duration::from_secs(2));
    let orchestrator = orchestrator(&catalog);

    orchestrator.on_search_input("a").await;
    sleep(Duration::from_millis(100)).await;
    orchestrator.on_search_input("ab").await;
    sleep(Duration::from_millis(450)).await;
    settle().await;

    let calls = catalog.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].search.as_deref(), Some("ab"));
    assert!(orchestrator.view().await.loading);

    orchestrator.on_search_input("a").await;
    sleep(Duration::from_millis(450)).await;
    settle().await;

    let view = orchestrator.view().await;
    assert_eq!(view.message, guidance());
    assert!(!view.loading);

    // the cancelled "ab" response never lands
    sleep(Duration::from_secs(3)).await;
    settle().await;
    let view = orchestrator.view().await;
    assert_eq!(view.message, guidance());
    assert!(view.rows.is_empty());
    assert_eq!(catalog.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn typing_clears_the_prefetch_slot_before_the_timer_fires() {
    let catalog = Arc::new(MockCatalog::new(products(25)));
    let orchestrator = orchestrator(&catalog);

    assert_ok!(orchestrator.load().await);
    settle().await;
    assert!(orchestrator.controller().prefetch_slot().await.is_some());

    orchestrator.on_search_input("SKU").await;
    assert!(orchestrator.controller().prefetch_slot().await.is_none());
    assert!(orchestrator.is_search_pending().await);
    assert_eq!(orchestrator.filter().await.page, 1);
}

#[rstest]
#[case::search_type(true)]
#[case::status(false)]
#[tokio::test(start_paused = true)]
async fn immediate_filter_changes_bypass_the_stale_slot(#[case] change_type: bool) {
    let catalog = Arc::new(MockCatalog::new(products(25)));
    let orchestrator = orchestrator(&catalog);

    assert_ok!(orchestrator.load().await);
    settle().await;
    catalog.clear_calls();

    let outcome = if change_type {
        assert_ok!(orchestrator.set_search_type(Some(SearchType::Name)).await)
    } else {
        assert_ok!(orchestrator.set_status_filter(Some(true)).await)
    };
    assert!(!outcome.from_cache);
    assert_eq!(outcome.page, 1);
    assert_eq!(catalog.calls_for_page(1).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn filter_change_cancels_a_pending_search_timer() {
    let catalog = Arc::new(MockCatalog::new(products(25)));
    let orchestrator = orchestrator(&catalog);

    orchestrator.on_search_input("SKU-00").await;
    assert_ok!(orchestrator.set_status_filter(Some(false)).await);
    assert!(!orchestrator.is_search_pending().await);

    sleep(Duration::from_secs(1)).await;
    settle().await;
    // only the immediate query (plus its lookahead) went out
    assert_eq!(catalog.calls_for_page(1).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn page_clicks_are_clamped_in_bounded_mode() {
    let catalog = Arc::new(MockCatalog::new(products(25)));
    let orchestrator = orchestrator(&catalog);

    assert_ok!(orchestrator.load().await);
    let outcome = assert_ok!(orchestrator.go_to_page(99).await);
    assert_eq!(outcome.page, 3);
    assert_eq!(outcome.mode, PaginationMode::Bounded { total_pages: 3 });

    let outcome = assert_ok!(orchestrator.prev_page().await);
    assert_eq!(outcome.page, 2);
    let outcome = assert_ok!(orchestrator.go_to_page(0).await);
    assert_eq!(outcome.page, 1);
}

#[tokio::test(start_paused = true)]
async fn load_more_stops_when_exhausted() {
    let catalog = Arc::new(MockCatalog::new(products(15)).without_total());
    let orchestrator = orchestrator(&catalog);

    assert_ok!(orchestrator.load().await);
    settle().await;
    let more = orchestrator.load_more().await.expect("more rows available");
    assert_eq!(assert_ok!(more).row_count, 5);
    assert_eq!(orchestrator.view().await.rows.len(), 15);
    assert!(orchestrator.load_more().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn mutations_refresh_the_current_page() {
    let catalog = Arc::new(MockCatalog::new(products(5)));
    let orchestrator = orchestrator(&catalog);
    assert_ok!(orchestrator.load().await);

    let created = assert_ok!(
        orchestrator
            .create_product(&NewProduct { sku: "NEW-1".into(), name: "Fresh".into(), description: None })
            .await
    );
    let view = orchestrator.view().await;
    assert_eq!(view.rows.len(), 6);
    assert!(view.rows.iter().any(|p| p.id == created.id));

    let update = ProductUpdate { active: Some(false), ..Default::default() };
    assert_ok!(orchestrator.update_product(created.id, &update).await);
    let row = orchestrator.view().await.rows.into_iter().find(|p| p.id == created.id);
    assert_eq!(row.map(|p| p.active), Some(false));

    assert_ok!(orchestrator.delete_product(created.id).await);
    assert_eq!(orchestrator.view().await.rows.len(), 5);

    assert_ok!(orchestrator.delete_all_products().await);
    let view = orchestrator.view().await;
    assert!(view.rows.is_empty());
    assert_eq!(view.message, Some(ViewMessage::Empty("No products found".into())));
}

#[tokio::test(start_paused = true)]
async fn refresh_in_unbounded_mode_restarts_from_the_first_page() {
    let catalog = Arc::new(MockCatalog::new(products(25)).without_total());
    let orchestrator = orchestrator(&catalog);

    assert_ok!(orchestrator.load().await);
    settle().await;
    assert!(orchestrator.load_more().await.is_some());
    assert_eq!(orchestrator.view().await.rows.len(), 20);

    let outcome = assert_ok!(orchestrator.refresh_current().await);
    assert_eq!(outcome.page, 1);
    assert!(!outcome.from_cache);
    assert_eq!(orchestrator.view().await.rows.len(), 10);
}

#[tokio::test(start_paused = true)]
async fn refresh_during_pending_search_keeps_the_page_reset() {
    let catalog = Arc::new(MockCatalog::new(products(100)));
    let orchestrator = orchestrator(&catalog);
    assert_ok!(orchestrator.load().await);
    assert_ok!(orchestrator.go_to_page(5).await);
    settle().await;
    catalog.clear_calls();

    orchestrator.on_search_input("SKU-00").await;
    assert_eq!(orchestrator.filter().await.page, 1);
    assert!(matches!(orchestrator.refresh_current().await, Err(QueryError::Canceled)));
    assert_eq!(orchestrator.filter().await.page, 1);
    assert_eq!(catalog.call_count(), 0);

    sleep(Duration::from_millis(450)).await;
    settle().await;
    let first_page = catalog.calls_for_page(1);
    assert_eq!(first_page.len(), 1);
    assert_eq!(first_page[0].search.as_deref(), Some("SKU-00"));
    assert!(catalog.calls_for_page(5).is_empty());
    assert!(catalog.calls_for_page(6).is_empty());
    assert_eq!(orchestrator.view().await.current_page, 1);

    // once the search has landed, refreshes work on the searched page again
    catalog.clear_calls();
    let outcome = assert_ok!(orchestrator.refresh_current().await);
    assert_eq!(outcome.page, 1);
    assert_eq!(catalog.calls_for_page(1)[0].search.as_deref(), Some("SKU-00"));
}

#[tokio::test(start_paused = true)]
async fn refresh_after_deleting_the_last_page_moves_to_the_new_last_page() {
    let catalog = Arc::new(MockCatalog::new(products(25)));
    let orchestrator = orchestrator(&catalog);
    assert_ok!(orchestrator.load().await);
    assert_ok!(orchestrator.go_to_page(3).await);
    assert_eq!(orchestrator.view().await.rows.len(), 5);

    for id in 21..=25 {
        assert_ok!(orchestrator.delete_product(id).await);
    }

    let view = orchestrator.view().await;
    assert_eq!(view.mode, Some(PaginationMode::Bounded { total_pages: 2 }));
    assert_eq!(view.current_page, 2);
    assert_eq!(view.rows.len(), 10);
    assert_eq!(view.message, None);
    assert_eq!(orchestrator.filter().await.page, 2);
}

#[tokio::test(start_paused = true)]
async fn reset_forgets_filters_and_pending_input() {
    let catalog = Arc::new(MockCatalog::new(products(25)));
    let orchestrator = orchestrator(&catalog);
    assert_ok!(orchestrator.set_status_filter(Some(true)).await);
    orchestrator.on_search_input("SKU").await;

    orchestrator.reset().await;
    assert!(!orchestrator.is_search_pending().await);
    assert_eq!(orchestrator.filter().await, FilterState::default());
    assert!(orchestrator.view().await.rows.is_empty());

    sleep(Duration::from_secs(1)).await;
    settle().await;
    assert!(catalog.calls().iter().all(|c| c.search.is_none()));
}
