//! Pagination mode selection and page-window layout.
//!
//! Responsibility:
//! - choose Bounded (exact total known) or Unbounded ("load more") rendering
//! - decide whether incoming rows replace or extend the visible set
//! - lay out the numbered page links for Bounded mode

use serde::{Deserialize, Serialize};

use crate::domain::constants::query::{FIRST_PAGE, PAGE_WINDOW};
use crate::domain::product::PageResult;

/// How the list is paginated for the current result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PaginationMode {
    Bounded { total_pages: u32 },
    Unbounded { has_more: bool },
}

impl PaginationMode {
    /// Picks the mode from the response shape
    pub fn select(result: &PageResult, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        match result.total_count {
            Some(total) => {
                let pages = total.div_ceil(u64::from(page_size));
                Self::Bounded {
                    total_pages: u32::try_from(pages).unwrap_or(u32::MAX),
                }
            }
            None => Self::Unbounded {
                has_more: result.items.len() == page_size as usize,
            },
        }
    }

    pub const fn is_bounded(&self) -> bool {
        matches!(self, Self::Bounded { .. })
    }

    /// Whether a page after `current_page` exists
    pub const fn has_next(&self, current_page: u32) -> bool {
        match *self {
            Self::Bounded { total_pages } => current_page < total_pages,
            Self::Unbounded { has_more } => has_more,
        }
    }
}

/// What to do with the rows already on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderStrategy {
    Replace,
    Append,
}

impl RenderStrategy {
    /// Rows are appended only for a "load more" continuation: the previous and
    /// the new result are both Unbounded and the request targets page > 1.
    /// Any mode switch, and every Bounded result, replaces.
    pub fn decide(previous: Option<PaginationMode>, next: PaginationMode, page: u32, continuation: bool) -> Self {
        match (previous, next) {
            (Some(PaginationMode::Unbounded { .. }), PaginationMode::Unbounded { .. })
                if continuation && page > FIRST_PAGE =>
            {
                Self::Append
            }
            _ => Self::Replace,
        }
    }
}

/// One entry of the rendered page window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageLink {
    Page(u32),
    Ellipsis,
}

/// Numbered page links plus prev/next availability for Bounded mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    pub links: Vec<PageLink>,
    pub current_page: u32,
    pub total_pages: u32,
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

impl PageWindow {
    pub fn new(current_page: u32, total_pages: u32) -> Self {
        Self::with_window(current_page, total_pages, PAGE_WINDOW)
    }

    pub fn with_window(current_page: u32, total_pages: u32, window: u32) -> Self {
        let current = current_page.clamp(FIRST_PAGE, total_pages.max(FIRST_PAGE));
        Self {
            links: page_links(current, total_pages, window),
            current_page: current,
            total_pages,
            prev_enabled: current > FIRST_PAGE,
            next_enabled: current < total_pages,
        }
    }

    pub fn is_current(&self, link: PageLink) -> bool {
        link == PageLink::Page(self.current_page)
    }
}

/// Lays out `1 … (current-window ..= current+window) … last`.
///
/// The window is clamped to `[2, total-1]`; an ellipsis marks any gap between
/// it and the fixed endpoints. The result never repeats a page.
pub fn page_links(current_page: u32, total_pages: u32, window: u32) -> Vec<PageLink> {
    if total_pages == 0 {
        return Vec::new();
    }
    let current = current_page.clamp(FIRST_PAGE, total_pages);
    let mut links = vec![PageLink::Page(FIRST_PAGE)];

    if total_pages > 2 {
        let start = current.saturating_sub(window).max(2);
        let end = current.saturating_add(window).min(total_pages - 1);

        if start > 2 {
            links.push(PageLink::Ellipsis);
        }
        links.extend((start..=end).map(PageLink::Page));
        if end < total_pages - 1 {
            links.push(PageLink::Ellipsis);
        }
    }

    links.push(PageLink::Page(total_pages));
    links.dedup();
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::Product;
    use proptest::prelude::*;
    use rstest::rstest;
    use PageLink::{Ellipsis, Page};

    fn rows(n: usize) -> Vec<Product> {
        (0..n)
            .map(|i| Product {
                id: i as i64,
                sku: format!("SKU-{i}"),
                name: format!("Product {i}"),
                description: None,
                active: true,
                created_at: None,
                updated_at: None,
            })
            .collect()
    }

    #[test]
    fn window_for_page_five_of_ten() {
        assert_eq!(
            page_links(5, 10, 2),
            vec![Page(1), Ellipsis, Page(3), Page(4), Page(5), Page(6), Page(7), Ellipsis, Page(10)]
        );
    }

    #[rstest]
    #[case(1, 1, vec![Page(1)])]
    #[case(1, 2, vec![Page(1), Page(2)])]
    #[case(2, 3, vec![Page(1), Page(2), Page(3)])]
    #[case(1, 10, vec![Page(1), Page(2), Page(3), Ellipsis, Page(10)])]
    #[case(3, 10, vec![Page(1), Page(2), Page(3), Page(4), Page(5), Ellipsis, Page(10)])]
    #[case(4, 10, vec![Page(1), Page(2), Page(3), Page(4), Page(5), Page(6), Ellipsis, Page(10)])]
    #[case(10, 10, vec![Page(1), Ellipsis, Page(8), Page(9), Page(10)])]
    #[case(7, 7, vec![Page(1), Ellipsis, Page(5), Page(6), Page(7)])]
    fn window_edges(#[case] current: u32, #[case] total: u32, #[case] expected: Vec<PageLink>) {
        assert_eq!(page_links(current, total, 2), expected);
    }

    #[test]
    fn empty_result_has_no_links() {
        assert!(page_links(1, 0, 2).is_empty());
        let window = PageWindow::new(1, 0);
        assert!(!window.prev_enabled);
        assert!(!window.next_enabled);
    }

    #[test]
    fn navigation_is_disabled_at_the_edges() {
        let first = PageWindow::new(1, 5);
        assert!(!first.prev_enabled);
        assert!(first.next_enabled);
        assert!(first.is_current(Page(1)));

        let last = PageWindow::new(5, 5);
        assert!(last.prev_enabled);
        assert!(!last.next_enabled);
    }

    #[test]
    fn bounded_mode_rounds_total_pages_up() {
        let result = PageResult::new(rows(20), Some(41));
        assert_eq!(PaginationMode::select(&result, 20), PaginationMode::Bounded { total_pages: 3 });
        let empty = PageResult::new(vec![], Some(0));
        assert_eq!(PaginationMode::select(&empty, 20), PaginationMode::Bounded { total_pages: 0 });
    }

    #[test]
    fn unbounded_has_more_only_on_full_page() {
        let full = PageResult::new(rows(20), None);
        assert_eq!(PaginationMode::select(&full, 20), PaginationMode::Unbounded { has_more: true });
        let short = PageResult::new(rows(19), None);
        assert_eq!(PaginationMode::select(&short, 20), PaginationMode::Unbounded { has_more: false });
    }

    #[test]
    fn mode_switches_always_replace() {
        let bounded = PaginationMode::Bounded { total_pages: 4 };
        let unbounded = PaginationMode::Unbounded { has_more: true };
        assert_eq!(RenderStrategy::decide(Some(bounded), unbounded, 2, true), RenderStrategy::Replace);
        assert_eq!(RenderStrategy::decide(Some(unbounded), bounded, 2, true), RenderStrategy::Replace);
        assert_eq!(RenderStrategy::decide(Some(unbounded), unbounded, 2, true), RenderStrategy::Append);
        assert_eq!(RenderStrategy::decide(Some(unbounded), unbounded, 1, true), RenderStrategy::Replace);
        assert_eq!(RenderStrategy::decide(Some(unbounded), unbounded, 2, false), RenderStrategy::Replace);
        assert_eq!(RenderStrategy::decide(None, unbounded, 2, true), RenderStrategy::Replace);
    }

    proptest! {
        #[test]
        fn links_are_ordered_and_unique(total in 1u32..200, current in 1u32..200) {
            let links = page_links(current, total, 2);
            let pages: Vec<u32> = links.iter().filter_map(|l| match l { Page(p) => Some(*p), Ellipsis => None }).collect();
            prop_assert!(pages.windows(2).all(|w| w[0] < w[1]));
            prop_assert_eq!(pages.first().copied(), Some(1));
            prop_assert_eq!(pages.last().copied(), Some(total));
            prop_assert!(pages.contains(&current.min(total)));
            prop_assert!(!links.windows(2).any(|w| w[0] == Ellipsis && w[1] == Ellipsis));
        }
    }
}
