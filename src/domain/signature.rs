//! Canonical query fingerprint for a filter + page combination
//!
//! Two filter states that produce the same signature ask the backend the same
//! question, so the signature doubles as the prefetch cache key and as the
//! query string sent on the wire.

use std::fmt;

use crate::domain::constants::query::{DEFAULT_PAGE_SIZE, MIN_SEARCH_LENGTH};
use crate::domain::filter::{FilterState, SearchType};

/// Derived list-query parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuerySignature {
    pub skip: u64,
    pub limit: u32,
    pub search: Option<String>,
    pub search_type: Option<SearchType>,
    pub active: Option<bool>,
}

impl QuerySignature {
    /// Signature for `filter.page` with the default search threshold
    pub fn build(filter: &FilterState, page_size: u32) -> Self {
        SignatureBuilder::new(page_size, MIN_SEARCH_LENGTH).build(filter)
    }

    /// Query-string pairs in a fixed order
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("skip", self.skip.to_string()), ("limit", self.limit.to_string())];
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
            pairs.push(("search_type", self.search_type.unwrap_or_default().to_string()));
        }
        if let Some(active) = self.active {
            pairs.push(("active", active.to_string()));
        }
        pairs
    }

    /// 1-based page this signature points at
    pub fn page(&self) -> u32 {
        if self.limit == 0 {
            return 1;
        }
        u32::try_from(self.skip / u64::from(self.limit)).map_or(u32::MAX, |p| p.saturating_add(1))
    }

    pub fn has_search(&self) -> bool {
        self.search.is_some()
    }
}

impl fmt::Display for QuerySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query_pairs())
            .finish();
        f.write_str(&encoded)
    }
}

/// Builds signatures with a fixed page size and search threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureBuilder {
    page_size: u32,
    min_search_len: usize,
}

impl Default for SignatureBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, MIN_SEARCH_LENGTH)
    }
}

impl SignatureBuilder {
    pub fn new(page_size: u32, min_search_len: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            min_search_len,
        }
    }

    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    pub const fn min_search_len(&self) -> usize {
        self.min_search_len
    }

    /// Derives the signature for `filter.page`.
    ///
    /// A trimmed term below the threshold drops search parameters entirely, which
    /// is the same as browsing everything.
    pub fn build(&self, filter: &FilterState) -> QuerySignature {
        let page = u64::from(filter.page.max(1));
        let term = filter.trimmed_term();
        let searchable = term.chars().count() >= self.min_search_len && !term.is_empty();

        QuerySignature {
            skip: (page - 1) * u64::from(self.page_size),
            limit: self.page_size,
            search: searchable.then(|| term.to_string()),
            search_type: searchable.then(|| filter.search_type.unwrap_or_default()),
            active: filter.status_filter,
        }
    }
}
