//! User-controlled filter state for the product list

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::constants::query::FIRST_PAGE;

/// Field the free-text search is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    Sku,
    Name,
    Description,
}

impl SearchType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sku => "sku",
            Self::Name => "name",
            Self::Description => "description",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sku" => Ok(Self::Sku),
            "name" => Ok(Self::Name),
            "description" => Ok(Self::Description),
            other => Err(format!("unknown search type: {other}")),
        }
    }
}

/// Current list filters plus the requested page.
///
/// Every setter that changes what is being searched resets `page` to 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub search_term: String,
    pub search_type: Option<SearchType>,
    pub status_filter: Option<bool>,
    pub page: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            search_type: None,
            status_filter: None,
            page: FIRST_PAGE,
        }
    }
}

impl FilterState {
    pub fn trimmed_term(&self) -> &str {
        self.search_term.trim()
    }

    /// True when a term was typed but is too short to be sent
    pub fn is_search_too_short(&self, min_len: usize) -> bool {
        let len = self.trimmed_term().chars().count();
        len > 0 && len < min_len
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.page = FIRST_PAGE;
    }

    pub fn set_search_type(&mut self, search_type: Option<SearchType>) {
        self.search_type = search_type;
        self.page = FIRST_PAGE;
    }

    pub fn set_status_filter(&mut self, status: Option<bool>) {
        self.status_filter = status;
        self.page = FIRST_PAGE;
    }

    /// Copy of this state pointing at another page
    #[must_use]
    pub fn at_page(&self, page: u32) -> Self {
        Self {
            page: page.max(FIRST_PAGE),
            ..self.clone()
        }
    }
}
