//! Orchestrator-level error kinds

use thiserror::Error;

use crate::infrastructure::http_client::ApiError;

/// Outcome kinds of a query resolution that did not produce rows.
///
/// Only `Network` and `StreamLost` are failures from the user's point of view;
/// `Canceled` is swallowed and `SearchTooShort` renders as guidance text.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Superseded by a newer request; never shown
    #[error("Request superseded by a newer query")]
    Canceled,

    #[error("Network failure: {0}")]
    Network(#[source] ApiError),

    #[error("Search term shorter than {min_len} characters")]
    SearchTooShort { min_len: usize },

    #[error("Progress stream lost: {0}")]
    StreamLost(String),
}

impl QueryError {
    pub const fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}

impl From<ApiError> for QueryError {
    fn from(err: ApiError) -> Self {
        if err.is_cancelled() {
            Self::Canceled
        } else {
            Self::Network(err)
        }
    }
}
