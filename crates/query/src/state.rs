//! Read-only snapshots handed to the UI layer.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Snapshot of one list view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchState<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: bool,
    pub error_message: Option<String>,
    pub next_token: Option<String>,
    pub total_count: Option<u64>,
    /// 1-based page the view is on.
    pub current_page_index: usize,
    /// Generation of the latest issued request.
    pub generation: u64,
    /// Generation whose response produced `items` (0 before the first success).
    pub applied_generation: u64,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl<T> FetchState<T> {
    pub fn has_next(&self) -> bool {
        self.next_token.is_some()
    }
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: false,
            error_message: None,
            next_token: None,
            total_count: None,
            current_page_index: 1,
            generation: 0,
            applied_generation: 0,
            fetched_at: None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectStatus {
    /// Nothing searched yet.
    Pending,
    Loading,
    Finished,
    Error,
}

/// Snapshot of one typeahead picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectState<T> {
    pub options: Vec<T>,
    pub status: SelectStatus,
    pub error_message: Option<String>,
    pub search_generation: u64,
    pub filtering_text: String,
    /// The last response carried a next token.
    pub has_more: bool,
}

impl<T> SelectState<T> {
    /// A finished search that matched nothing.
    pub fn is_empty_result(&self) -> bool {
        self.status == SelectStatus::Finished && self.options.is_empty()
    }
}

impl<T> Default for SelectState<T> {
    fn default() -> Self {
        Self {
            options: Vec::new(),
            status: SelectStatus::Pending,
            error_message: None,
            search_generation: 0,
            filtering_text: String::new(),
            has_more: false,
        }
    }
}
