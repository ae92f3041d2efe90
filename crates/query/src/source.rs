//! The fetch boundary.
//!
//! A [`ResourceSource`] is supplied by the caller (usually backed by the REST
//! API) and treated as opaque, possibly slow and possibly failing I/O.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::BackendQuery;

/// Parameters of one page request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchParams {
    pub query: BackendQuery,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtering_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorting_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorting_descending: Option<bool>,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchPage<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub next_token: Option<String>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub current_page_index: Option<usize>,
}

impl<T> FetchPage<T> {
    pub fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        Self {
            items,
            next_token,
            total_count: None,
            current_page_index: None,
        }
    }

    pub fn with_total_count(mut self, total: u64) -> Self {
        self.total_count = Some(total);
        self
    }
}

/// Recoverable failure at the fetch boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("decode error: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Text shown to the user; for API errors this is the server's message.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[async_trait::async_trait]
pub trait ResourceSource<T>: Send + Sync {
    async fn fetch(&self, params: FetchParams) -> Result<FetchPage<T>, FetchError>;
}

/// Follow `next_token` until the result set is exhausted.
///
/// Returns `Ok(None)` when more than `max_pages` pages would be needed; the
/// caller then has no complete universe and must not treat the partial list
/// as one.
pub async fn collect_all<T, S>(
    source: &S,
    mut params: FetchParams,
    max_pages: usize,
) -> Result<Option<Vec<T>>, FetchError>
where
    S: ResourceSource<T> + ?Sized,
{
    params.next_token = None;
    let mut items = Vec::new();

    for _ in 0..max_pages {
        let page = source.fetch(params.clone()).await?;
        items.extend(page.items);
        match page.next_token {
            Some(token) => params.next_token = Some(token),
            None => return Ok(Some(items)),
        }
    }

    tracing::debug!(max_pages, "result set exceeds page bound");
    Ok(None)
}
