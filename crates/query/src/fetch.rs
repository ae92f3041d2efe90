//! Resource fetch controller.
//!
//! Synchronous state machine behind one list view. Every user intent (query
//! change, page change, refresh, poll tick) issues a [`FetchRequest`] stamped
//! with a fresh generation; [`FetchController::resolve`] applies a response
//! only when its generation is the latest one issued. Older responses are
//! dropped whatever order they arrive in. Nothing is aborted at the transport
//! level.

use std::sync::Arc;

use chrono::Utc;
use console_core::{ConsoleError, ConsoleResult, ResourceKind, ViewId};

use crate::cursor::CursorStack;
use crate::filter::{BackendQuery, FilterTranslator};
use crate::query::Query;
use crate::source::{FetchError, FetchPage, FetchParams};
use crate::state::FetchState;

/// Server-side sort order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub column: String,
    pub descending: bool,
}

impl Sort {
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

/// A request the driver must send to the source.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub generation: u64,
    pub page_index: usize,
    pub params: FetchParams,
}

/// What happened to a resolved response.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Success, now displayed.
    Applied,
    /// Failure, recorded as the view's error; previous items kept.
    Failed,
    /// Superseded by a newer request and discarded.
    Stale,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    generation: u64,
    page_index: usize,
}

pub struct FetchController<T> {
    view_id: ViewId,
    translator: Arc<FilterTranslator>,
    query: Query,
    backend_query: BackendQuery,
    page_size: u32,
    sort: Option<Sort>,
    cursors: CursorStack,
    state: FetchState<T>,
    in_flight: Option<InFlight>,
    stale_discarded: u64,
}

impl<T> FetchController<T> {
    pub fn new(translator: Arc<FilterTranslator>, page_size: u32) -> ConsoleResult<Self> {
        if page_size == 0 {
            return Err(ConsoleError::InvalidPageSize(page_size));
        }
        Ok(Self {
            view_id: ViewId::new(),
            translator,
            query: Query::default(),
            backend_query: BackendQuery::default(),
            page_size,
            sort: None,
            cursors: CursorStack::new(),
            state: FetchState::default(),
            in_flight: None,
            stale_discarded: 0,
        })
    }

    pub fn view_id(&self) -> ViewId {
        self.view_id
    }

    pub fn kind(&self) -> ResourceKind {
        self.translator.kind()
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    pub fn cursors(&self) -> &CursorStack {
        &self.cursors
    }

    pub fn current_state(&self) -> &FetchState<T> {
        &self.state
    }

    /// Responses dropped because a newer request had been issued.
    pub fn stale_discarded(&self) -> u64 {
        self.stale_discarded
    }

    /// Apply a new query/page size/sort.
    ///
    /// Unknown filter keys fail here and leave the view untouched. Any change
    /// resets pagination to page 1; an unchanged configuration re-fetches the
    /// current page.
    pub fn configure(
        &mut self,
        query: Query,
        page_size: u32,
        sort: Option<Sort>,
    ) -> ConsoleResult<FetchRequest> {
        if page_size == 0 {
            return Err(ConsoleError::InvalidPageSize(page_size));
        }
        let backend_query = self.translator.translate_query(&query)?;

        let changed = query != self.query || page_size != self.page_size || sort != self.sort;
        self.query = query;
        self.backend_query = backend_query;
        self.page_size = page_size;
        self.sort = sort;

        if changed {
            self.cursors.reset();
        }
        Ok(self.issue())
    }

    pub fn set_query(&mut self, query: Query) -> ConsoleResult<FetchRequest> {
        let sort = self.sort.clone();
        self.configure(query, self.page_size, sort)
    }

    pub fn set_page_size(&mut self, page_size: u32) -> ConsoleResult<FetchRequest> {
        let (query, sort) = (self.query.clone(), self.sort.clone());
        self.configure(query, page_size, sort)
    }

    pub fn set_sort(&mut self, sort: Option<Sort>) -> ConsoleResult<FetchRequest> {
        let query = self.query.clone();
        self.configure(query, self.page_size, sort)
    }

    /// Move to a visited page, or the page right after the last fetched one.
    pub fn go_to_page(&mut self, index: usize) -> ConsoleResult<FetchRequest> {
        self.cursors.seek(index)?;
        Ok(self.issue())
    }

    /// Re-fetch the current page under a new generation.
    pub fn refresh(&mut self) -> FetchRequest {
        self.issue()
    }

    /// Parameters for page 1 of the whole collection, ignoring the active
    /// filter, search text and sort. Used to build the selection universe.
    pub fn universe_params(&self) -> FetchParams {
        FetchParams {
            page_size: self.page_size,
            ..FetchParams::default()
        }
    }

    fn params_for(&self, next_token: Option<String>) -> FetchParams {
        FetchParams {
            query: self.backend_query.clone(),
            filtering_text: self.query.text().map(str::to_string),
            next_token,
            page_size: self.page_size,
            sorting_column: self.sort.as_ref().map(|s| s.column.clone()),
            sorting_descending: self.sort.as_ref().map(|s| s.descending),
        }
    }

    fn issue(&mut self) -> FetchRequest {
        self.state.generation += 1;
        let generation = self.state.generation;
        let cursor = self.cursors.current();

        self.state.loading = true;
        self.state.current_page_index = cursor.index;
        self.in_flight = Some(InFlight {
            generation,
            page_index: cursor.index,
        });

        tracing::debug!(
            view_id = %self.view_id,
            kind = %self.kind(),
            generation,
            page = cursor.index,
            "issuing fetch"
        );

        FetchRequest {
            generation,
            page_index: cursor.index,
            params: self.params_for(cursor.token),
        }
    }

    /// Resolve the response of the request stamped `generation`.
    pub fn resolve(
        &mut self,
        generation: u64,
        result: Result<FetchPage<T>, FetchError>,
    ) -> Resolution {
        let in_flight = match self.in_flight {
            Some(req) if req.generation == generation => req,
            _ => {
                self.stale_discarded += 1;
                tracing::debug!(
                    view_id = %self.view_id,
                    kind = %self.kind(),
                    generation,
                    latest = self.state.generation,
                    "StaleResponseDiscarded"
                );
                return Resolution::Stale;
            }
        };
        self.in_flight = None;
        self.state.loading = false;

        match result {
            Ok(page) => {
                self.cursors.record(in_flight.page_index, page.next_token.clone());
                self.state.items = page.items;
                self.state.next_token = page.next_token;
                self.state.total_count = page.total_count;
                self.state.error = false;
                self.state.error_message = None;
                self.state.applied_generation = generation;
                self.state.fetched_at = Some(Utc::now());
                Resolution::Applied
            }
            Err(err) => {
                tracing::warn!(
                    view_id = %self.view_id,
                    kind = %self.kind(),
                    generation,
                    error = %err,
                    "fetch failed"
                );
                // Items stay from the last success, but paging follows the
                // page that was requested.
                self.state.next_token = self
                    .cursors
                    .cursor_for(in_flight.page_index + 1)
                    .and_then(|cursor| cursor.token);
                self.state.error = true;
                self.state.error_message = Some(err.user_message());
                Resolution::Failed
            }
        }
    }
}

impl<T: Clone> FetchController<T> {
    pub fn snapshot(&self) -> FetchState<T> {
        self.state.clone()
    }
}
