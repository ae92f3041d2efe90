//! Typeahead loader for multi-select pickers.
//!
//! Each keystroke bumps the search generation right away, so a response to
//! any earlier search (or load-more) is discarded when it lands. Dispatch is
//! split from the keystroke: the driver waits out the debounce window and
//! calls [`TypeaheadLoader::dispatch`], which refuses tickets that have been
//! superseded in the meantime.

use std::collections::HashSet;
use std::sync::Arc;

use console_core::{ConsoleResult, Entity, PickerId};

use crate::fetch::Resolution;
use crate::filter::{BackendQuery, FilterTranslator};
use crate::query::Query;
use crate::source::{FetchError, FetchPage, FetchParams};
use crate::state::{SelectState, SelectStatus};

/// Handed out on every input change; redeemed after the debounce window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub generation: u64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub generation: u64,
    /// Load-more requests append instead of replacing.
    pub append: bool,
    pub params: FetchParams,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    generation: u64,
    append: bool,
}

pub struct TypeaheadLoader<T> {
    picker_id: PickerId,
    translator: Arc<FilterTranslator>,
    base_query: BackendQuery,
    page_size: u32,
    next_token: Option<String>,
    in_flight: Option<InFlight>,
    state: SelectState<T>,
    stale_discarded: u64,
}

impl<T> TypeaheadLoader<T> {
    /// `base` narrows every search (e.g. exclude current group members).
    pub fn new(
        translator: Arc<FilterTranslator>,
        base: &Query,
        page_size: u32,
    ) -> ConsoleResult<Self> {
        if page_size == 0 {
            return Err(console_core::ConsoleError::InvalidPageSize(page_size));
        }
        let base_query = translator.translate_query(base)?;
        Ok(Self {
            picker_id: PickerId::new(),
            translator,
            base_query,
            page_size,
            next_token: None,
            in_flight: None,
            state: SelectState::default(),
            stale_discarded: 0,
        })
    }

    pub fn picker_id(&self) -> PickerId {
        self.picker_id
    }

    pub fn state(&self) -> &SelectState<T> {
        &self.state
    }

    pub fn stale_discarded(&self) -> u64 {
        self.stale_discarded
    }

    /// Record a keystroke. Supersedes any search or load-more in flight.
    pub fn on_input_change(&mut self, text: impl Into<String>) -> SearchTicket {
        let text = text.into();
        self.state.search_generation += 1;
        self.state.status = SelectStatus::Loading;
        self.state.filtering_text = text.clone();
        self.in_flight = None;

        SearchTicket {
            generation: self.state.search_generation,
            text,
        }
    }

    /// Turn a ticket into a first-page request, unless a newer keystroke
    /// arrived during the debounce window.
    pub fn dispatch(&mut self, ticket: &SearchTicket) -> Option<SearchRequest> {
        if ticket.generation != self.state.search_generation {
            tracing::trace!(
                picker_id = %self.picker_id,
                generation = ticket.generation,
                "search debounced away"
            );
            return None;
        }

        self.in_flight = Some(InFlight {
            generation: ticket.generation,
            append: false,
        });
        let filtering_text = (!ticket.text.is_empty()).then(|| ticket.text.clone());
        Some(self.request(ticket.generation, false, filtering_text, None))
    }

    /// Next page of suggestions for the current text.
    ///
    /// Only a finished search with a next token can load more; anything else
    /// (in particular a search still loading) is a no-op.
    pub fn on_load_more(&mut self) -> Option<SearchRequest> {
        if self.state.status != SelectStatus::Finished {
            return None;
        }
        let token = self.next_token.clone()?;

        self.state.search_generation += 1;
        self.state.status = SelectStatus::Loading;
        let generation = self.state.search_generation;
        self.in_flight = Some(InFlight {
            generation,
            append: true,
        });

        let filtering_text =
            (!self.state.filtering_text.is_empty()).then(|| self.state.filtering_text.clone());
        Some(self.request(generation, true, filtering_text, Some(token)))
    }

    fn request(
        &self,
        generation: u64,
        append: bool,
        filtering_text: Option<String>,
        next_token: Option<String>,
    ) -> SearchRequest {
        tracing::debug!(
            picker_id = %self.picker_id,
            kind = %self.translator.kind(),
            generation,
            append,
            "issuing search"
        );
        SearchRequest {
            generation,
            append,
            params: FetchParams {
                query: self.base_query.clone(),
                filtering_text,
                next_token,
                page_size: self.page_size,
                sorting_column: None,
                sorting_descending: None,
            },
        }
    }
}

impl<T: Entity> TypeaheadLoader<T> {
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
                    picker_id = %self.picker_id,
                    generation,
                    latest = self.state.search_generation,
                    "StaleResponseDiscarded"
                );
                return Resolution::Stale;
            }
        };
        self.in_flight = None;

        match result {
            Ok(page) => {
                if in_flight.append {
                    let seen: HashSet<T::Id> =
                        self.state.options.iter().map(|o| o.id().clone()).collect();
                    self.state
                        .options
                        .extend(page.items.into_iter().filter(|o| !seen.contains(o.id())));
                } else {
                    self.state.options = page.items;
                }
                self.next_token = page.next_token;
                self.state.has_more = self.next_token.is_some();
                self.state.status = SelectStatus::Finished;
                self.state.error_message = None;
                Resolution::Applied
            }
            Err(err) => {
                tracing::warn!(
                    picker_id = %self.picker_id,
                    generation,
                    error = %err,
                    "search failed"
                );
                self.state.status = SelectStatus::Error;
                self.state.error_message = Some(err.user_message());
                Resolution::Failed
            }
        }
    }
}

impl<T: Clone> TypeaheadLoader<T> {
    pub fn snapshot(&self) -> SelectState<T> {
        self.state.clone()
    }
}
