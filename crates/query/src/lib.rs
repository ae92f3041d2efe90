//! `console-query`: filtered, paginated, pollable resource lists.
//!
//! The synchronous state machines ([`FetchController`], [`TypeaheadLoader`],
//! [`CursorStack`], [`reconcile`]) hold every rule about ordering and
//! staleness. [`ResourceView`], [`TypeaheadPicker`] and [`Poller`] drive them
//! on tokio against an injected [`ResourceSource`].

pub mod config;
pub mod cursor;
pub mod fetch;
pub mod filter;
pub mod picker;
pub mod poll;
pub mod query;
pub mod selection;
pub mod source;
pub mod state;
pub mod typeahead;
pub mod view;

#[cfg(test)]
mod testing;

pub use config::ConsoleConfig;
pub use cursor::{CursorStack, PageCursor};
pub use fetch::{FetchController, FetchRequest, Resolution, Sort};
pub use filter::{
    BackendQuery, Condition, FieldGroup, FieldMapping, FilterOperator, FilterToken,
    FilterTranslator, TranslatorRegistry,
};
pub use picker::TypeaheadPicker;
pub use poll::Poller;
pub use query::{Operation, Query};
pub use selection::{Reconciled, Selection, SelectionItemRemoved, reconcile};
pub use source::{FetchError, FetchPage, FetchParams, ResourceSource, collect_all};
pub use state::{FetchState, SelectState, SelectStatus};
pub use typeahead::{SearchRequest, SearchTicket, TypeaheadLoader};
pub use view::{Pollable, ResourceView, ViewOutcome};
