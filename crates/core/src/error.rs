//! Console error model.

use thiserror::Error;

use crate::resource::ResourceKind;

/// Result type used across the console core.
pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Programmer/caller errors raised before anything reaches the network.
///
/// Backend failures are not represented here; they are recoverable and live
/// in view state instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// A filter token used a property key missing from the kind's table.
    #[error("unknown filter key `{key}` for {kind}")]
    UnknownFilterKey { kind: ResourceKind, key: String },

    /// Page indexes are 1-based.
    #[error("invalid page index: {0}")]
    InvalidPage(usize),

    /// No cursor has been recorded for the page yet.
    #[error("page {requested} is not reachable (last known page is {known})")]
    PageNotReachable { requested: usize, known: usize },

    /// Page size must be at least one.
    #[error("invalid page size: {0}")]
    InvalidPageSize(u32),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A configuration value failed to parse.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ConsoleError {
    pub fn unknown_filter_key(kind: ResourceKind, key: impl Into<String>) -> Self {
        Self::UnknownFilterKey {
            kind,
            key: key.into(),
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
