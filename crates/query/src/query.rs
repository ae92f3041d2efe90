//! Immutable query model.
//!
//! Every edit produces a new [`Query`]. Two queries are equal when they hold
//! the same multiset of tokens (order ignored), the same operation and the
//! same free-text search; a change in that equality resets pagination.

use serde::{Deserialize, Deserializer, Serialize};

use crate::filter::FilterToken;

/// How token groups are combined.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    #[default]
    And,
    Or,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    tokens: Vec<FilterToken>,
    operation: Operation,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "non_blank"
    )]
    text: Option<String>,
}

fn non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = Option::<String>::deserialize(deserializer)?;
    Ok(text.filter(|t| !t.trim().is_empty()))
}

impl Query {
    pub fn new(operation: Operation) -> Self {
        Self {
            tokens: Vec::new(),
            operation,
            text: None,
        }
    }

    pub fn from_tokens(tokens: Vec<FilterToken>, operation: Operation) -> Self {
        Self {
            tokens,
            operation,
            text: None,
        }
    }

    pub fn tokens(&self) -> &[FilterToken] {
        &self.tokens
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Free-text search, if any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.text.is_none()
    }

    pub fn with_token(mut self, token: FilterToken) -> Self {
        self.tokens.push(token);
        self
    }

    /// Remove the first token equal to `token`.
    pub fn without_token(mut self, token: &FilterToken) -> Self {
        if let Some(pos) = self.tokens.iter().position(|t| t == token) {
            self.tokens.remove(pos);
        }
        self
    }

    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    /// Set the free-text search; blank text clears it.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.text = if text.trim().is_empty() { None } else { Some(text) };
        self
    }

    fn sorted_tokens(&self) -> Vec<&FilterToken> {
        let mut tokens: Vec<&FilterToken> = self.tokens.iter().collect();
        tokens.sort();
        tokens
    }
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.operation == other.operation
            && self.text == other.text
            && self.tokens.len() == other.tokens.len()
            && self.sorted_tokens() == other.sorted_tokens()
    }
}

impl Eq for Query {}
