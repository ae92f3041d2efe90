//! Page cursor stack for opaque "next token" pagination.
//!
//! The backend only ever hands back a forward cursor, so every cursor seen is
//! kept: going back to page `n - 1` reads the recorded token instead of
//! re-deriving it.

use console_core::{ConsoleError, ConsoleResult};
use serde::{Deserialize, Serialize};

/// Cursor that fetches page `index` (1-based). Page 1 has no token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCursor {
    pub token: Option<String>,
    pub index: usize,
}

impl PageCursor {
    pub fn first() -> Self {
        Self {
            token: None,
            index: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CursorStack {
    /// `tokens[i]` fetches page `i + 1`; `tokens[0]` is always `None`.
    tokens: Vec<Option<String>>,
    current: usize,
    has_next: bool,
}

impl CursorStack {
    pub fn new() -> Self {
        Self {
            tokens: vec![None],
            current: 1,
            has_next: false,
        }
    }

    /// Forget every cursor and go back to page 1.
    pub fn reset(&mut self) {
        self.tokens.truncate(1);
        self.current = 1;
        self.has_next = false;
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Highest page index with a known cursor.
    pub fn known_pages(&self) -> usize {
        self.tokens.len()
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn cursor_for(&self, index: usize) -> Option<PageCursor> {
        if index == 0 {
            return None;
        }
        self.tokens.get(index - 1).map(|token| PageCursor {
            token: token.clone(),
            index,
        })
    }

    pub fn current(&self) -> PageCursor {
        self.cursor_for(self.current).unwrap_or_else(PageCursor::first)
    }

    /// Move to a page whose cursor is already known.
    pub fn seek(&mut self, index: usize) -> ConsoleResult<PageCursor> {
        if index == 0 {
            return Err(ConsoleError::InvalidPage(index));
        }
        let cursor = self
            .cursor_for(index)
            .ok_or(ConsoleError::PageNotReachable {
                requested: index,
                known: self.known_pages(),
            })?;
        self.current = index;
        self.has_next = self.tokens.len() > index;
        Ok(cursor)
    }

    /// Record the next token returned by the fetch of page `index`.
    ///
    /// A token that differs from the cached one for `index + 1` drops every
    /// cursor past `index`; pages up to `index` are never touched. A `None`
    /// token marks `index` as the last page.
    pub fn record(&mut self, index: usize, next_token: Option<String>) {
        if index == 0 || index > self.tokens.len() {
            tracing::warn!(index, known = self.tokens.len(), "ignoring cursor for unknown page");
            return;
        }

        self.current = index;
        match next_token {
            Some(token) => {
                let unchanged = matches!(self.tokens.get(index), Some(Some(cached)) if *cached == token);
                if !unchanged {
                    self.tokens.truncate(index);
                    self.tokens.push(Some(token));
                }
                self.has_next = true;
            }
            None => {
                self.tokens.truncate(index);
                self.has_next = false;
            }
        }
    }
}

impl Default for CursorStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tok(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn first_page_cursor_is_always_null() {
        let mut stack = CursorStack::new();
        assert_eq!(stack.cursor_for(1), Some(PageCursor::first()));
        stack.record(1, tok("t2"));
        stack.record(2, tok("t3"));
        assert_eq!(stack.cursor_for(1).unwrap().token, None);
        assert_eq!(stack.known_pages(), 3);
    }

    #[test]
    fn backward_then_forward_reuses_cached_token() {
        let mut stack = CursorStack::new();
        stack.record(1, tok("t2"));
        let page2 = stack.seek(2).unwrap();
        assert_eq!(page2.token.as_deref(), Some("t2"));
        stack.record(2, tok("t3"));

        let back = stack.seek(1).unwrap();
        assert_eq!(back.token, None);
        assert!(stack.has_next());

        let forward = stack.seek(2).unwrap();
        assert_eq!(forward, page2);
        assert_eq!(stack.known_pages(), 3);
    }

    #[test]
    fn unknown_pages_are_not_reachable() {
        let mut stack = CursorStack::new();
        assert_eq!(stack.seek(0), Err(ConsoleError::InvalidPage(0)));
        assert_eq!(
            stack.seek(2),
            Err(ConsoleError::PageNotReachable {
                requested: 2,
                known: 1
            })
        );
    }

    #[test]
    fn diverging_token_truncates_only_forward_history() {
        let mut stack = CursorStack::new();
        stack.record(1, tok("t2"));
        stack.record(2, tok("t3"));
        stack.record(3, tok("t4"));
        assert_eq!(stack.known_pages(), 4);

        stack.seek(2).unwrap();
        stack.record(2, tok("t3-new"));

        assert_eq!(stack.known_pages(), 3);
        assert_eq!(stack.cursor_for(2).unwrap().token.as_deref(), Some("t2"));
        assert_eq!(stack.cursor_for(3).unwrap().token.as_deref(), Some("t3-new"));
        assert!(stack.cursor_for(4).is_none());
    }

    #[test]
    fn identical_token_keeps_forward_history() {
        let mut stack = CursorStack::new();
        stack.record(1, tok("t2"));
        stack.record(2, tok("t3"));
        stack.seek(1).unwrap();
        stack.record(1, tok("t2"));
        assert_eq!(stack.known_pages(), 3);
    }

    #[test]
    fn null_token_marks_last_page() {
        let mut stack = CursorStack::new();
        stack.record(1, tok("t2"));
        stack.seek(2).unwrap();
        stack.record(2, None);
        assert!(!stack.has_next());
        assert_eq!(stack.known_pages(), 2);
    }

    #[test]
    fn reset_returns_to_first_page() {
        let mut stack = CursorStack::new();
        stack.record(1, tok("t2"));
        stack.seek(2).unwrap();
        stack.reset();
        assert_eq!(stack.current_index(), 1);
        assert_eq!(stack.known_pages(), 1);
        assert!(!stack.has_next());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: after walking forward through `n` pages, every earlier
        /// page resolves to the token recorded for it, and page 1 to null.
        #[test]
        fn walked_pages_resolve_to_recorded_tokens(n in 1usize..12, back_to in 1usize..12) {
            let mut stack = CursorStack::new();
            for page in 1..=n {
                stack.seek(page).unwrap();
                stack.record(page, Some(format!("t{}", page + 1)));
            }

            let target = back_to.min(n);
            let cursor = stack.seek(target).unwrap();
            if target == 1 {
                prop_assert_eq!(cursor.token, None);
            } else {
                prop_assert_eq!(cursor.token, Some(format!("t{}", target)));
            }
            prop_assert_eq!(stack.cursor_for(1).unwrap().token, None);
            prop_assert_eq!(stack.known_pages(), n + 1);
        }
    }
}
