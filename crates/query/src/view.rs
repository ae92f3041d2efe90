//! Async driver for one list view.
//!
//! Wraps a [`FetchController`] and the view's [`Selection`] behind a mutex
//! that is never held across an `.await`: the fetch is the only suspension
//! point. Overlapping calls (user refresh racing a poll tick racing a filter
//! change) are all allowed; the controller's generation check decides which
//! response is shown. Snapshots are published on a `watch` channel for the UI.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use console_core::{ConsoleResult, Entity, ResourceKind, ViewId};
use tokio::sync::watch;

use crate::config::ConsoleConfig;
use crate::fetch::{FetchController, FetchRequest, Resolution, Sort};
use crate::filter::FilterTranslator;
use crate::query::Query;
use crate::selection::{Selection, SelectionItemRemoved, reconcile};
use crate::source::{ResourceSource, collect_all};
use crate::state::FetchState;

/// Result of one view operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewOutcome<Id> {
    pub resolution: Resolution,
    /// Selected items dropped because they no longer exist.
    pub removed: Vec<SelectionItemRemoved<Id>>,
}

struct Inner<T: Entity> {
    controller: FetchController<T>,
    selection: Selection<T>,
}

pub struct ResourceView<T: Entity, S> {
    source: Arc<S>,
    inner: Mutex<Inner<T>>,
    tx: watch::Sender<FetchState<T>>,
    max_universe_pages: usize,
}

impl<T, S> ResourceView<T, S>
where
    T: Entity + Clone + Send + Sync + 'static,
    S: ResourceSource<T> + 'static,
{
    pub fn new(
        source: Arc<S>,
        translator: Arc<FilterTranslator>,
        config: &ConsoleConfig,
    ) -> ConsoleResult<Self> {
        let controller = FetchController::new(translator, config.page_size)?;
        let (tx, _) = watch::channel(controller.snapshot());
        Ok(Self {
            source,
            inner: Mutex::new(Inner {
                controller,
                selection: Selection::new(),
            }),
            tx,
            max_universe_pages: config.max_universe_pages,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        // A panic while holding the lock leaves the controller consistent
        // (every mutation is a single assignment sequence), so keep going.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn view_id(&self) -> ViewId {
        self.lock().controller.view_id()
    }

    pub fn kind(&self) -> ResourceKind {
        self.lock().controller.kind()
    }

    pub fn state(&self) -> FetchState<T> {
        self.lock().controller.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.tx.subscribe()
    }

    pub fn stale_discarded(&self) -> u64 {
        self.lock().controller.stale_discarded()
    }

    pub fn selection(&self) -> Selection<T> {
        self.lock().selection.clone()
    }

    pub fn select(&self, item: T) {
        self.lock().selection.select(item);
    }

    pub fn deselect(&self, id: &T::Id) -> Option<T> {
        self.lock().selection.deselect(id)
    }

    pub fn clear_selection(&self) {
        self.lock().selection.clear();
    }

    pub async fn configure(
        &self,
        query: Query,
        page_size: u32,
        sort: Option<Sort>,
    ) -> ConsoleResult<ViewOutcome<T::Id>> {
        let request = self.issue(|c| c.configure(query, page_size, sort))?;
        Ok(self.run(request).await)
    }

    pub async fn set_query(&self, query: Query) -> ConsoleResult<ViewOutcome<T::Id>> {
        let request = self.issue(|c| c.set_query(query))?;
        Ok(self.run(request).await)
    }

    pub async fn set_page_size(&self, page_size: u32) -> ConsoleResult<ViewOutcome<T::Id>> {
        let request = self.issue(|c| c.set_page_size(page_size))?;
        Ok(self.run(request).await)
    }

    pub async fn set_sort(&self, sort: Option<Sort>) -> ConsoleResult<ViewOutcome<T::Id>> {
        let request = self.issue(|c| c.set_sort(sort))?;
        Ok(self.run(request).await)
    }

    pub async fn go_to_page(&self, index: usize) -> ConsoleResult<ViewOutcome<T::Id>> {
        let request = self.issue(|c| c.go_to_page(index))?;
        Ok(self.run(request).await)
    }

    /// Re-fetch the current page (polling, post-mutation refresh).
    pub async fn refresh(&self) -> ViewOutcome<T::Id> {
        let request = {
            let mut inner = self.lock();
            let request = inner.controller.refresh();
            self.tx.send_replace(inner.controller.snapshot());
            request
        };
        self.run(request).await
    }

    fn issue<F>(&self, f: F) -> ConsoleResult<FetchRequest>
    where
        F: FnOnce(&mut FetchController<T>) -> ConsoleResult<FetchRequest>,
    {
        let mut inner = self.lock();
        let request = f(&mut inner.controller)?;
        self.tx.send_replace(inner.controller.snapshot());
        Ok(request)
    }

    async fn run(&self, request: FetchRequest) -> ViewOutcome<T::Id> {
        let result = self.source.fetch(request.params).await;

        let resolution = {
            let mut inner = self.lock();
            let resolution = inner.controller.resolve(request.generation, result);
            if resolution != Resolution::Stale {
                self.tx.send_replace(inner.controller.snapshot());
            }
            resolution
        };

        let removed = if resolution == Resolution::Applied {
            self.reconcile_selection(request.generation, request.page_index)
                .await
        } else {
            Vec::new()
        };

        ViewOutcome {
            resolution,
            removed,
        }
    }

    /// Reconcile the selection against every item of the resource, not just
    /// those matching the view's query: filtering a selected item out of view
    /// does not deselect it.
    async fn reconcile_selection(
        &self,
        generation: u64,
        page_index: usize,
    ) -> Vec<SelectionItemRemoved<T::Id>> {
        let (checked, page_universe, params) = {
            let inner = self.lock();
            if inner.selection.is_empty() {
                return Vec::new();
            }
            let checked: HashSet<T::Id> = inner.selection.ids().cloned().collect();
            let state = inner.controller.current_state();
            let whole_collection = inner.controller.query().is_empty()
                && page_index == 1
                && state.next_token.is_none();
            let page_universe = whole_collection.then(|| state.items.clone());
            (checked, page_universe, inner.controller.universe_params())
        };

        let universe = match page_universe {
            Some(items) => items,
            None => match collect_all(&*self.source, params, self.max_universe_pages).await {
                Ok(Some(items)) => items,
                Ok(None) => {
                    tracing::debug!(generation, "selection universe too large; skipping reconcile");
                    return Vec::new();
                }
                Err(err) => {
                    tracing::warn!(generation, error = %err, "failed to load selection universe");
                    return Vec::new();
                }
            },
        };

        let mut inner = self.lock();
        if inner.controller.current_state().generation != generation {
            // A newer request owns reconciliation now.
            return Vec::new();
        }

        let (to_check, added): (Vec<T>, Vec<T>) = std::mem::take(&mut inner.selection)
            .into_items()
            .into_iter()
            .partition(|item| checked.contains(item.id()));

        let out = reconcile(to_check.into_iter().collect(), &universe);
        let mut selection = out.selection;
        for item in added {
            selection.select(item);
        }
        inner.selection = selection;
        out.removed
    }
}

/// Anything the poller can refresh.
#[async_trait::async_trait]
pub trait Pollable: Send + Sync {
    fn label(&self) -> String;

    async fn poll(&self);
}

#[async_trait::async_trait]
impl<T, S> Pollable for ResourceView<T, S>
where
    T: Entity + Clone + Send + Sync + 'static,
    T::Id: Send + Sync,
    S: ResourceSource<T> + 'static,
{
    fn label(&self) -> String {
        format!("{}:{}", self.kind(), self.view_id())
    }

    async fn poll(&self) {
        let outcome = self.refresh().await;
        if !outcome.removed.is_empty() {
            tracing::info!(
                view = %self.label(),
                removed = outcome.removed.len(),
                "poll dropped selected items"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use console_core::ItemId;

    use crate::filter::{FilterOperator, FilterToken};
    use crate::query::Operation;
    use crate::source::{FetchError, FetchPage};
    use crate::testing::{GatedSource, TestUser, user};

    type Source = GatedSource<TestUser>;

    fn view(source: Arc<Source>) -> Arc<ResourceView<TestUser, Source>> {
        let cfg = ConsoleConfig::default();
        Arc::new(
            ResourceView::new(
                source,
                Arc::new(FilterTranslator::for_kind(ResourceKind::Users)),
                &cfg,
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn filtered_first_page_then_next_page_uses_returned_token() {
        let source = Arc::new(Source::default());
        let v = view(source.clone());

        source.reply(Ok(
            FetchPage::new(vec![user("u1", "Alice")], Some("tok2".into())).with_total_count(1)
        ));
        let query = Query::from_tokens(
            vec![FilterToken::new("DisplayNames", FilterOperator::Contains, "ali")],
            Operation::And,
        );
        let outcome = v.configure(query, 10, None).await.unwrap();
        assert_eq!(outcome.resolution, Resolution::Applied);

        let state = v.state();
        assert_eq!(state.items.len(), 1);
        assert!(state.has_next());

        source.reply(Ok(FetchPage::new(vec![], None)));
        v.go_to_page(2).await.unwrap();
        let calls = source.calls();
        assert_eq!(calls[1].next_token.as_deref(), Some("tok2"));
        assert_eq!(calls[1].page_size, 10);
        assert_eq!(v.state().current_page_index, 2);
    }

    #[tokio::test]
    async fn overlapping_refreshes_show_the_second_only() {
        let source = Arc::new(Source::default());
        let v = view(source.clone());

        let first_gate = source.gate();
        let second_gate = source.gate();

        let first = tokio::spawn({
            let v = v.clone();
            async move { v.refresh().await }
        });
        source.wait_for_calls(1).await;
        let second = tokio::spawn({
            let v = v.clone();
            async move { v.refresh().await }
        });
        source.wait_for_calls(2).await;

        second_gate
            .send(Ok(FetchPage::new(vec![user("u2", "second")], None)))
            .unwrap();
        assert_eq!(second.await.unwrap().resolution, Resolution::Applied);

        first_gate
            .send(Ok(FetchPage::new(vec![user("u1", "first")], None)))
            .unwrap();
        assert_eq!(first.await.unwrap().resolution, Resolution::Stale);

        assert_eq!(v.state().items, vec![user("u2", "second")]);
        assert_eq!(v.stale_discarded(), 1);
    }

    #[tokio::test]
    async fn filter_change_beats_a_slow_poll_tick() {
        let source = Arc::new(Source::default());
        let v = view(source.clone());

        let poll_gate = source.gate();
        let filter_gate = source.gate();

        let poll = tokio::spawn({
            let v = v.clone();
            async move { v.poll().await }
        });
        source.wait_for_calls(1).await;
        let filter = tokio::spawn({
            let v = v.clone();
            async move { v.set_query(Query::default().with_text("bob")).await }
        });
        source.wait_for_calls(2).await;

        filter_gate
            .send(Ok(FetchPage::new(vec![user("u7", "Bob")], None)))
            .unwrap();
        filter.await.unwrap().unwrap();
        poll_gate
            .send(Ok(FetchPage::new(vec![user("u1", "Alice")], None)))
            .unwrap();
        poll.await.unwrap();

        assert_eq!(v.state().items, vec![user("u7", "Bob")]);
    }

    #[tokio::test]
    async fn subscribers_see_loading_then_result() {
        let source = Arc::new(Source::default());
        let v = view(source.clone());
        let mut rx = v.subscribe();

        let gate = source.gate();
        let task = tokio::spawn({
            let v = v.clone();
            async move { v.refresh().await }
        });
        source.wait_for_calls(1).await;
        assert!(rx.borrow_and_update().loading);

        gate.send(Ok(FetchPage::new(vec![user("u1", "A")], None)))
            .unwrap();
        task.await.unwrap();
        rx.changed().await.unwrap();
        let state = rx.borrow().clone();
        assert!(!state.loading);
        assert_eq!(state.items.len(), 1);
    }

    #[tokio::test]
    async fn deleted_selection_is_pruned_after_refresh() {
        let source = Arc::new(Source::default());
        let v = view(source.clone());
        v.select(user("u1", "Alice"));
        v.select(user("u2", "Bob"));

        source.reply(Ok(FetchPage::new(vec![user("u2", "Bobby")], None)));
        let outcome = v.refresh().await;

        assert_eq!(
            outcome.removed,
            vec![SelectionItemRemoved {
                id: ItemId::new("u1")
            }]
        );
        let selection = v.selection();
        assert_eq!(selection.len(), 1);
        assert_eq!(selection.get(&ItemId::new("u2")).unwrap().name, "Bobby");
    }

    #[tokio::test]
    async fn selection_on_another_page_survives() {
        let source = Arc::new(Source::default());
        let v = view(source.clone());
        v.select(user("u9", "Zed"));

        // The visible page has more behind it, so the universe is drained.
        source.reply(Ok(FetchPage::new(vec![user("u1", "A")], Some("p2".into()))));
        source.reply(Ok(FetchPage::new(vec![user("u1", "A")], Some("p2".into()))));
        source.reply(Ok(FetchPage::new(vec![user("u9", "Zed v2")], None)));

        let outcome = v.refresh().await;
        assert!(outcome.removed.is_empty());
        assert_eq!(v.selection().get(&ItemId::new("u9")).unwrap().name, "Zed v2");
        assert_eq!(source.count(), 3);
        assert_eq!(source.calls()[2].next_token.as_deref(), Some("p2"));
    }

    #[tokio::test]
    async fn filtering_a_selected_item_out_of_view_keeps_it() {
        let source = Arc::new(Source::default());
        let v = view(source.clone());
        v.select(user("u1", "Alice"));

        source.reply(Ok(FetchPage::new(vec![user("u7", "Bob")], None)));
        source.reply(Ok(FetchPage::new(
            vec![user("u1", "Alice B."), user("u7", "Bob")],
            None,
        )));
        let outcome = v
            .set_query(Query::default().with_text("bob"))
            .await
            .unwrap();

        assert!(outcome.removed.is_empty());
        assert_eq!(v.state().items, vec![user("u7", "Bob")]);
        assert_eq!(v.selection().get(&ItemId::new("u1")).unwrap().name, "Alice B.");

        let calls = source.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].filtering_text.as_deref(), Some("bob"));
        assert_eq!(calls[1].filtering_text, None);
        assert!(calls[1].query.is_empty());
        assert_eq!(calls[1].next_token, None);
    }

    #[tokio::test]
    async fn deleted_item_is_pruned_even_under_a_filter() {
        let source = Arc::new(Source::default());
        let v = view(source.clone());
        v.select(user("u1", "Alice"));

        source.reply(Ok(FetchPage::new(vec![user("u7", "Bob")], None)));
        source.reply(Ok(FetchPage::new(vec![user("u7", "Bob")], None)));
        let outcome = v
            .set_query(Query::default().with_text("bob"))
            .await
            .unwrap();

        assert_eq!(
            outcome.removed,
            vec![SelectionItemRemoved {
                id: ItemId::new("u1")
            }]
        );
        assert!(v.selection().is_empty());
    }

    #[tokio::test]
    async fn incomplete_universe_leaves_selection_alone() {
        let source = Arc::new(Source::default());
        let cfg = ConsoleConfig {
            max_universe_pages: 1,
            ..ConsoleConfig::default()
        };
        let v = ResourceView::new(
            source.clone(),
            Arc::new(FilterTranslator::for_kind(ResourceKind::Users)),
            &cfg,
        )
        .unwrap();
        v.select(user("u9", "Zed"));

        source.reply(Ok(FetchPage::new(vec![user("u1", "A")], Some("p2".into()))));
        source.reply(Ok(FetchPage::new(vec![user("u1", "A")], Some("p2".into()))));

        let outcome = v.refresh().await;
        assert!(outcome.removed.is_empty());
        assert!(v.selection().contains(&ItemId::new("u9")));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_items_and_selection() {
        let source = Arc::new(Source::default());
        let v = view(source.clone());
        source.reply(Ok(FetchPage::new(vec![user("u1", "A")], None)));
        v.refresh().await;
        v.select(user("u1", "A"));

        source.reply(Err(FetchError::api(503, "maintenance")));
        let outcome = v.refresh().await;

        assert_eq!(outcome.resolution, Resolution::Failed);
        let state = v.state();
        assert!(state.error);
        assert_eq!(state.error_message.as_deref(), Some("maintenance"));
        assert_eq!(state.items.len(), 1);
        assert_eq!(v.selection().len(), 1);
    }

    #[tokio::test]
    async fn sort_change_restarts_at_page_one() {
        let source = Arc::new(Source::default());
        let v = view(source.clone());
        source.reply(Ok(FetchPage::new(vec![user("u1", "A")], Some("t2".into()))));
        v.refresh().await;
        source.reply(Ok(FetchPage::new(vec![user("u2", "B")], None)));
        v.go_to_page(2).await.unwrap();

        source.reply(Ok(FetchPage::new(vec![user("u2", "B")], None)));
        v.set_sort(Some(Sort::descending("DisplayName"))).await.unwrap();

        let last = source.calls().pop().unwrap();
        assert_eq!(last.next_token, None);
        assert_eq!(last.sorting_column.as_deref(), Some("DisplayName"));
        assert_eq!(last.sorting_descending, Some(true));
        assert_eq!(v.state().current_page_index, 1);
    }

    #[tokio::test]
    async fn unknown_filter_key_never_reaches_the_source() {
        let source = Arc::new(Source::default());
        let v = view(source.clone());
        let bad = Query::default().with_token(FilterToken::new(
            "Hostnames",
            FilterOperator::Equal,
            "h",
        ));
        assert!(v.set_query(bad).await.is_err());
        assert_eq!(source.count(), 0);
    }
}
