//! Async driver for a [`TypeaheadLoader`].
//!
//! Every keystroke spawns a short task that sleeps out the debounce window
//! and then tries to redeem its ticket. Only the newest ticket survives, so a
//! burst of typing costs one request.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use console_core::{ConsoleResult, Entity, PickerId};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::ConsoleConfig;
use crate::fetch::Resolution;
use crate::filter::FilterTranslator;
use crate::query::Query;
use crate::source::ResourceSource;
use crate::state::SelectState;
use crate::typeahead::{SearchRequest, TypeaheadLoader};

struct Shared<T, S> {
    source: Arc<S>,
    loader: Mutex<TypeaheadLoader<T>>,
    tx: watch::Sender<SelectState<T>>,
    debounce: Duration,
}

pub struct TypeaheadPicker<T, S> {
    shared: Arc<Shared<T, S>>,
}

impl<T, S> Clone for TypeaheadPicker<T, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, S> TypeaheadPicker<T, S>
where
    T: Entity + Clone + Send + Sync + 'static,
    S: ResourceSource<T> + 'static,
{
    pub fn new(
        source: Arc<S>,
        translator: Arc<FilterTranslator>,
        base: &Query,
        config: &ConsoleConfig,
    ) -> ConsoleResult<Self> {
        let loader = TypeaheadLoader::new(translator, base, config.page_size)?;
        let (tx, _) = watch::channel(loader.snapshot());
        Ok(Self {
            shared: Arc::new(Shared {
                source,
                loader: Mutex::new(loader),
                tx,
                debounce: config.debounce,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, TypeaheadLoader<T>> {
        self.shared
            .loader
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn picker_id(&self) -> PickerId {
        self.lock().picker_id()
    }

    pub fn state(&self) -> SelectState<T> {
        self.lock().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SelectState<T>> {
        self.shared.tx.subscribe()
    }

    /// Record a keystroke and schedule the debounced search.
    ///
    /// The returned handle yields `None` when the keystroke was superseded
    /// before its window elapsed.
    pub fn on_input_change(&self, text: impl Into<String>) -> JoinHandle<Option<Resolution>> {
        let ticket = {
            let mut loader = self.lock();
            let ticket = loader.on_input_change(text);
            self.shared.tx.send_replace(loader.snapshot());
            ticket
        };

        let picker = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(picker.shared.debounce).await;
            let request = picker.lock().dispatch(&ticket)?;
            Some(picker.run(request).await)
        })
    }

    /// Fetch the next page of suggestions, if there is one to fetch.
    pub async fn on_load_more(&self) -> Option<Resolution> {
        let request = {
            let mut loader = self.lock();
            let request = loader.on_load_more()?;
            self.shared.tx.send_replace(loader.snapshot());
            request
        };
        Some(self.run(request).await)
    }

    async fn run(&self, request: SearchRequest) -> Resolution {
        let result = self.shared.source.fetch(request.params).await;

        let mut loader = self.lock();
        let resolution = loader.resolve(request.generation, result);
        if resolution != Resolution::Stale {
            self.shared.tx.send_replace(loader.snapshot());
        }
        resolution
    }
}
