//! Test doubles shared by the async driver tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use console_core::{Entity, ItemId};
use tokio::sync::oneshot;

use crate::source::{FetchError, FetchPage, FetchParams, ResourceSource};

#[derive(Debug, Clone, PartialEq)]
pub struct TestUser {
    pub id: ItemId,
    pub name: String,
}

impl Entity for TestUser {
    type Id = ItemId;

    fn id(&self) -> &ItemId {
        &self.id
    }
}

pub fn user(id: &str, name: &str) -> TestUser {
    TestUser {
        id: ItemId::new(id),
        name: name.to_string(),
    }
}

type Reply<T> = Result<FetchPage<T>, FetchError>;

/// Source whose responses are released by the test, in any order.
///
/// Each fetch takes the next gate in creation order and waits on it.
pub struct GatedSource<T> {
    gates: Mutex<VecDeque<oneshot::Receiver<Reply<T>>>>,
    calls: Mutex<Vec<FetchParams>>,
    count: AtomicUsize,
}

impl<T> Default for GatedSource<T> {
    fn default() -> Self {
        Self {
            gates: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            count: AtomicUsize::new(0),
        }
    }
}

impl<T> GatedSource<T> {
    pub fn gate(&self) -> oneshot::Sender<Reply<T>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }

    /// Queue an immediate reply.
    pub fn reply(&self, reply: Reply<T>) {
        let _ = self.gate().send(reply);
    }

    pub fn calls(&self) -> Vec<FetchParams> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub async fn wait_for_calls(&self, n: usize) {
        // Sleep rather than yield so paused-clock tests can auto-advance.
        while self.count() < n {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }
}

#[async_trait::async_trait]
impl<T: Send + 'static> ResourceSource<T> for GatedSource<T> {
    async fn fetch(&self, params: FetchParams) -> Result<FetchPage<T>, FetchError> {
        let rx = self.gates.lock().unwrap().pop_front();
        self.calls.lock().unwrap().push(params);
        self.count.fetch_add(1, Ordering::SeqCst);
        match rx {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(FetchError::network("gate dropped"))),
            None => Err(FetchError::network("no reply queued")),
        }
    }
}
