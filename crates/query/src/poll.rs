//! Background poller that periodically refreshes registered views.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::view::Pollable;

/// Periodic refresh driver.
///
/// A tick simply calls [`Pollable::poll`] on every registered target; a poll
/// response racing a user-initiated fetch is sorted out by the target's own
/// generation check, so the poller holds no lock across a refresh.
pub struct Poller {
    interval: Duration,
    targets: Arc<RwLock<Vec<Arc<dyn Pollable>>>>,
    shutdown: Arc<Notify>,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            targets: Arc::new(RwLock::new(Vec::new())),
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub async fn add(&self, target: Arc<dyn Pollable>) {
        let label = target.label();
        self.targets.write().await.push(target);
        tracing::info!(target_label = %label, "added poll target");
    }

    /// Remove every target with the given label.
    pub async fn remove(&self, label: &str) {
        let mut targets = self.targets.write().await;
        targets.retain(|t| t.label() != label);
        tracing::info!(target_label = %label, "removed poll target");
    }

    pub async fn len(&self) -> usize {
        self.targets.read().await.len()
    }

    /// Spawn the polling loop. The first tick fires one interval from now.
    pub fn start(&self) -> JoinHandle<()> {
        let shutdown = self.shutdown.clone();
        let targets = self.targets.clone();
        let period = self.interval;

        tokio::spawn(async move {
            tracing::info!(interval_ms = period.as_millis() as u64, "poller started");

            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown.notified() => {
                        tracing::info!("poller received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        let snapshot = targets.read().await.clone();
                        if snapshot.is_empty() {
                            tracing::debug!("no poll targets");
                            continue;
                        }
                        tracing::debug!(count = snapshot.len(), "polling targets");
                        for target in snapshot {
                            target.poll().await;
                        }
                    }
                }
            }

            tracing::info!("poller stopped");
        })
    }

    /// Request graceful shutdown of the loop.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}
