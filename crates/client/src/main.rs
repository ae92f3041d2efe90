//! `console-watch <kind> [search text]`
//!
//! Polls one resource list and logs every snapshot until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use console_client::{Record, RestSource};
use console_core::ResourceKind;
use console_query::{ConsoleConfig, Poller, Query, ResourceView, TranslatorRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    console_observability::init();

    let config = ConsoleConfig::from_env().context("failed to load console configuration")?;

    let mut args = std::env::args().skip(1);
    let kind: ResourceKind = args
        .next()
        .as_deref()
        .unwrap_or("sessions")
        .parse()
        .context("usage: console-watch <kind> [search text]")?;
    let query = match args.next() {
        Some(text) => Query::default().with_text(text),
        None => Query::default(),
    };

    let registry = TranslatorRegistry::builtin();
    let source = Arc::new(RestSource::<Record>::new(&config, kind));
    let view = Arc::new(
        ResourceView::new(source, registry.get(kind), &config)
            .context("failed to create resource view")?,
    );

    let mut snapshots = view.subscribe();
    let logger = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let state = snapshots.borrow_and_update().clone();
            if state.loading {
                continue;
            }
            if let Some(message) = &state.error_message {
                tracing::warn!(%kind, generation = state.generation, error = %message, "list fetch failed");
                continue;
            }
            let names: Vec<&str> = state.items.iter().map(Record::display_name).collect();
            tracing::info!(
                %kind,
                generation = state.generation,
                page = state.current_page_index,
                count = names.len(),
                total = ?state.total_count,
                has_next = state.has_next(),
                items = ?names,
                "snapshot"
            );
        }
    });

    view.configure(query, config.page_size, None)
        .await
        .context("invalid initial query")?;

    let poller = Poller::new(config.poll_interval);
    poller.add(view.clone()).await;
    let polling = poller.start();

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    tracing::info!("shutting down");

    poller.shutdown();
    polling.await.context("poller task panicked")?;
    logger.abort();

    Ok(())
}
