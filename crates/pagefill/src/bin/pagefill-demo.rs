//! Demo consumer: loads the first page, scrolls to the end twice, and prints
//! what a list view would render.
//!
//! Environment:
//! - `PAGEFILL_LATENCY_MS`: simulated remote latency (default 1000)
//! - `PAGEFILL_DB`: back the cache with a SQLite file instead of memory
//! - `RUST_LOG`: log filter (default `info`)

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use pagefill::remote::{SimulatedFiller, SimulatedRemoteConfig};
use pagefill::store::{MemoryStore, SqliteStore, Store};
use pagefill::{LoadDirection, Pager, PagingConfig, Row};

const DEFAULT_LATENCY_MS: u64 = 1000;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let latency = match std::env::var("PAGEFILL_LATENCY_MS") {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("PAGEFILL_LATENCY_MS is not a number: {raw}"))?,
        Err(_) => DEFAULT_LATENCY_MS,
    };
    let remote = SimulatedRemoteConfig::with_latency(Duration::from_millis(latency));

    match std::env::var_os("PAGEFILL_DB") {
        Some(path) => {
            let store = SqliteStore::open(&path)
                .with_context(|| format!("opening {}", path.to_string_lossy()))?;
            run(Arc::new(store), remote).await
        }
        None => run(Arc::new(MemoryStore::new()), remote).await,
    }
}

async fn run<S: Store + 'static>(store: Arc<S>, remote: SimulatedRemoteConfig) -> Result<()> {
    let filler = Arc::new(SimulatedFiller::new(Arc::clone(&store), remote));
    let pager = Pager::new(store, filler, PagingConfig::default())?;

    let mut snapshots = pager.subscribe();
    let watcher = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            tracing::debug!(
                generation = snapshot.generation,
                items = snapshot.len(),
                loading = snapshot.load_states.is_loading(),
                "snapshot"
            );
        }
    });

    pager.request(LoadDirection::Refresh, None).await?;
    render(&pager.snapshot().rows());

    // Scroll to the top, then to the bottom twice.
    pager.access(0).await?;
    for _ in 0..2 {
        let last = pager.snapshot().len().saturating_sub(1);
        let outcome = pager.access(last).await?;
        tracing::info!(?outcome, "scrolled to position {last}");
    }
    render(&pager.snapshot().rows());

    let states = pager.load_states();
    println!(
        "refresh: {:?}, prepend: {:?}, append: {:?}",
        states.refresh.state, states.prepend.state, states.append.state
    );

    drop(pager);
    watcher.await?;
    Ok(())
}

fn render(rows: &[Row]) {
    for (position, row) in rows.iter().enumerate() {
        match row {
            Row::Loaded(item) => println!("{position:>4} · {}", item.key),
            Row::Placeholder => println!("{position:>4} · …"),
        }
    }
    println!();
}
