//! Flight Cache demo
//!
//! Replays a dashboard stampede: several concurrent requests for the same
//! slow query plus one for a different query, all through one cache.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flight_cache::{spawn_cleanup_task, Config, Fetcher, SingleFlightCache};

type Rows = Vec<String>;

/// Stand-in for an expensive, idempotent query.
struct SimulatedQuery {
    name: &'static str,
    latency: Duration,
    rows: usize,
    calls: Arc<AtomicUsize>,
}

impl SimulatedQuery {
    fn new(name: &'static str, latency: Duration, rows: usize) -> Self {
        Self {
            name,
            latency,
            rows,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetcher for SimulatedQuery {
    type Key = String;
    type Value = Rows;
    type Error = anyhow::Error;

    fn key(&self) -> String {
        self.name.to_string()
    }

    fn fetch(&self) -> impl Future<Output = anyhow::Result<Rows>> + Send {
        let (name, latency, rows) = (self.name, self.latency, self.rows);
        let calls = Arc::clone(&self.calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            info!("Running query {} ({}ms)", name, latency.as_millis());
            tokio::time::sleep(latency).await;
            Ok((0..rows).map(|i| format!("{name}#{i}")).collect())
        }
    }
}

/// Entry point for the demo.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache and start the expiry sweep
/// 4. Fire five concurrent requests, four of them for the same key
/// 5. Report producer invocations and cache statistics
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flight_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_entries={}, max_age={}s, sweep_interval={}s",
        config.max_entries, config.max_age_secs, config.sweep_interval
    );

    let cache: Arc<SingleFlightCache<String, Rows>> =
        Arc::new(SingleFlightCache::from_config(&config)?);

    let sweep_handle = if config.sweep_interval > 0 {
        Some(spawn_cleanup_task(Arc::clone(&cache), config.sweep_interval))
    } else {
        warn!("Expiry sweep disabled, expired entries are freed lazily");
        None
    };

    let dashboard =
        SimulatedQuery::new("dashboard_data_unprocessed", Duration::from_millis(300), 4);
    let raw = SimulatedQuery::new("rawdata_cleaned", Duration::from_millis(150), 2);

    let (d1, d2, d3, d4, r1) = tokio::join!(
        cache.fetch(&dashboard),
        cache.fetch(&dashboard),
        cache.fetch(&dashboard),
        cache.fetch(&dashboard),
        cache.fetch(&raw),
    );
    let dashboards = [d1?, d2?, d3?, d4?];
    let raw_rows = r1?;

    if dashboards.iter().any(|rows| *rows != dashboards[0]) {
        anyhow::bail!("concurrent callers received different dashboard rows");
    }
    info!(
        "{} dashboard requests served by {} query run(s), {} rows each",
        dashboards.len(),
        dashboard.calls(),
        dashboards[0].len()
    );
    info!(
        "raw data request served by {} query run(s), {} rows",
        raw.calls(),
        raw_rows.len()
    );

    // A second round is answered from memory
    cache.fetch(&dashboard).await?;
    info!("Repeat request: {} total dashboard query run(s)", dashboard.calls());

    info!("Cache stats: {}", serde_json::to_string(&cache.stats())?);

    if let Some(handle) = sweep_handle {
        handle.abort();
    }
    info!("Demo complete");

    Ok(())
}
