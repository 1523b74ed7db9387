//! Periodic and on-demand fetch+append with a shared status record.
//!
//! A single fetch lock serializes every fetch+append pair, whether it comes
//! from the background loop or a manual trigger. That lock is the only
//! writer guard the snapshot store relies on.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tokio::task::JoinHandle;

use crate::error::CoreError;
use crate::failover::FailoverFetcher;
use crate::store::SnapshotStore;
use crate::{AssetId, FetchResult, PriceBook, UtcDateTime};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);
/// Shortest accepted loop interval; smaller values are raised to this.
pub const MIN_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Idle,
    Fetching,
    Ok,
    Error,
}

/// Copy of the scheduler's status record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub status: FetchStatus,
    pub last_run: Option<UtcDateTime>,
    pub last_success: Option<UtcDateTime>,
    pub last_error: Option<String>,
    pub last_source: Option<String>,
    pub last_path: Option<PathBuf>,
    /// Number of prices written by the last successful fetch.
    pub prices: usize,
    #[serde(serialize_with = "prices_as_object")]
    pub last_prices: PriceBook,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            status: FetchStatus::Idle,
            last_run: None,
            last_success: None,
            last_error: None,
            last_source: None,
            last_path: None,
            prices: 0,
            last_prices: PriceBook::new(),
        }
    }
}

/// Result of one successful fetch+append.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchOutcome {
    pub source: String,
    pub path: PathBuf,
    #[serde(serialize_with = "prices_as_object")]
    pub prices: PriceBook,
}

/// Renders a [`PriceBook`] as a JSON-style `{asset: price}` object.
fn prices_as_object<S>(prices: &PriceBook, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(prices.len()))?;
    for quote in prices.iter() {
        map.serialize_entry(quote.asset.as_str(), &quote.price_usd)?;
    }
    map.end()
}

pub struct Scheduler {
    fetcher: FailoverFetcher,
    store: SnapshotStore,
    assets: Vec<AssetId>,
    interval: Duration,
    fetch_lock: tokio::sync::Mutex<()>,
    state: Mutex<StatusSnapshot>,
    worker_started: AtomicBool,
}

impl Scheduler {
    pub fn new(
        fetcher: FailoverFetcher,
        store: SnapshotStore,
        assets: Vec<AssetId>,
        interval: Duration,
    ) -> Self {
        Self {
            fetcher,
            store,
            assets,
            interval: interval.max(MIN_INTERVAL),
            fetch_lock: tokio::sync::Mutex::new(()),
            state: Mutex::new(StatusSnapshot::default()),
            worker_started: AtomicBool::new(false),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn status(&self) -> StatusSnapshot {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fetch once and append the result. Waits for any fetch already running.
    ///
    /// Failures are recorded in the status before being returned.
    pub async fn trigger_fetch(&self) -> Result<FetchOutcome, CoreError> {
        let _guard = self.fetch_lock.lock().await;

        let started = UtcDateTime::now();
        self.update(|state| {
            state.status = FetchStatus::Fetching;
            state.last_run = Some(started);
            state.last_error = None;
        });

        match self.fetch_and_append(started).await {
            Ok(outcome) => {
                self.update(|state| {
                    state.status = FetchStatus::Ok;
                    state.last_success = Some(UtcDateTime::now());
                    state.last_source = Some(outcome.source.clone());
                    state.last_path = Some(outcome.path.clone());
                    state.prices = outcome.prices.len();
                    state.last_prices = outcome.prices.clone();
                });
                tracing::info!(
                    source = %outcome.source,
                    path = %outcome.path.display(),
                    prices = outcome.prices.len(),
                    "snapshot written"
                );
                Ok(outcome)
            }
            Err(error) => {
                let message = error.to_string();
                self.update(|state| {
                    state.status = FetchStatus::Error;
                    state.last_error = Some(message.clone());
                });
                tracing::error!(error = %message, "fetch failed");
                Err(error)
            }
        }
    }

    /// Start the background loop. Returns `None` if it is already running.
    pub fn spawn(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.worker_started.swap(true, Ordering::SeqCst) {
            tracing::debug!("fetch loop already running");
            return None;
        }
        Some(tokio::spawn(Arc::clone(self).run()))
    }

    /// Fetch immediately, then every `interval` measured from fetch start.
    /// A fetch that overruns the interval is followed by the next one at once.
    pub async fn run(self: Arc<Self>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            assets = self.assets.len(),
            "fetch loop started"
        );
        loop {
            let started = Instant::now();
            // already recorded in status and logged
            let _ = self.trigger_fetch().await;
            tokio::time::sleep(self.interval.saturating_sub(started.elapsed())).await;
        }
    }

    async fn fetch_and_append(&self, started: UtcDateTime) -> Result<FetchOutcome, CoreError> {
        let FetchResult {
            source_name,
            quotes,
            meta,
        } = self.fetcher.fetch(&self.assets).await?;

        let store = self.store.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            store
                .append_at(started, &source_name, &quotes, meta)
                .map(|path| FetchOutcome {
                    source: source_name,
                    path,
                    prices: quotes,
                })
        })
        .await
        .map_err(|error| CoreError::Task(error.to_string()))??;

        Ok(outcome)
    }

    fn update(&self, apply: impl FnOnce(&mut StatusSnapshot)) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut state);
    }
}
