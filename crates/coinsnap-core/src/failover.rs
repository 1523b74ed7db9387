//! Linear priority failover across price sources.
//!
//! Sources are tried strictly in order. The first success wins, even when it
//! covers only part of the requested assets. Between a failure and the next
//! source the fetcher sleeps according to its [`BackoffPolicy`]; there is no
//! sleep after the last source fails. Adapter errors never escape: they are
//! logged and only the aggregate [`FetchError::AllSourcesFailed`] is returned.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::adapters::default_sources;
use crate::backoff::BackoffPolicy;
use crate::http_client::ReqwestHttpClient;
use crate::source::{PriceSource, SourceError};
use crate::{AssetId, FetchResult, ValidationError};

/// Failure of a whole failover run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no price sources configured")]
    NoSources,

    #[error("all sources failed: {last}")]
    AllSourcesFailed {
        /// Source names in the order they were tried.
        attempted: Vec<&'static str>,
        /// Failure reported by the last source tried.
        last: SourceError,
    },
}

/// Tries each configured [`PriceSource`] in priority order.
pub struct FailoverFetcher {
    sources: Vec<Arc<dyn PriceSource>>,
    backoff: BackoffPolicy,
}

impl Default for FailoverFetcher {
    fn default() -> Self {
        Self::new(
            default_sources(Arc::new(ReqwestHttpClient::new())),
            BackoffPolicy::default(),
        )
    }
}

impl FailoverFetcher {
    pub fn new(sources: Vec<Arc<dyn PriceSource>>, backoff: BackoffPolicy) -> Self {
        Self { sources, backoff }
    }

    pub async fn fetch(&self, assets: &[AssetId]) -> Result<FetchResult, FetchError> {
        if assets.is_empty() {
            return Err(ValidationError::EmptyAssetList.into());
        }

        let started = Instant::now();
        let mut attempted = Vec::with_capacity(self.sources.len());
        let mut last_error = None;

        for (index, source) in self.sources.iter().enumerate() {
            attempted.push(source.name());

            match source.get_prices(assets).await {
                Ok(prices) if !prices.quotes.is_empty() => {
                    tracing::info!(
                        source = source.name(),
                        quotes = prices.quotes.len(),
                        requested = assets.len(),
                        failed_before = index,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "price fetch succeeded"
                    );
                    return Ok(FetchResult {
                        source_name: source.name().to_owned(),
                        quotes: prices.quotes,
                        meta: prices.meta,
                    });
                }
                Ok(_) => {
                    tracing::warn!(source = source.name(), "source returned no prices");
                    last_error = Some(SourceError::empty(source.name()));
                }
                Err(error) => {
                    tracing::warn!(
                        source = source.name(),
                        code = error.code(),
                        error = %error,
                        "price source failed"
                    );
                    last_error = Some(error);
                }
            }

            if index + 1 < self.sources.len() {
                let attempt = u32::try_from(index).unwrap_or(u32::MAX);
                let delay = self.backoff.delay(attempt);
                tracing::debug!(
                    next = self.sources[index + 1].name(),
                    delay_ms = delay.as_millis() as u64,
                    "backing off before next source"
                );
                tokio::time::sleep(delay).await;
            }
        }

        match last_error {
            Some(last) => Err(FetchError::AllSourcesFailed { attempted, last }),
            None => Err(FetchError::NoSources),
        }
    }
}
