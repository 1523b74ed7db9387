//! Core contracts for coinsnap.
//!
//! This crate contains:
//! - Asset ids, price books and fetch metadata
//! - Upstream price adapters behind the [`PriceSource`] trait
//! - Priority failover with jittered exponential backoff
//! - The append-only CSV snapshot store and latest-row queries
//! - The fetch scheduler and its status record

pub mod adapters;
pub mod backoff;
pub mod domain;
pub mod error;
pub mod failover;
pub mod http_client;
pub mod query;
pub mod scheduler;
pub mod source;
pub mod store;

pub use adapters::{
    default_sources, BinanceAdapter, CoinCapAdapter, CoinGeckoAdapter, CoinbaseAdapter,
};
pub use backoff::BackoffPolicy;
pub use domain::{AssetId, FetchMeta, FetchResult, PriceBook, PriceQuote, UtcDateTime};
pub use error::{CoreError, ValidationError};
pub use failover::{FailoverFetcher, FetchError};
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use query::{
    get_latest, health, requested_assets, CoinLookup, HealthStatus, LatestResponse, QueryHealth,
    RequestedAsset,
};
pub use scheduler::{FetchOutcome, FetchStatus, Scheduler, StatusSnapshot};
pub use source::{PriceSource, PricesFuture, SourceError, SourceErrorKind, SourcePrices};
pub use store::{LatestSnapshot, SnapshotRecord, SnapshotStore, StoreError};
