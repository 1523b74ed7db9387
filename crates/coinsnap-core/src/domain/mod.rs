//! # Domain Models
//!
//! Canonical domain types for coinsnap price snapshots.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`AssetId`] | Lowercase asset slug |
//! | [`PriceQuote`] | One asset's USD price |
//! | [`PriceBook`] | Ordered asset→price mapping |
//! | [`FetchMeta`] | Status, latency and attempt count of the winning call |
//! | [`FetchResult`] | Source name, prices and metadata of one fetch |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! Asset ids are lowercased at construction, so every comparison and every
//! stored row uses the normalized form.

mod asset;
mod models;
mod timestamp;

pub use asset::AssetId;
pub use models::{FetchMeta, FetchResult, PriceBook, PriceQuote};
pub use timestamp::UtcDateTime;
