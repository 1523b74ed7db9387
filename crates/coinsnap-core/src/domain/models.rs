use serde::{Deserialize, Serialize};

use crate::domain::AssetId;

/// One USD spot price for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub asset: AssetId,
    pub price_usd: f64,
}

/// Asset→price mapping that keeps insertion order.
///
/// Row order in a snapshot partition follows this order, so it is kept stable
/// instead of sorting by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceBook {
    quotes: Vec<PriceQuote>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the price for `asset`. Replacing keeps the original position.
    pub fn insert(&mut self, asset: AssetId, price_usd: f64) {
        match self.quotes.iter_mut().find(|quote| quote.asset == asset) {
            Some(existing) => existing.price_usd = price_usd,
            None => self.quotes.push(PriceQuote { asset, price_usd }),
        }
    }

    pub fn get(&self, asset: &AssetId) -> Option<f64> {
        self.quotes
            .iter()
            .find(|quote| &quote.asset == asset)
            .map(|quote| quote.price_usd)
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PriceQuote> {
        self.quotes.iter()
    }
}

impl FromIterator<(AssetId, f64)> for PriceBook {
    fn from_iter<I: IntoIterator<Item = (AssetId, f64)>>(iter: I) -> Self {
        let mut book = Self::new();
        for (asset, price_usd) in iter {
            book.insert(asset, price_usd);
        }
        book
    }
}

/// Request metadata describing the winning source call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchMeta {
    pub http_status: u16,
    pub latency_ms: u64,
    pub attempts: u32,
}

impl FetchMeta {
    pub const fn new(http_status: u16, latency_ms: u64, attempts: u32) -> Self {
        Self {
            http_status,
            latency_ms,
            attempts,
        }
    }
}

/// Successful output of a failover fetch. `quotes` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    pub source_name: String,
    pub quotes: PriceBook,
    pub meta: FetchMeta,
}
