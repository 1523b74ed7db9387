//! Upstream price adapters.
//!
//! | Adapter | Request shape | Value |
//! |---------|---------------|-------|
//! | [`CoinGeckoAdapter`] | one batch call | direct USD price |
//! | [`CoinCapAdapter`] | one batch call | direct USD price |
//! | [`BinanceAdapter`] | one call per asset | USDT ticker price |
//! | [`CoinbaseAdapter`] | one batch call | inverted USD exchange rate |

mod binance;
mod coinbase;
mod coincap;
mod coingecko;

use std::sync::Arc;
use std::time::Instant;

pub use binance::BinanceAdapter;
pub use coinbase::CoinbaseAdapter;
pub use coincap::CoinCapAdapter;
pub use coingecko::CoinGeckoAdapter;

use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::source::{PriceSource, SourceError};

/// Default priority order used by the failover fetcher.
pub fn default_sources(http_client: Arc<dyn HttpClient>) -> Vec<Arc<dyn PriceSource>> {
    vec![
        Arc::new(CoinGeckoAdapter::with_http_client(http_client.clone())),
        Arc::new(CoinCapAdapter::with_http_client(http_client.clone())),
        Arc::new(BinanceAdapter::with_http_client(http_client.clone())),
        Arc::new(CoinbaseAdapter::with_http_client(http_client)),
    ]
}

/// Executes `request`, returning the response together with its latency.
///
/// Non-2xx responses are returned as-is; callers decide when to fail.
async fn timed_get(
    http_client: &dyn HttpClient,
    source: &str,
    request: HttpRequest,
) -> Result<(HttpResponse, u64), SourceError> {
    let started = Instant::now();
    let response = http_client.execute(request).await.map_err(|error| {
        let what = if error.is_timeout() {
            "timed out"
        } else {
            "transport error"
        };
        SourceError::unavailable(format!("{source} {what}: {}", error.message()))
    })?;
    Ok((response, elapsed_ms(started)))
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}

/// Accepts JSON numbers and numeric strings; rejects non-finite values.
fn json_price(value: &serde_json::Value) -> Option<f64> {
    let price = match value {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    price.is_finite().then_some(price)
}
