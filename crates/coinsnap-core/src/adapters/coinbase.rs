use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::adapters::{json_price, timed_get};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::source::{PriceSource, PricesFuture, SourceError, SourcePrices};
use crate::{AssetId, FetchMeta, PriceBook};

const NAME: &str = "coinbase";
const EXCHANGE_RATES_URL: &str = "https://api.coinbase.com/v2/exchange-rates";

const SYMBOL_OVERRIDES: &[(&str, &str)] = &[
    ("bitcoin", "BTC"),
    ("ethereum", "ETH"),
    ("solana", "SOL"),
    ("cardano", "ADA"),
    ("ripple", "XRP"),
    ("dogecoin", "DOGE"),
    ("polkadot", "DOT"),
    ("litecoin", "LTC"),
    ("tron", "TRX"),
    ("binancecoin", "BNB"),
];

/// Coinbase exchange-rates adapter.
///
/// Coinbase quotes how much of each currency one USD buys, so the asset
/// price is the inverse of its rate.
#[derive(Clone)]
pub struct CoinbaseAdapter {
    http_client: Arc<dyn HttpClient>,
}

impl Default for CoinbaseAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }
}

impl CoinbaseAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }
}

pub(crate) fn ticker(asset: &AssetId) -> String {
    SYMBOL_OVERRIDES
        .iter()
        .find(|(slug, _)| *slug == asset.as_str())
        .map(|(_, symbol)| (*symbol).to_owned())
        .unwrap_or_else(|| asset.as_str().to_uppercase())
}

#[derive(Debug, Deserialize)]
struct CoinbaseResponse {
    #[serde(default)]
    data: CoinbaseData,
}

#[derive(Debug, Default, Deserialize)]
struct CoinbaseData {
    #[serde(default)]
    rates: HashMap<String, serde_json::Value>,
}

/// Parses `{"data": {"rates": {"BTC": "0.001"}}}` into USD prices.
pub(crate) fn parse_exchange_rates(
    body: &str,
    assets: &[AssetId],
) -> Result<PriceBook, SourceError> {
    let payload: CoinbaseResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::parse(format!("failed to parse coinbase rates: {e}")))?;
    let rates = payload.data.rates;

    let quotes = assets
        .iter()
        .filter_map(|asset| {
            let rate = rates.get(&ticker(asset)).and_then(json_price)?;
            if rate == 0.0 {
                return None;
            }
            let price = 1.0 / rate;
            price.is_finite().then(|| (asset.clone(), price))
        })
        .collect::<PriceBook>();

    if quotes.is_empty() {
        return Err(SourceError::empty(NAME));
    }
    Ok(quotes)
}

impl PriceSource for CoinbaseAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn get_prices<'a>(&'a self, assets: &'a [AssetId]) -> PricesFuture<'a> {
        Box::pin(async move {
            if assets.is_empty() {
                return Err(SourceError::invalid_request(
                    "coinbase price request requires at least one asset",
                ));
            }

            let request = HttpRequest::get(EXCHANGE_RATES_URL).with_query("currency", "USD");
            let (response, latency_ms) = timed_get(self.http_client.as_ref(), NAME, request).await?;
            if !response.is_success() {
                return Err(SourceError::upstream_status(NAME, response.status));
            }

            let quotes = parse_exchange_rates(&response.body, assets)?;
            Ok(SourcePrices {
                quotes,
                meta: FetchMeta::new(response.status, latency_ms, 1),
            })
        })
    }
}
