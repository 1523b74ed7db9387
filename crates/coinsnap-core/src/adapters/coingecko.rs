use std::collections::HashMap;
use std::sync::Arc;

use crate::adapters::{json_price, timed_get};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::source::{PriceSource, PricesFuture, SourceError, SourcePrices};
use crate::{AssetId, FetchMeta, PriceBook};

const NAME: &str = "coingecko";
const SIMPLE_PRICE_URL: &str = "https://api.coingecko.com/api/v3/simple/price";

/// CoinGecko `simple/price` adapter. Asset slugs are CoinGecko ids already.
#[derive(Clone)]
pub struct CoinGeckoAdapter {
    http_client: Arc<dyn HttpClient>,
}

impl Default for CoinGeckoAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }
}

impl CoinGeckoAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }
}

impl PriceSource for CoinGeckoAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn get_prices<'a>(&'a self, assets: &'a [AssetId]) -> PricesFuture<'a> {
        Box::pin(async move {
            if assets.is_empty() {
                return Err(SourceError::invalid_request(
                    "coingecko price request requires at least one asset",
                ));
            }

            let ids = assets
                .iter()
                .map(AssetId::as_str)
                .collect::<Vec<_>>()
                .join(",");
            let request = HttpRequest::get(SIMPLE_PRICE_URL)
                .with_query("ids", ids)
                .with_query("vs_currencies", "usd");

            let (response, latency_ms) = timed_get(self.http_client.as_ref(), NAME, request).await?;
            if !response.is_success() {
                return Err(SourceError::upstream_status(NAME, response.status));
            }

            let quotes = parse_simple_price(&response.body, assets)?;
            Ok(SourcePrices {
                quotes,
                meta: FetchMeta::new(response.status, latency_ms, 1),
            })
        })
    }
}

/// Parses `{"bitcoin": {"usd": 100}, ...}`, keeping only requested assets.
pub(crate) fn parse_simple_price(body: &str, assets: &[AssetId]) -> Result<PriceBook, SourceError> {
    let payload: HashMap<String, serde_json::Value> = serde_json::from_str(body)
        .map_err(|e| SourceError::parse(format!("coingecko response is not a JSON object: {e}")))?;

    let quotes = assets
        .iter()
        .filter_map(|asset| {
            let price = payload.get(asset.as_str())?.get("usd").and_then(json_price)?;
            Some((asset.clone(), price))
        })
        .collect::<PriceBook>();

    if quotes.is_empty() {
        return Err(SourceError::empty(NAME));
    }
    Ok(quotes)
}
