use std::sync::Arc;

use serde::Deserialize;

use crate::adapters::{json_price, timed_get};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::source::{PriceSource, PricesFuture, SourceError, SourcePrices};
use crate::{AssetId, FetchMeta, PriceBook};

const NAME: &str = "coincap";
const ASSETS_URL: &str = "https://api.coincap.io/v2/assets";

/// CoinCap `v2/assets` adapter. Uses the same slug ids as CoinGecko.
#[derive(Clone)]
pub struct CoinCapAdapter {
    http_client: Arc<dyn HttpClient>,
}

impl Default for CoinCapAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }
}

impl CoinCapAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }
}

impl PriceSource for CoinCapAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn get_prices<'a>(&'a self, assets: &'a [AssetId]) -> PricesFuture<'a> {
        Box::pin(async move {
            if assets.is_empty() {
                return Err(SourceError::invalid_request(
                    "coincap price request requires at least one asset",
                ));
            }

            let ids = assets
                .iter()
                .map(AssetId::as_str)
                .collect::<Vec<_>>()
                .join(",");
            let request = HttpRequest::get(ASSETS_URL).with_query("ids", ids);

            let (response, latency_ms) = timed_get(self.http_client.as_ref(), NAME, request).await?;
            if !response.is_success() {
                return Err(SourceError::upstream_status(NAME, response.status));
            }

            let quotes = parse_assets(&response.body, assets)?;
            Ok(SourcePrices {
                quotes,
                meta: FetchMeta::new(response.status, latency_ms, 1),
            })
        })
    }
}

#[derive(Debug, Deserialize)]
struct CoinCapResponse {
    #[serde(default)]
    data: Vec<CoinCapAsset>,
}

#[derive(Debug, Deserialize)]
struct CoinCapAsset {
    id: Option<String>,
    #[serde(rename = "priceUsd")]
    price_usd: Option<serde_json::Value>,
}

/// Parses `{"data": [{"id": "bitcoin", "priceUsd": "101.0"}, ...]}`.
///
/// Rows are emitted in request order; ids the caller did not ask for are dropped.
pub(crate) fn parse_assets(body: &str, assets: &[AssetId]) -> Result<PriceBook, SourceError> {
    let payload: CoinCapResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::parse(format!("failed to parse coincap response: {e}")))?;

    let returned = payload
        .data
        .iter()
        .filter_map(|item| {
            let asset = AssetId::parse(item.id.as_deref()?).ok()?;
            let price = item.price_usd.as_ref().and_then(json_price)?;
            Some((asset, price))
        })
        .collect::<PriceBook>();

    let quotes = assets
        .iter()
        .filter_map(|asset| returned.get(asset).map(|price| (asset.clone(), price)))
        .collect::<PriceBook>();

    if quotes.is_empty() {
        return Err(SourceError::empty(NAME));
    }
    Ok(quotes)
}
