use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;

use crate::adapters::{elapsed_ms, json_price, timed_get};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::source::{PriceSource, PricesFuture, SourceError, SourcePrices};
use crate::{AssetId, FetchMeta, PriceBook};

const NAME: &str = "binance";
const TICKER_PRICE_URL: &str = "https://api.binance.com/api/v3/ticker/price";

const SYMBOL_OVERRIDES: &[(&str, &str)] = &[
    ("bitcoin", "BTCUSDT"),
    ("ethereum", "ETHUSDT"),
    ("solana", "SOLUSDT"),
];

/// Binance spot ticker adapter.
///
/// Binance has no batch lookup by slug, so this issues one request per asset.
/// `attempts` counts the requests issued; status and latency come from the
/// last request, with latency spanning the whole loop.
#[derive(Clone)]
pub struct BinanceAdapter {
    http_client: Arc<dyn HttpClient>,
}

impl Default for BinanceAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }
}

impl BinanceAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }
}

/// USDT trading pair for an asset slug.
pub(crate) fn ticker_symbol(asset: &AssetId) -> String {
    SYMBOL_OVERRIDES
        .iter()
        .find(|(slug, _)| *slug == asset.as_str())
        .map(|(_, symbol)| (*symbol).to_owned())
        .unwrap_or_else(|| format!("{}USDT", asset.as_str().to_uppercase()))
}

#[derive(Debug, Deserialize)]
struct BinanceTicker {
    price: Option<serde_json::Value>,
}

pub(crate) fn parse_ticker(body: &str) -> Result<Option<f64>, SourceError> {
    let ticker: BinanceTicker = serde_json::from_str(body)
        .map_err(|e| SourceError::parse(format!("failed to parse binance ticker: {e}")))?;
    Ok(ticker.price.as_ref().and_then(json_price))
}

impl PriceSource for BinanceAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn get_prices<'a>(&'a self, assets: &'a [AssetId]) -> PricesFuture<'a> {
        Box::pin(async move {
            if assets.is_empty() {
                return Err(SourceError::invalid_request(
                    "binance price request requires at least one asset",
                ));
            }

            let started = Instant::now();
            let mut quotes = PriceBook::new();
            let mut http_status = 200;
            let mut attempts = 0_u32;

            for asset in assets {
                attempts += 1;
                let request =
                    HttpRequest::get(TICKER_PRICE_URL).with_query("symbol", ticker_symbol(asset));
                let (response, _) = timed_get(self.http_client.as_ref(), NAME, request).await?;
                http_status = response.status;
                if !response.is_success() {
                    return Err(SourceError::upstream_status(NAME, response.status));
                }

                if let Some(price) = parse_ticker(&response.body)? {
                    quotes.insert(asset.clone(), price);
                }
            }

            if quotes.is_empty() {
                return Err(SourceError::empty(NAME));
            }

            Ok(SourcePrices {
                quotes,
                meta: FetchMeta::new(http_status, elapsed_ms(started), attempts),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::{assets, block_on, ScriptedHttpClient};
    use crate::http_client::HttpResponse;
    use crate::source::SourceErrorKind;

    #[test]
    fn maps_known_and_unknown_slugs_to_usdt_pairs() {
        let requested = assets(&["bitcoin", "ethereum", "solana", "dogecoin"]);
        let symbols = requested.iter().map(ticker_symbol).collect::<Vec<_>>();
        assert_eq!(symbols, vec!["BTCUSDT", "ETHUSDT", "SOLUSDT", "DOGECOINUSDT"]);
    }

    #[test]
    fn issues_one_request_per_asset_and_counts_attempts() {
        let client = Arc::new(ScriptedHttpClient::new(vec![
            Ok(HttpResponse::ok_json(r#"{"symbol":"BTCUSDT","price":"43000.10"}"#)),
            Ok(HttpResponse::ok_json(r#"{"symbol":"ETHUSDT","price":"2300.5"}"#)),
        ]));
        let adapter = BinanceAdapter::with_http_client(client.clone());
        let requested = assets(&["bitcoin", "ethereum"]);

        let prices = block_on(adapter.get_prices(&requested)).expect("fetch");

        assert_eq!(prices.quotes.get(&requested[0]), Some(43000.10));
        assert_eq!(prices.quotes.get(&requested[1]), Some(2300.5));
        assert_eq!(prices.meta.attempts, 2);
        assert_eq!(prices.meta.http_status, 200);

        let symbols = client
            .recorded_requests()
            .iter()
            .map(|request| request.query_param("symbol").map(str::to_owned))
            .collect::<Vec<_>>();
        assert_eq!(
            symbols,
            vec![Some(String::from("BTCUSDT")), Some(String::from("ETHUSDT"))]
        );
    }

    #[test]
    fn ticker_without_price_is_skipped() {
        let client = Arc::new(ScriptedHttpClient::new(vec![
            Ok(HttpResponse::ok_json(r#"{"symbol":"BTCUSDT","price":"43000"}"#)),
            Ok(HttpResponse::ok_json(r#"{"symbol":"FOOUSDT"}"#)),
        ]));
        let adapter = BinanceAdapter::with_http_client(client);

        let prices = block_on(adapter.get_prices(&assets(&["bitcoin", "foo"]))).expect("fetch");
        assert_eq!(prices.quotes.len(), 1);
        assert_eq!(prices.meta.attempts, 2);
    }

    #[test]
    fn non_success_status_on_any_call_fails() {
        let client = Arc::new(ScriptedHttpClient::new(vec![
            Ok(HttpResponse::ok_json(r#"{"price":"43000"}"#)),
            Ok(HttpResponse::new(400, r#"{"code":-1121,"msg":"Invalid symbol."}"#)),
        ]));
        let adapter = BinanceAdapter::with_http_client(client);

        let error =
            block_on(adapter.get_prices(&assets(&["bitcoin", "notacoin"]))).expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::UpstreamStatus);
        assert_eq!(error.http_status(), Some(400));
    }
}
