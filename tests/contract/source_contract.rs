use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

use coinsnap_core::{
    AssetId, BinanceAdapter, CoinCapAdapter, CoinGeckoAdapter, CoinbaseAdapter, HttpClient,
    HttpError, HttpRequest, HttpResponse, PriceSource, SourceErrorKind,
};

/// Answers every request with the same canned response.
struct CannedHttpClient {
    response: Result<HttpResponse, HttpError>,
    calls: AtomicUsize,
}

impl CannedHttpClient {
    fn new(response: Result<HttpResponse, HttpError>) -> Arc<Self> {
        Arc::new(Self {
            response,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HttpClient for CannedHttpClient {
    fn execute<'a>(
        &'a self,
        _request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self.response.clone();
        Box::pin(async move { response })
    }
}

struct SourceCase {
    name: &'static str,
    /// Body that prices both `bitcoin` and `ethereum`.
    happy_body: &'static str,
    build: fn(Arc<dyn HttpClient>) -> Arc<dyn PriceSource>,
}

fn source_cases() -> Vec<SourceCase> {
    vec![
        SourceCase {
            name: "coingecko",
            happy_body: r#"{"bitcoin":{"usd":43000.5},"ethereum":{"usd":2300}}"#,
            build: |client| Arc::new(CoinGeckoAdapter::with_http_client(client)),
        },
        SourceCase {
            name: "coincap",
            happy_body: r#"{"data":[{"id":"bitcoin","priceUsd":"43000.5"},{"id":"ethereum","priceUsd":"2300.0"}]}"#,
            build: |client| Arc::new(CoinCapAdapter::with_http_client(client)),
        },
        SourceCase {
            name: "binance",
            happy_body: r#"{"symbol":"XUSDT","price":"43000.50000000"}"#,
            build: |client| Arc::new(BinanceAdapter::with_http_client(client)),
        },
        SourceCase {
            name: "coinbase",
            happy_body: r#"{"data":{"currency":"USD","rates":{"BTC":"0.00002","ETH":"0.0005"}}}"#,
            build: |client| Arc::new(CoinbaseAdapter::with_http_client(client)),
        },
    ]
}

fn requested() -> Vec<AssetId> {
    AssetId::parse_list("bitcoin,ethereum").expect("valid assets")
}

#[test]
fn every_source_reports_its_name() {
    let names = source_cases()
        .iter()
        .map(|case| {
            let client: Arc<dyn HttpClient> = CannedHttpClient::new(Ok(HttpResponse::ok_json("{}")));
            (case.build)(client).name()
        })
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["coingecko", "coincap", "binance", "coinbase"]);
}

#[test]
fn happy_response_yields_finite_positive_prices_for_requested_assets() {
    for case in source_cases() {
        let client = CannedHttpClient::new(Ok(HttpResponse::ok_json(case.happy_body)));
        let source = (case.build)(client.clone());

        let prices = block_on(source.get_prices(&requested()))
            .unwrap_or_else(|error| panic!("source '{}' failed: {error}", case.name));

        assert_eq!(prices.quotes.len(), 2, "source '{}': quote count", case.name);
        for quote in prices.quotes.iter() {
            assert!(
                quote.price_usd.is_finite() && quote.price_usd > 0.0,
                "source '{}': bad price for {}",
                case.name,
                quote.asset
            );
            assert_eq!(quote.asset.as_str(), quote.asset.as_str().to_lowercase());
        }
        assert_eq!(prices.meta.http_status, 200, "source '{}'", case.name);
        assert_eq!(
            prices.meta.attempts as usize,
            client.calls(),
            "source '{}': attempts must equal HTTP calls",
            case.name
        );
    }
}

#[test]
fn empty_asset_list_is_rejected_without_network() {
    for case in source_cases() {
        let client = CannedHttpClient::new(Ok(HttpResponse::ok_json(case.happy_body)));
        let source = (case.build)(client.clone());

        let error = block_on(source.get_prices(&[])).expect_err("empty request must fail");
        assert_eq!(error.kind(), SourceErrorKind::InvalidRequest, "source '{}'", case.name);
        assert_eq!(client.calls(), 0, "source '{}'", case.name);
    }
}

#[test]
fn non_success_status_is_an_upstream_error() {
    for case in source_cases() {
        let client: Arc<dyn HttpClient> =
            CannedHttpClient::new(Ok(HttpResponse::new(503, r#"{"error":"busy"}"#)));
        let error = block_on((case.build)(client).get_prices(&requested()))
            .expect_err("503 must fail");

        assert_eq!(error.kind(), SourceErrorKind::UpstreamStatus, "source '{}'", case.name);
        assert_eq!(error.http_status(), Some(503));
    }
}

#[test]
fn transport_failure_is_unavailable() {
    for case in source_cases() {
        let client: Arc<dyn HttpClient> =
            CannedHttpClient::new(Err(HttpError::timeout("request timed out")));
        let error = block_on((case.build)(client).get_prices(&requested()))
            .expect_err("transport failure must fail");

        assert_eq!(error.kind(), SourceErrorKind::Unavailable, "source '{}'", case.name);
        assert!(
            error.message().starts_with(&format!("{} timed out", case.name)),
            "source '{}': {}",
            case.name,
            error.message()
        );
    }
}

#[test]
fn unparseable_body_is_a_parse_error() {
    for case in source_cases() {
        let client: Arc<dyn HttpClient> = CannedHttpClient::new(Ok(HttpResponse::ok_json("<html>")));
        let error = block_on((case.build)(client).get_prices(&requested()))
            .expect_err("garbage must fail");

        assert_eq!(error.kind(), SourceErrorKind::Parse, "source '{}'", case.name);
    }
}

fn block_on<F>(future: F) -> F::Output
where
    F: Future,
{
    let waker = noop_waker();
    let mut context = Context::from_waker(&waker);
    let mut future = std::pin::pin!(future);

    loop {
        match future.as_mut().poll(&mut context) {
            Poll::Ready(output) => return output,
            Poll::Pending => std::thread::yield_now(),
        }
    }
}

fn noop_waker() -> Waker {
    // SAFETY: the vtable functions never touch the data pointer.
    unsafe { Waker::from_raw(noop_raw_waker()) }
}

fn noop_raw_waker() -> RawWaker {
    RawWaker::new(std::ptr::null(), &NOOP_RAW_WAKER_VTABLE)
}

unsafe fn noop_clone(_: *const ()) -> RawWaker {
    noop_raw_waker()
}

unsafe fn noop(_: *const ()) {}

static NOOP_RAW_WAKER_VTABLE: RawWakerVTable = RawWakerVTable::new(noop_clone, noop, noop, noop);
