use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use coinsnap_core::{query, requested_assets, QueryHealth, SnapshotStore};
use tower_http::trace::TraceLayer;

use super::AppError;

pub fn router(store: SnapshotStore) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/latest", get(latest))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

/// Always 200; `status` tells whether any snapshot exists.
async fn health(State(store): State<SnapshotStore>) -> Result<Json<QueryHealth>, AppError> {
    let health = tokio::task::spawn_blocking(move || query::health(&store))
        .await
        .map_err(|error| AppError::Task(error.to_string()))??;
    Ok(Json(health))
}

/// `coin` and `asset` are both accepted, repeatable and comma-separable.
async fn latest(
    State(store): State<SnapshotStore>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let raw = ["coin", "asset"]
        .into_iter()
        .flat_map(|key| {
            params
                .iter()
                .filter(move |(name, _)| name == key)
                .map(|(_, value)| value.as_str())
        })
        .collect::<Vec<_>>();
    let requested = requested_assets(raw);

    let response = tokio::task::spawn_blocking(move || query::get_latest(&store, &requested))
        .await
        .map_err(|error| AppError::Task(error.to_string()))??
        .ok_or(AppError::NoData)?;

    let code = if response.is_complete() {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    Ok((code, Json(response)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use coinsnap_core::{AssetId, FetchMeta, PriceBook, UtcDateTime};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn seed(store: &SnapshotStore) {
        let quotes = [("bitcoin", 42_000.5), ("ethereum", 2_500.0)]
            .into_iter()
            .map(|(asset, price)| (AssetId::parse(asset).unwrap(), price))
            .collect::<PriceBook>();
        store
            .append_at(
                UtcDateTime::parse("2024-01-01T00:00:30Z").unwrap(),
                "coincap",
                &quotes,
                FetchMeta::new(200, 48, 1),
            )
            .unwrap();
    }

    #[tokio::test]
    async fn empty_store_is_degraded_and_has_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(SnapshotStore::new(dir.path()));

        let (status, json) = get_json(app.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["error"], "no snapshot available");

        let (status, json) = get_json(app, "/latest").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json, serde_json::json!({ "error": "no data" }));
    }

    #[tokio::test]
    async fn latest_without_params_returns_last_row() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        seed(&store);
        let app = router(store);

        let (status, json) = get_json(app.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert!(json["snapshot"].as_str().unwrap().ends_with("prices-0000.csv"));

        let (status, json) = get_json(app, "/latest").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["last"]["asset"], "ethereum");
        assert_eq!(json["last"]["source"], "coincap");
        assert_eq!(json["last"]["latency_ms"], 48);
    }

    #[tokio::test]
    async fn coin_and_asset_params_are_merged_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        seed(&store);
        let app = router(store);

        let (status, json) = get_json(app, "/latest?coin=BITCOIN&asset=Ethereum,bitcoin").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["coins"]["bitcoin"]["price_usd"], 42_000.5);
        assert_eq!(json["coins"]["Ethereum"]["price_usd"], 2_500.0);
        assert!(json["coins"].get("BITCOIN").is_none());
        assert!(json.get("missing").is_none());
    }

    #[tokio::test]
    async fn unknown_coin_yields_404_with_partial_body() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        seed(&store);
        let app = router(store);

        let (status, json) = get_json(app, "/latest?coin=bitcoin&coin=NotACoin").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            json["coins"]["NotACoin"]["error"],
            "price not available in latest snapshot"
        );
        assert_eq!(json["coins"]["bitcoin"]["http_status"], 200);
        assert_eq!(json["missing"], serde_json::json!(["NotACoin"]));
    }
}
