use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use coinsnap_core::{FetchStatus, Scheduler, StatusSnapshot, UtcDateTime};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use super::AppError;

pub fn router(scheduler: Arc<Scheduler>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/fetch", post(fetch_now))
        .layer(TraceLayer::new_for_http())
        .with_state(scheduler)
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: FetchStatus,
    time: UtcDateTime,
    last_success: Option<UtcDateTime>,
    last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_source: Option<String>,
    /// Number of prices in the last successful fetch.
    prices: usize,
}

/// 200 only while the last fetch succeeded.
async fn health(State(scheduler): State<Arc<Scheduler>>) -> (StatusCode, Json<HealthBody>) {
    let state = scheduler.status();
    let code = match state.status {
        FetchStatus::Ok => StatusCode::OK,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    };

    let body = HealthBody {
        status: state.status,
        time: UtcDateTime::now(),
        last_success: state.last_success,
        last_error: state.last_error,
        last_path: state.last_path,
        last_source: state.last_source,
        prices: state.prices,
    };
    (code, Json(body))
}

#[derive(Debug, Serialize)]
struct StatusBody {
    #[serde(flatten)]
    state: StatusSnapshot,
    time: UtcDateTime,
}

async fn status(State(scheduler): State<Arc<Scheduler>>) -> Json<StatusBody> {
    Json(StatusBody {
        state: scheduler.status(),
        time: UtcDateTime::now(),
    })
}

#[derive(Debug, Serialize)]
struct FetchBody {
    status: &'static str,
    file: PathBuf,
    prices: usize,
}

async fn fetch_now(State(scheduler): State<Arc<Scheduler>>) -> Result<Json<FetchBody>, AppError> {
    let outcome = scheduler
        .trigger_fetch()
        .await
        .map_err(|error| AppError::Fetch(error.to_string()))?;

    Ok(Json(FetchBody {
        status: "ok",
        file: outcome.path,
        prices: outcome.prices.len(),
    }))
}
