use std::future::IntoFuture;
use std::sync::Arc;

use coinsnap_core::Scheduler;
use tokio::net::TcpListener;

use crate::cli::ServeArgs;
use crate::error::CliError;
use crate::http;

/// Start the fetch loop, then serve both surfaces until either one stops.
pub async fn run(args: &ServeArgs, scheduler: Scheduler) -> Result<(), CliError> {
    let scheduler = Arc::new(scheduler);
    let store = scheduler.store().clone();

    let fetch_listener = bind(&args.host, args.fetch_port).await?;
    let query_listener = bind(&args.host, args.query_port).await?;

    scheduler.spawn();
    tracing::info!(
        data_dir = %store.base_dir().display(),
        interval_secs = scheduler.interval().as_secs(),
        "serving fetch and query surfaces"
    );

    let fetch_app = http::fetch_router(Arc::clone(&scheduler));
    let query_app = http::query_router(store);

    let served = tokio::select! {
        result = axum::serve(fetch_listener, fetch_app).into_future() => result,
        result = axum::serve(query_listener, query_app).into_future() => result,
    };
    served.map_err(|error| CliError::Server(error.to_string()))
}

async fn bind(host: &str, port: u16) -> Result<TcpListener, CliError> {
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| CliError::Bind {
            addr: addr.clone(),
            source,
        })?;
    tracing::info!(%addr, "listening");
    Ok(listener)
}
