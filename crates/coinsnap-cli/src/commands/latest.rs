use coinsnap_core::{get_latest, requested_assets, LatestResponse, SnapshotStore};

use crate::cli::LatestArgs;
use crate::error::CliError;

/// Print the latest rows as JSON. Fails after printing when a requested asset
/// has no row.
pub async fn run(args: &LatestArgs, store: SnapshotStore) -> Result<(), CliError> {
    let requested = requested_assets(args.assets.iter().map(String::as_str));
    let base_dir = store.base_dir().to_path_buf();

    let response = tokio::task::spawn_blocking(move || get_latest(&store, &requested))
        .await
        .map_err(|error| CliError::Server(error.to_string()))??
        .ok_or(CliError::NoData(base_dir))?;

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{rendered}");

    match response {
        LatestResponse::Coins { missing, .. } if !missing.is_empty() => {
            Err(CliError::Missing(missing))
        }
        _ => Ok(()),
    }
}
