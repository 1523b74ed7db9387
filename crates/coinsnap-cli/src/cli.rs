//! CLI argument definitions for coinsnap.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `serve` | Run the fetch loop with the fetch and query HTTP surfaces |
//! | `fetch` | Fetch once, append the snapshot and exit |
//! | `latest` | Print the newest snapshot as JSON |
//!
//! # Global Options
//!
//! | Option | Env | Default |
//! |--------|-----|---------|
//! | `--assets` | `FETCH_ASSETS` | `bitcoin,ethereum,solana` |
//! | `--data-dir` | `DATA_DIR` | `data` |
//!
//! # Examples
//!
//! ```bash
//! coinsnap fetch --assets bitcoin,dogecoin
//! coinsnap latest --asset BTC --asset ethereum --pretty
//! FETCH_INTERVAL_SECONDS=30 coinsnap serve
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use coinsnap_core::{AssetId, ValidationError};

pub const DEFAULT_ASSETS: &str = "bitcoin,ethereum,solana";

/// Crypto spot price snapshots with multi-source failover.
#[derive(Debug, Parser)]
#[command(name = "coinsnap", author, version, about)]
pub struct Cli {
    /// Comma-separated asset ids to fetch.
    #[arg(long, global = true, env = "FETCH_ASSETS", default_value = DEFAULT_ASSETS)]
    pub assets: String,

    /// Base directory for snapshot partitions.
    #[arg(long, global = true, alias = "out", env = "DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the background fetch loop and both HTTP surfaces.
    Serve(ServeArgs),
    /// Fetch once and append a snapshot.
    Fetch,
    /// Print the latest snapshot.
    Latest(LatestArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port of the fetch surface (`/health`, `/status`, `/fetch`).
    #[arg(long, env = "FETCH_PORT", default_value_t = 8001)]
    pub fetch_port: u16,

    /// Port of the query surface (`/health`, `/latest`).
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub query_port: u16,

    /// Seconds between fetch starts. Values below 5 are raised to 5.
    #[arg(long, env = "FETCH_INTERVAL_SECONDS", default_value_t = 60)]
    pub interval_secs: u64,
}

#[derive(Debug, Args)]
pub struct LatestArgs {
    /// Asset to look up; repeatable and comma-separable.
    #[arg(long = "asset", value_name = "ASSET")]
    pub assets: Vec<String>,

    #[arg(long, default_value_t = false)]
    pub pretty: bool,
}

impl Cli {
    /// Configured assets, falling back to the defaults when the list is blank.
    pub fn asset_list(&self) -> Result<Vec<AssetId>, ValidationError> {
        let assets = AssetId::parse_list(&self.assets)?;
        if assets.is_empty() {
            return AssetId::parse_list(DEFAULT_ASSETS);
        }
        Ok(assets)
    }
}
