mod fetch;
mod latest;
mod serve;

use std::time::Duration;

use coinsnap_core::{FailoverFetcher, Scheduler, SnapshotStore};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    let store = SnapshotStore::new(&cli.data_dir);

    match &cli.command {
        Command::Serve(args) => {
            let interval = Duration::from_secs(args.interval_secs);
            serve::run(args, build_scheduler(cli, store, interval)?).await
        }
        Command::Fetch => {
            fetch::run(&build_scheduler(cli, store, coinsnap_core::scheduler::DEFAULT_INTERVAL)?)
                .await
        }
        Command::Latest(args) => latest::run(args, store).await,
    }
}

fn build_scheduler(
    cli: &Cli,
    store: SnapshotStore,
    interval: Duration,
) -> Result<Scheduler, CliError> {
    Ok(Scheduler::new(
        FailoverFetcher::default(),
        store,
        cli.asset_list()?,
        interval,
    ))
}
