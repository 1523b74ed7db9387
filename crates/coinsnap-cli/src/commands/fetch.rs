use coinsnap_core::Scheduler;

use crate::error::CliError;

/// One-shot fetch: fetch, append and report where the rows went.
pub async fn run(scheduler: &Scheduler) -> Result<(), CliError> {
    let outcome = scheduler.trigger_fetch().await?;
    println!(
        "wrote {} prices from {} to {}",
        outcome.prices.len(),
        outcome.source,
        outcome.path.display()
    );
    Ok(())
}
