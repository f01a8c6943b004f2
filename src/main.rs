// pinscrape: harvest pins and images for every topic of the selected categories.
//
// Configuration comes from the environment (and `.env`). The first Ctrl-C
// stops new work and lets finished topics be written; a second one exits
// immediately.

use anyhow::{Context, Result};
use pinscrape::{ScrapeConfig, ScrapeError, ShutdownSignal, logging};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ScrapeConfig::from_env().context("Invalid configuration")?;

    let _log_guard = logging::init(config.log_level(), config.log_file().map(|p| p.as_path()))?;

    info!(
        "Starting pinscrape: categories {}, {} pins per topic, output {}",
        config.categories(),
        config.max_pins_per_topic(),
        config.output_folder().display()
    );

    let shutdown = ShutdownSignal::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("Interrupt received, finishing in-flight work (Ctrl-C again to abort)");
        signal.trigger();

        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Second interrupt, exiting now");
            std::process::exit(130);
        }
    });

    let result = match pinscrape::scrape(config, shutdown).await {
        Ok(result) => result,
        Err(ScrapeError::Cancelled) => {
            info!("Interrupted before the browser started");
            return Ok(());
        }
        Err(e) => return Err(e).context("Scrape run failed"),
    };

    if result.cancelled() {
        info!("Run interrupted after {} topics", result.finished_topics());
    }
    Ok(())
}
