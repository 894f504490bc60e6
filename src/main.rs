mod calendar;
mod cli;
mod error;
mod history;
mod models;
mod orchestrator;
mod reconcile;
mod scrapers;
mod status;

use clap::Parser;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use calendar::HolidayCalendar;
use cli::Args;
use error::ScoutError;
use history::HistoryStore;
use orchestrator::{Orchestrator, ScrapeSettings};
use scrapers::ChromeDriver;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
        // --help / --version
        Err(e) => e.exit(),
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ScoutError>() {
                Some(scout) if scout.is_fatal() => error!("ERROR: {}", scout),
                _ => error!("ERROR: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    info!("🏠 Rental Scout");
    info!("==========================================");

    let config = args.into_config()?;
    let listings = cli::load_listings(&config.input)?;

    let holidays = match &config.holidays {
        Some(path) => HolidayCalendar::load(path)?,
        None => HolidayCalendar::default(),
    };
    let store = HistoryStore::load(&config.output, holidays)?;

    let driver = ChromeDriver::launch(&config.browser)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Keyboard interrupt detected, stopping after the current listing...");
                interrupted.store(true, Ordering::SeqCst);
            }
        });
    }

    let settings = ScrapeSettings {
        range: config.range,
        output: config.output.clone(),
        retry: config.retry,
    };
    let mut orchestrator = Orchestrator::new(driver, store, settings).with_interrupt(interrupted);

    info!(
        "Recording rental dates {} to {} for {} listings",
        config.range.begin,
        config.range.end,
        listings.len()
    );
    let summary = orchestrator.run(&listings).await?;

    info!("Scraping process done!");
    println!("\n✅ {}", summary);
    println!("💾 Saved to {}", config.output.display());

    Ok(())
}
