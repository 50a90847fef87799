//! # Seatwatch — ticket-sale availability monitor
//!
//! Long-lived daemon: scrape the target sale page headlessly, let an LLM
//! classifier decide availability, email the recipient list when a match
//! is confirmed. Runs once at startup and then on the configured cron
//! schedule until terminated.
//!
//! Usage:
//!   seatwatch                          # daemon on the configured schedule
//!   seatwatch --once                   # single run, print status, exit
//!   seatwatch --config ./watch.toml    # explicit config file

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use seatwatch_agent::{AvailabilityClassifier, Monitor};
use seatwatch_browser::PageFetcher;
use seatwatch_core::SeatwatchConfig;
use seatwatch_core::traits::GenerateParams;
use seatwatch_core::types::MatchQuery;
use seatwatch_notify::Mailer;
use seatwatch_scheduler::{CronSchedule, run_monitor_loop};

#[derive(Parser)]
#[command(
    name = "seatwatch",
    version,
    about = "Ticket-sale availability monitor: headless scrape, LLM classification, email alerts"
)]
struct Cli {
    /// Config file (default: ~/.seatwatch/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Run the pipeline once and exit instead of scheduling
    #[arg(long)]
    once: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug,chromiumoxide=info,hyper=info"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            let path = shellexpand::tilde(path).to_string();
            SeatwatchConfig::load_from(std::path::Path::new(&path))
                .with_context(|| format!("loading config from {path}"))?
        }
        None => SeatwatchConfig::load().context("loading config")?,
    };
    config.apply_env();
    config.validate().map_err(|e| anyhow!("{e}"))?;

    let schedule = CronSchedule::parse(&config.watch.schedule)
        .ok_or_else(|| anyhow!("invalid cron expression '{}'", config.watch.schedule))?;

    let provider = seatwatch_providers::create_provider(&config.llm).map_err(|e| anyhow!("{e}"))?;
    let notifier = Arc::new(Mailer::new(config.mail.clone()));
    let classifier = AvailabilityClassifier::new(
        provider,
        notifier,
        config.watch.recipients.clone(),
        GenerateParams {
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
        },
    );

    let fetcher = Arc::new(PageFetcher::new(config.browser.clone()));
    let monitor = Monitor::new(
        fetcher,
        classifier,
        config.watch.url.clone(),
        MatchQuery::new(config.watch.match_name.clone()),
    );

    tracing::info!(
        "watching '{}' at {} (schedule: {}, {} recipient(s))",
        config.watch.match_name,
        config.watch.url,
        config.watch.schedule,
        config.watch.recipients.len()
    );

    if cli.once {
        let status = monitor.run_once().await;
        println!("{status}");
        return Ok(());
    }

    run_monitor_loop(schedule, || monitor.run_once()).await;
    Ok(())
}
