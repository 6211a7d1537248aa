use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use market_clock::clock::MarketClockSource;
use market_clock::config::MarketClockConfig;
use market_clock::coordinator::event_coordinator::EventCoordinator;
use market_clock::scenario::scenario::Scenario;
use market_clock::scenario::sinks::SinkKind;

#[derive(Debug, Clone, Parser)]
struct Args {
    /// YAML config; defaults to ./market_clock.yml when present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "log")]
    pub sink: SinkKind,

    /// Print the current session and exit.
    #[arg(long)]
    pub once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("market_clock=info".parse()?)
                .add_directive("market_clock::coordinator=debug".parse()?),
        )
        .with_target(false)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();
    let config = MarketClockConfig::load(args.config.as_deref())?;

    let clock = Scenario::clock(&config)?;
    match clock.current_session(Utc::now()) {
        Some(session) => info!(%session, "current session"),
        None => warn!("no session applies right now"),
    }

    if args.once {
        return Ok(());
    }

    let auth = Scenario::auth(&config);
    let connectivity = Scenario::connectivity(&config);
    let notifier = Scenario::notifier(args.sink);

    let mut coordinator = EventCoordinator::new(
        clock.clone(),
        auth.clone(),
        connectivity.clone(),
        notifier,
        config.notification_rule()?,
    )
    .with_quiet_period(config.quiet_period());

    coordinator.start().await;
    clock.start_polling();
    connectivity.start_probing();

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    coordinator.stop().await;

    Ok(())
}
