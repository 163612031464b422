mod clock;
mod config;
mod engine;
mod events;
mod execution;
mod instruments;
mod kraken;
mod market;
mod position;
mod quoting;
mod scenario;
mod strategy;
mod types;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::clock::tokio_timers::TokioTimers;
use crate::config::strategy_config::StrategyConfig;
use crate::events::StrategyEvent;
use crate::execution::order_gateway::{OrderGateway, run_execution};
use crate::execution::order_report::OrderReport;
use crate::instruments::instrument_cache::InstrumentCache;
use crate::market::subscriptions::FeedSubscriptions;
use crate::scenario::scenario::Scenario;
use crate::scenario::venues::VenueKind;
use crate::strategy::quote_cycle_controller::QuoteCycleController;
use crate::strategy::strategy_context::StrategyContext;

#[derive(Debug, Clone, Parser)]
struct Args {
    #[arg(long, value_enum, default_value = "dry-run")]
    pub venue: VenueKind,

    #[arg(long, default_value = StrategyConfig::DEFAULT_FILE_NAME)]
    pub config: PathBuf,

    #[arg(long, default_value = InstrumentCache::DEFAULT_FILE_NAME)]
    pub instruments: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("requoter=debug".parse()?))
        .with_target(false)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    let config = StrategyConfig::load(&args.config)?;
    let instruments = InstrumentCache::load(&args.instruments)?;
    info!(instruments = instruments.len(), path = %args.instruments.display(), "instruments loaded");

    let (order_report_sender, _) = broadcast::channel::<OrderReport>(10_000);
    let mut order_report_log_receiver = order_report_sender.subscribe();

    tokio::spawn(async move {
        loop {
            match order_report_log_receiver.recv().await {
                Ok(report) => info!(?report),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(lagged = n, "order report logger lagged; dropped messages");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let venue = Scenario::execution_venue(args.venue, order_report_sender.clone())?;
    let positions = venue
        .spawn_positions(config.instrument_id())
        .await
        .context("failed to start position feed")?;
    let market_source = Scenario::market_source(config.instrument_id())?;

    let (event_sender, mut event_receiver) = mpsc::channel::<StrategyEvent>(10_000);
    let (orders, order_actions) = OrderGateway::channel();
    let execution = tokio::spawn(run_execution(venue, order_actions));

    let ctx = StrategyContext {
        instruments: Box::new(instruments),
        market_data: Box::new(FeedSubscriptions::new(market_source, event_sender.clone())),
        positions,
        timers: Box::new(TokioTimers::new(event_sender)),
        orders,
    };

    let mut controller = QuoteCycleController::new(config, ctx);

    let shutdown = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {error:?}");
            std::future::pending::<()>().await;
        }
    };

    let outcome = engine::run(&mut controller, &mut event_receiver, shutdown).await;

    /* Dropping the controller releases the last order gateway so the execution task can drain. */
    drop(controller);
    execution.await?;

    if let Err(error) = &outcome {
        error!("strategy failed: {error:?}");
    }

    outcome
}
