//! Ramouse Live
//!
//! Headless live-auction monitor. This binary:
//! - fetches the tracked auctions from the REST API
//! - subscribes to their real-time channels
//! - reconciles incoming events and logs spoken announcements

use ramouse_live::announcer::{Announcer, TracingSpeechEngine};
use ramouse_live::services::{AuctionApi, LiveSession};
use ramouse_live::transport::PusherTransport;
use ramouse_live::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        AppError::Config(e)
    })?;

    init_tracing(&config);

    info!("Ramouse live monitor starting");
    info!("Environment: {}", config.environment);
    info!("Realtime server: {}", config.realtime.url);
    info!("API: {}", config.api.base_url);

    if config.realtime.tracked_auctions.is_empty() {
        warn!("TRACKED_AUCTIONS is empty, no channels will be opened");
    }

    // =========================================================================
    // INITIAL STATE
    // =========================================================================
    let api = AuctionApi::new(&config.api)?;
    let mut auctions = Vec::new();
    for id in &config.realtime.tracked_auctions {
        match api.fetch_auction(id).await {
            Ok(auction) => {
                info!(
                    "Auction {}: {} at {} ({} bids)",
                    id,
                    auction.status.as_str(),
                    auction.current_bid,
                    auction.bid_count
                );
                auctions.push(auction);
            }
            Err(e) => error!("Skipping auction {}: {}", id, e),
        }
    }

    // =========================================================================
    // LIVE SESSION
    // =========================================================================
    let transport = PusherTransport::connect(&config.realtime.url).await?;

    let engine = TracingSpeechEngine::new(&config.speech.locale);
    let announcer = Announcer::new(Some(engine), config.speech.clone());

    let mut session = LiveSession::new(Arc::new(transport), announcer);
    session.track(auctions)?;
    info!("Tracking {} auctions", session.store().len());

    session
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await;

    info!("Ramouse live monitor stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("ramouse_live={}", config.log_level).into());

    if config.json_logs() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
