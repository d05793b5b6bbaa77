mod analysis;
mod api;
mod config;
mod error;
mod fetcher;
mod source;
mod types;

use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::analysis::{HitRateEngine, ThresholdLadder};
use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState};
use crate::config::Config;
use crate::error::Result;
use crate::fetcher::NbaStatsClient;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let health = Arc::new(HealthState::new());
    let latency = Arc::new(LatencyStats::new());

    // --- Upstream client ---
    let nba = Arc::new(NbaStatsClient::new(
        &cfg,
        Arc::clone(&health),
        Arc::clone(&latency),
    )?);
    info!(
        "stats provider {} (timeout {}s, {} attempts, {}s between retries, default season {})",
        cfg.nba_stats_url,
        cfg.request_timeout_secs,
        cfg.max_retries,
        cfg.retry_delay_secs,
        nba.default_season(),
    );

    let hit_rates = HitRateEngine::new(ThresholdLadder::standard()?);
    info!(
        "hit-rate ladder: {} categories",
        hit_rates.ladder().categories().count()
    );

    // HTTP API server
    let api_state = ApiState {
        games: nba.clone(),
        datasets: nba,
        hit_rates: Arc::new(hit_rates),
        health,
        latency,
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
