mod api;
mod config;
mod error;
mod extract;
mod fetcher;
mod normalize;
mod schedule;
mod service;
mod state;
mod types;

use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState};
use crate::config::Config;
use crate::error::Result;
use crate::fetcher::Fetcher;

#[tokio::main]
async fn main() {
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
    match &cfg.kbo_json_url {
        Some(url) => info!("Season feed: {url}"),
        None => warn!("KBO_JSON_URL not set: team tables come from the ranking page only, /rankings/monthly disabled"),
    }
    info!(
        "Upstreams: naver_mobile={} naver_api={} kbo_site={} season={}",
        cfg.naver_mobile_url, cfg.naver_api_url, cfg.kbo_site_url, cfg.season,
    );

    // --- Shared state ---
    let health = Arc::new(HealthState::new());
    let latency = Arc::new(LatencyStats::new());
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let fetcher = Arc::new(Fetcher::new(cfg, Arc::clone(&health), Arc::clone(&latency))?);

    // --- HTTP API server ---
    let app = router(ApiState { fetcher, health, latency });
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
