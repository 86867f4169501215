// src/main.rs
//! Referral Suitability Service — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and metrics.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use referral_suitability_analyzer::ai_adapter::AiConfig;
use referral_suitability_analyzer::api::AppState;
use referral_suitability_analyzer::config::ServiceConfig;
use referral_suitability_analyzer::metrics::Metrics;
use referral_suitability_analyzer::router;

/// Compact logs by default; REFERRAL_LOG_JSON=1 switches to JSON output
/// for log shippers.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("referral_suitability_analyzer=info,warn"));

    let json = std::env::var("REFERRAL_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = ServiceConfig::load();
    let ai_cfg = AiConfig::load_or_disabled(&cfg.ai_config_path);

    let metrics = Metrics::init(ai_cfg.daily_limit);
    let state = AppState::from_config(&cfg);
    let app = router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
