//! Autonomous trading agent — binary entry point.
//!
//! Author: AI-Generated
//! Created: 2026-01-29

use amm_trade_agent::arbitrage::ArbitrageDetector;
use amm_trade_agent::config::{load_config, Cli};
use amm_trade_agent::execution::Executor;
use amm_trade_agent::pool::PoolCache;
use amm_trade_agent::registry::Registry;
use amm_trade_agent::scheduler::Engine;
use amm_trade_agent::transport::{GatewayClient, NotificationChannel};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const HISTORY_CAPACITY: usize = 1000;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = match load_config(cli) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            let exit_code = if e.to_string().contains("required") {
                2
            } else {
                1
            };
            std::process::exit(exit_code);
        }
    };

    if config.enable_trading {
        warn!("Executor in LIVE mode — real swaps will be submitted");
    } else {
        info!("Executor in dry-run mode (ENABLE_TRADING=false)");
    }

    let registry = match Registry::load(".") {
        Ok(r) => Arc::new(r),
        Err(e) => {
            error!(error = %e, "failed to load token/pool registry");
            std::process::exit(1);
        }
    };

    let gateway = GatewayClient::new(config.gateway.clone());
    let cache = Arc::new(PoolCache::new(
        Arc::new(GatewayClient::new(config.gateway.clone())),
        Duration::from_millis(config.arbitrage_pool_cache_ttl_ms),
    ));

    let mut notifications = NotificationChannel::new(format!(
        "{}{}",
        config.gateway.backend_url, "/notifications"
    ));
    notifications.open();

    let executor = Arc::new(Executor::new(gateway, notifications, config.clone()));
    let detector = Arc::new(ArbitrageDetector::new(HISTORY_CAPACITY));

    let engine = Arc::new(Engine::new(
        config.clone(),
        Arc::clone(&registry),
        Arc::clone(&cache),
        Arc::clone(&executor),
        Arc::clone(&detector),
    ));
    engine.start();

    let control_engine = Arc::clone(&engine);
    let port = config.port;
    let server_task = tokio::spawn(async move {
        let app = amm_trade_agent::control::router(control_engine);
        let listener = match tokio::net::TcpListener::bind(("0.0.0.0", port)).await {
            Ok(l) => l,
            Err(e) => {
                error!(error = %e, "failed to bind control surface port");
                return;
            }
        };
        info!(port, "control surface listening");
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "control surface server error");
        }
    });

    wait_for_shutdown_signal().await;
    info!("shutdown signal received");

    engine.stop();
    server_task.abort();

    info!("clean shutdown");
    std::process::exit(0);
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
