//! Control Surface (C10) — external collaborator
//!
//! HTTP endpoints exposing the engine's observable status and lifecycle.
//! Grounded on the retrieval pack's `dawsh2-AlphaPulse` API server: an
//! `axum::Router` with CORS and tracing layers, serving JSON from shared
//! application state.
//!
//! Author: AI-Generated
//! Created: 2026-01-29

use crate::scheduler::Engine;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
struct AppState {
    engine: Arc<Engine>,
}

#[derive(Serialize)]
struct ConfigView {
    preferred_token_name: String,
    trade_interval_ms: u64,
    max_slippage: String,
    enable_arbitrage: bool,
    arbitrage_check_interval_ms: u64,
    enable_trading: bool,
    port: u16,
}

pub fn router(engine: Arc<Engine>) -> Router {
    let state = AppState { engine };
    Router::new()
        .route("/", get(status_page))
        .route("/api/status", get(get_status))
        .route("/api/start", post(post_start))
        .route("/api/stop", post(post_stop))
        .route("/api/config", get(get_config))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.engine.status())
}

async fn post_start(State(state): State<AppState>) -> impl IntoResponse {
    state.engine.start();
    Json(state.engine.status())
}

async fn post_stop(State(state): State<AppState>) -> impl IntoResponse {
    state.engine.stop();
    Json(state.engine.status())
}

async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.engine.config();
    Json(ConfigView {
        preferred_token_name: config.preferred_token_name.clone(),
        trade_interval_ms: config.trade_interval_ms,
        max_slippage: config.max_slippage.to_string(),
        enable_arbitrage: config.enable_arbitrage,
        arbitrage_check_interval_ms: config.arbitrage_check_interval_ms,
        enable_trading: config.enable_trading,
        port: config.port,
    })
}

async fn status_page(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.engine.status();
    Html(format!(
        "<html><head><title>Trading Agent Status</title></head><body>\
         <h1>Trading Agent</h1>\
         <p>Running: {}</p>\
         <p>Uptime: {}s</p>\
         <p>Success rate: {}%</p>\
         </body></html>",
        status.running, status.uptime_seconds, status.success_rate_percent
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_view_serializes_without_secrets() {
        let view = ConfigView {
            preferred_token_name: "$GALA".into(),
            trade_interval_ms: 60_000,
            max_slippage: "5".into(),
            enable_arbitrage: false,
            arbitrage_check_interval_ms: 120_000,
            enable_trading: false,
            port: 3000,
        };
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("signing_key"));
        assert!(!json.contains("GALACHAIN_PRIVATE_KEY"));
    }
}
