//! Axum-based API gateway for the Oracle funnel. Holds every credential
//! server-side: the frontend is a stateless client and never sees an LLM or
//! TTS key. Sessions live in memory for the lifetime of the process.

mod handlers;
mod services;

use axum::extract::State;
use axum::http::Method;
use axum::routing::{get, post};
use axum::{Json, Router};
use oracle_core::{EnhanceClient, OracleConfig};
use oracle_voice::ElevenLabsTts;
use serde_json::json;
use services::SessionService;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub struct AppState {
    pub config: OracleConfig,
    pub enhance: Option<EnhanceClient>,
    pub tts: Option<ElevenLabsTts>,
    pub sessions: SessionService,
}

impl AppState {
    fn from_env() -> Self {
        let config = OracleConfig::from_env();
        let enhance = if config.enhance_enabled {
            EnhanceClient::from_env().map(|c| c.with_timeout(config.enhance_timeout_secs))
        } else {
            None
        };
        if enhance.is_none() {
            tracing::info!(target: "oracle::gateway", "no LLM credential, serving scripted copy only");
        }
        let tts = match ElevenLabsTts::from_env()
            .and_then(|t| t.with_timeout(config.speech_timeout_secs))
        {
            Ok(tts) => Some(tts),
            Err(e) => {
                tracing::info!(target: "oracle::gateway", "speech disabled: {}", e);
                None
            }
        };
        let sessions = SessionService::new(config.clone(), enhance.clone());
        Self {
            config,
            enhance,
            tts,
            sessions,
        }
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "sessions": state.sessions.len(),
        "enhance": state.enhance.is_some(),
        "speech": state.tts.is_some(),
    }))
}

fn build_app(state: Arc<AppState>) -> Router {
    // The widget embeds on arbitrary landing pages, so CORS stays open.
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/oracle", post(handlers::oracle::post_oracle))
        .route("/api/speech", post(handlers::speech::post_speech))
        .route("/api/speech/ws-auth", get(handlers::speech::get_ws_auth))
        .route("/api/v1/session", post(handlers::session::create_session))
        .route(
            "/api/v1/session/:id",
            get(handlers::session::get_session).delete(handlers::session::delete_session),
        )
        .route(
            "/api/v1/session/:id/message",
            post(handlers::session::post_message),
        )
        .route(
            "/api/v1/session/:id/purchase",
            post(handlers::session::post_purchase),
        )
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[oracle-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = Arc::new(AppState::from_env());
    let app = build_app(state);

    let port: u16 = std::env::var("ORACLE_PORT")
        .ok()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(8787);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!(target: "oracle::gateway", "oracle-gateway listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(target: "oracle::gateway", "bind {} failed: {}", addr, e);
            std::process::exit(1);
        }
    };
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!(target: "oracle::gateway", "server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(target: "oracle::gateway", "shutdown requested");
        }
    }
}
