//! `POST /api/speech` and `GET /api/speech/ws-auth`.
//!
//! Success returns raw `audio/mpeg` bytes; every failure returns `{error}`
//! JSON with an appropriate status and the client falls back to estimated
//! caption timing. The ws-auth variant hands a per-session credential grant
//! to clients doing streaming TTS directly, so the API key never ships in a
//! client bundle.

use crate::AppState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use oracle_voice::{SpeechError, TtsBackend, WsAuthGrant};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
}

fn error_json(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "error": error }))).into_response()
}

pub async fn post_speech(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SpeechRequest>,
) -> Response {
    if request.text.trim().is_empty() {
        return error_json(StatusCode::BAD_REQUEST, "text is required");
    }
    let Some(tts) = state.tts.as_ref() else {
        return error_json(StatusCode::SERVICE_UNAVAILABLE, "speech is not configured");
    };

    match tts.synthesize(&request.text).await {
        Ok(bytes) if bytes.is_empty() => {
            error_json(StatusCode::SERVICE_UNAVAILABLE, "no audio produced")
        }
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "audio/mpeg")],
            bytes,
        )
            .into_response(),
        Err(SpeechError::Upstream { status, body }) => {
            warn!(target: "oracle::speech", status, "upstream synthesis failed");
            let status =
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error_json(status, &body)
        }
        Err(e) => {
            warn!(target: "oracle::speech", "synthesis failed: {}", e);
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "synthesis failed")
        }
    }
}

pub async fn get_ws_auth(State(state): State<Arc<AppState>>) -> Response {
    match state.tts.as_ref() {
        Some(tts) => Json(WsAuthGrant::for_backend(tts)).into_response(),
        None => error_json(StatusCode::SERVICE_UNAVAILABLE, "speech is not configured"),
    }
}
