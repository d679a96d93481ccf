//! `POST /api/oracle` — the enhancement endpoint.
//!
//! Without an upstream credential the endpoint always echoes `baseMessages`
//! with empty suggestions, status 200, so the client never needs a separate
//! no-AI code path.

use crate::AppState;
use axum::extract::State;
use axum::Json;
use oracle_core::{EnhanceMode, EnhanceRequest};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

pub async fn post_oracle(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EnhanceRequest>,
) -> Json<OracleResponse> {
    let Some(client) = state.enhance.as_ref() else {
        debug!(target: "oracle::enhance", phase = %request.phase, "no credential, echoing base messages");
        return Json(OracleResponse {
            messages: Some(request.base_messages.clone()),
            suggestions: Some(Vec::new()),
        });
    };
    let lines = client.enhance(&request).await;
    match request.mode {
        EnhanceMode::Suggestions => Json(OracleResponse {
            messages: None,
            suggestions: Some(lines),
        }),
        _ => Json(OracleResponse {
            messages: Some(lines),
            suggestions: Some(Vec::new()),
        }),
    }
}
