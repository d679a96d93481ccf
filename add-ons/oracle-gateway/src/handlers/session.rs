//! Session endpoints: the conversation itself, driven over HTTP.
//!
//! A session is created, fed user input or a purchase action, and read back
//! as a transcript. State lives only in this process; an unknown id is 404.

use crate::services::TurnOutcome;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use oracle_core::OracleEvent;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub outcome: TurnOutcome,
}

#[derive(Debug, Deserialize)]
pub struct SessionInput {
    pub text: String,
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "unknown session" }))).into_response()
}

pub async fn create_session(State(state): State<Arc<AppState>>) -> Json<SessionCreated> {
    let (session_id, outcome) = state.sessions.create().await;
    Json(SessionCreated {
        session_id,
        outcome,
    })
}

pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(input): Json<SessionInput>,
) -> Response {
    match state
        .sessions
        .apply(id, OracleEvent::UserInput(input.text))
        .await
    {
        Some(outcome) => Json(outcome).into_response(),
        None => not_found(),
    }
}

pub async fn post_purchase(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    match state.sessions.apply(id, OracleEvent::Purchase).await {
        Some(outcome) => Json(outcome).into_response(),
        None => not_found(),
    }
}

pub async fn get_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    match state.sessions.snapshot(id).await {
        Some(outcome) => Json(outcome).into_response(),
        None => not_found(),
    }
}

pub async fn delete_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    if state.sessions.close(id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found()
    }
}
