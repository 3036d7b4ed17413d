// src/api.rs
//! HTTP front for the presentation layer. One subject view at a time: posting
//! a new subject is a navigation, so the previous report is discarded first.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::orchestrator::{Orchestrator, OrchestratorState, ReportSession};
use crate::presentation::QueuedOpener;
use crate::report::Report;

#[derive(Clone)]
pub struct AppState {
    orchestrator: Orchestrator,
    opener: Arc<QueuedOpener>,
    session: Arc<Mutex<Option<ReportSession>>>,
}

impl AppState {
    /// Wires a queued opener into the orchestrator so `/open` requests can be polled.
    pub fn new(orchestrator: Orchestrator) -> Self {
        let opener = Arc::new(QueuedOpener::default());
        Self {
            orchestrator: orchestrator.with_opener(opener.clone()),
            opener,
            session: Arc::new(Mutex::new(None)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/subject", post(open_subject).delete(close_subject))
        .route("/report", get(current_report))
        .route("/report/state", get(current_state))
        .route("/open", post(open_url).get(pending_urls))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct PageReq {
    url: String,
}

#[derive(Serialize)]
struct SubjectResp {
    subject: String,
    state: OrchestratorState,
}

#[derive(Serialize)]
struct ErrorResp {
    error: String,
}

#[derive(Serialize)]
struct StateResp {
    subject: Option<String>,
    state: OrchestratorState,
}

async fn open_subject(State(state): State<AppState>, Json(body): Json<PageReq>) -> Response {
    let mut slot = state.session.lock().await;
    if let Some(prev) = slot.take() {
        prev.discard().await;
    }

    match state.orchestrator.open_page(&body.url) {
        Ok(session) => {
            let resp = SubjectResp {
                subject: session.subject().to_string(),
                state: session.state(),
            };
            *slot = Some(session);
            (StatusCode::ACCEPTED, Json(resp)).into_response()
        }
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResp {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn close_subject(State(state): State<AppState>) -> StatusCode {
    let prev = state.session.lock().await.take();
    match prev {
        Some(session) => {
            session.discard().await;
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn current_report(State(state): State<AppState>) -> Json<Option<Report>> {
    let slot = state.session.lock().await;
    Json(slot.as_ref().map(ReportSession::snapshot))
}

async fn current_state(State(state): State<AppState>) -> Json<StateResp> {
    let slot = state.session.lock().await;
    Json(match slot.as_ref() {
        Some(s) => StateResp {
            subject: Some(s.subject().to_string()),
            state: s.state(),
        },
        None => StateResp {
            subject: None,
            state: OrchestratorState::Idle,
        },
    })
}

async fn open_url(State(state): State<AppState>, Json(body): Json<PageReq>) -> StatusCode {
    state.orchestrator.open_url(&body.url);
    StatusCode::ACCEPTED
}

async fn pending_urls(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.opener.drain())
}
