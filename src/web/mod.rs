//! The single-page HTTP surface.
//!
//! One page with a link form, the video preview, the transcript and a
//! question form. All actions go through one session, one at a time.

mod page;

pub use page::{escape, render_page, render_preview, PageView};

use crate::controller::Session;
use crate::error::ChatAudioError;
use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Shared application state.
pub struct AppState {
    session: Mutex<Session>,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/media", post(submit_media))
        .route("/ask", post(ask))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

#[derive(Deserialize)]
struct MediaForm {
    url: String,
}

#[derive(Deserialize)]
struct AskForm {
    question: String,
}

/// HTTP status used when rendering `err` on the page.
fn status_for(err: &ChatAudioError) -> StatusCode {
    match err {
        ChatAudioError::MediaUnavailable(_) | ChatAudioError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ChatAudioError::NoTranscriptAvailable => StatusCode::CONFLICT,
        ChatAudioError::PollTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        ChatAudioError::ConfigurationMissing(_) | ChatAudioError::Config(_) | ChatAudioError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_GATEWAY,
    }
}

// === Handlers ===

async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.session.lock().await;
    Html(render_page(&PageView::from_session(&session)))
}

async fn submit_media(State(state): State<Arc<AppState>>, Form(form): Form<MediaForm>) -> impl IntoResponse {
    let mut session = state.session.lock().await;

    match session.submit_media(&form.url).await {
        Ok(_) => (StatusCode::OK, Html(render_page(&PageView::from_session(&session)))),
        Err(e) => {
            warn!("Media submission failed: {}", e);
            let view = PageView::from_session(&session).with_error(e.to_string());
            (status_for(&e), Html(render_page(&view)))
        }
    }
}

async fn ask(State(state): State<Arc<AppState>>, Form(form): Form<AskForm>) -> impl IntoResponse {
    let session = state.session.lock().await;
    let mut view = PageView::from_session(&session);
    view.question = Some(form.question.trim().to_string());

    match session.ask(&form.question).await {
        Ok(answer) => {
            view.answer = Some(answer);
            (StatusCode::OK, Html(render_page(&view)))
        }
        Err(e) => {
            if !e.is_usage_error() {
                warn!("Question failed: {}", e);
            }
            (status_for(&e), Html(render_page(&view.with_error(e.to_string()))))
        }
    }
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.session.lock().await;
    Json(serde_json::json!({
        "status": "ok",
        "transcript_ready": session.transcript().is_some(),
        "strategy": session.engine().strategy(),
    }))
}
