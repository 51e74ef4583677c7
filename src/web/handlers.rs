//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::core::WayfinderError;
use crate::planner::{TravelMode, TripForm};
use crate::web::app::{ChatFrontEnd, ChatMessage};
use crate::web::render::{render_page, PageView};

/// Shared state of the web surface
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Mutex<PageState>>,
    model: Arc<str>,
}

/// Guarded by one lock so only one run is ever in flight
struct PageState {
    front_end: ChatFrontEnd,
    /// Error from the last form post, shown once
    flash: Option<String>,
}

impl AppState {
    pub fn new(front_end: ChatFrontEnd, model: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PageState {
                front_end,
                flash: None,
            })),
            model: Arc::from(model.into()),
        }
    }
}

/// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/plan", post(plan_trip))
        .route("/chat", post(chat))
        .route("/clear", post(clear))
        .route("/api/history", get(history))
        .route("/api/chat", post(api_chat))
        .route("/health", get(health))
        .with_state(state)
}

// ============================================================
// Page
// ============================================================

async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let mut page = state.inner.lock().await;
    let flash = page.flash.take();
    let html = render_page(&PageView {
        history: page.front_end.history(),
        error: flash.as_deref(),
        model: &state.model,
    })?;
    Ok(Html(html))
}

#[derive(Debug, Deserialize)]
pub struct PlanForm {
    pub start: String,
    pub destination: String,
    #[serde(default)]
    pub mode: String,
}

async fn plan_trip(State(state): State<AppState>, Form(form): Form<PlanForm>) -> Redirect {
    let mut page = state.inner.lock().await;
    let result = match form.mode.parse::<TravelMode>() {
        Ok(mode) => {
            let trip = TripForm::new(form.start, form.destination, mode);
            page.front_end.submit_trip(&trip).await
        }
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        tracing::warn!(error = %e, "Trip request failed");
        page.flash = Some(e.user_message());
    }
    Redirect::to("/")
}

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    pub message: String,
}

async fn chat(State(state): State<AppState>, Form(form): Form<ChatForm>) -> Redirect {
    let mut page = state.inner.lock().await;
    if let Err(e) = page.front_end.submit_text(&form.message).await {
        tracing::warn!(error = %e, "Chat request failed");
        page.flash = Some(e.user_message());
    }
    Redirect::to("/")
}

async fn clear(State(state): State<AppState>) -> Redirect {
    let mut page = state.inner.lock().await;
    page.front_end.clear();
    page.flash = None;
    Redirect::to("/")
}

// ============================================================
// JSON API
// ============================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session: String,
    pub messages: Vec<ChatMessage>,
}

async fn history(State(state): State<AppState>) -> Json<HistoryResponse> {
    let page = state.inner.lock().await;
    Json(HistoryResponse {
        session: page.front_end.session_key().to_string(),
        messages: page.front_end.history().to_vec(),
    })
}

/// Either a free-text message or a trip form
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub trip: Option<TripForm>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub replies: Vec<ChatMessage>,
}

async fn api_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let mut page = state.inner.lock().await;
    let replies = match (request.message, request.trip) {
        (Some(message), None) => page.front_end.submit_text(&message).await?,
        (None, Some(trip)) => page.front_end.submit_trip(&trip).await?,
        _ => {
            return Err(AppError::BadRequest(
                "Send exactly one of 'message' or 'trip'".to_string(),
            ))
        }
    };
    Ok(Json(ChatResponse { replies }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<WayfinderError> for AppError {
    fn from(e: WayfinderError) -> Self {
        match e {
            WayfinderError::InvalidInput(msg) => AppError::BadRequest(msg),
            WayfinderError::SessionNotFound(key) => {
                AppError::NotFound(format!("Session not found: {}", key))
            }
            other => {
                tracing::error!(error = %other, "Request failed");
                AppError::Internal(other.user_message())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({ "error": message }));
        (status, body).into_response()
    }
}
