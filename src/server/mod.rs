mod relay;

pub use relay::relay;

use crate::core::{Config, FragmentPayload, RelayError};
use crate::providers::UpstreamClient;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use log::{error, info};
use serde::Serialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared, immutable per-process state. Requests never write to it.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<dyn UpstreamClient>,
    pub fallback: Arc<str>,
}

impl AppState {
    pub fn new(upstream: Arc<dyn UpstreamClient>, fallback: impl Into<Arc<str>>) -> Self {
        Self {
            upstream,
            fallback: fallback.into(),
        }
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidInput(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            other => {
                error!("Error in chat API: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

/// Pulls a non-empty string `message` out of a raw JSON request body.
fn extract_prompt(body: &[u8]) -> Result<String, RelayError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|_| RelayError::InvalidInput("Invalid request body".to_string()))?;

    match value.get("message") {
        Some(Value::String(message)) if !message.is_empty() => Ok(message.clone()),
        _ => Err(RelayError::InvalidInput("Invalid message".to_string())),
    }
}

// POST /api/chat
pub async fn chat_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, RelayError> {
    let prompt = extract_prompt(&body)?;
    info!("Relaying prompt ({} bytes)", prompt.len());

    let events = relay(state.upstream.clone(), prompt, state.fallback.clone()).filter_map(
        |text| async move {
            match Event::default().json_data(FragmentPayload::new(text)) {
                Ok(event) => Some(Ok::<_, Infallible>(event)),
                Err(e) => {
                    error!("Failed to encode relay event: {e}");
                    None
                }
            }
        },
    );

    Ok((
        [(header::CONNECTION, "keep-alive")],
        Sse::new(events),
    )
        .into_response())
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat_handler))
        .layer(cors)
        .with_state(state)
}

/// Binds the configured address and serves until the process is stopped.
pub async fn serve(config: &Config, upstream: Arc<dyn UpstreamClient>) -> Result<(), RelayError> {
    let state = AppState::new(upstream, config.upstream.fallback_message.as_str());
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
