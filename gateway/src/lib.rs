//! HTTP API and console adapter for the OtoService license engine.

pub mod config;
pub mod console;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use oto_dispatch::{Dispatcher, Inbound, Outbound};
use oto_license::{verify_master_code, CredentialKind, UseType};
use oto_registry::RegistryError;
use oto_types::EventId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use config::{ConfigError, GatewayConfig, DEFAULT_LISTEN};
pub use console::{parse_line, run_console, ConsolePresenter};

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    fn now(&self) -> DateTime<Utc> {
        self.dispatcher.generator().clock().now()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Replies produced for one inbound event.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EventsResponse {
    pub event_id: EventId,
    pub replies: Vec<Outbound>,
}

/// Validity of one issued credential. Never includes the owner.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CredentialView {
    pub code: String,
    pub kind: CredentialKind,
    pub valid: bool,
    pub single_use: bool,
    pub consumed: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VerifyRequest {
    pub code: String,
}

/// Offline verification result for a Master code.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VerifyResponse {
    pub valid: bool,
    /// The normalized code, when it parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// `UNLIMITED` or `YYYYMMDD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_type: Option<UseType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

/// An HTTP error with its status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        let status = match &e {
            RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
            RegistryError::AlreadyConsumed(_) | RegistryError::DuplicateCode(_) => StatusCode::CONFLICT,
            RegistryError::NotSingleUse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RegistryError::Storage(_) | RegistryError::Io(_) | RegistryError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn events_handler(
    State(state): State<AppState>,
    Json(inbound): Json<Inbound>,
) -> Result<Json<EventsResponse>, ApiError> {
    let event_id = EventId::new();
    debug!("Event {} from actor {}", event_id, inbound.actor());
    // Registry writes may hit the disk.
    let dispatcher = state.dispatcher.clone();
    let replies = tokio::task::spawn_blocking(move || dispatcher.handle(inbound))
        .await
        .map_err(|e| {
            warn!("Event {} handler panicked: {}", event_id, e);
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "event handling failed")
        })?;
    Ok(Json(EventsResponse { event_id, replies }))
}

async fn credential_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<CredentialView>, ApiError> {
    let credential = state
        .dispatcher
        .registry()
        .get(&code)
        .ok_or_else(|| ApiError::from(RegistryError::NotFound(code.clone())))?;
    Ok(Json(CredentialView {
        valid: credential.is_valid_at(state.now()),
        kind: credential.kind(),
        single_use: credential.is_single_use(),
        consumed: credential.is_consumed(),
        expires_at: credential.expires_at(),
        code,
    }))
}

async fn consume_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<StatusCode, ApiError> {
    let dispatcher = state.dispatcher.clone();
    let target = code.clone();
    tokio::task::spawn_blocking(move || dispatcher.registry().mark_consumed(&target))
        .await
        .map_err(|_| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "consume failed"))??;
    info!("Credential {} consumed via API", code);
    Ok(StatusCode::NO_CONTENT)
}

async fn verify_handler(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Json<VerifyResponse> {
    let secret = state.dispatcher.generator().secret();
    let response = match verify_master_code(&request.code, secret, state.now()) {
        Ok(code) => VerifyResponse {
            valid: true,
            code: Some(code.raw().to_string()),
            date: Some(code.date().to_string()),
            use_type: Some(code.use_type()),
            error: None,
        },
        Err(e) => VerifyResponse {
            valid: false,
            code: None,
            date: None,
            use_type: None,
            error: Some(e.to_string()),
        },
    };
    Json(response)
}

/// Builds the HTTP API router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/events", post(events_handler))
        .route("/api/v1/credentials/{code}", get(credential_handler))
        .route("/api/v1/credentials/{code}/consume", post(consume_handler))
        .route("/api/v1/verify", post(verify_handler))
        .with_state(state)
}
