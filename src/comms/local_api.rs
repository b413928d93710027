use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

use crate::actuator::config::ServerConfig;
use crate::actuator::{ActuatorController, ActuatorError};
use crate::protocol::{CommandRequest, CommandResponse, COMMAND_PATH, STATE_PATH};

type SharedState = Arc<AppState>;

type CorsHeaders = [(header::HeaderName, &'static str); 3];

fn cors(methods: &'static str) -> CorsHeaders {
    [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (header::ACCESS_CONTROL_ALLOW_METHODS, methods),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
    ]
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub controller: ActuatorController,
}

impl AppState {
    /// State backed by the simulated actuator.
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_controller(ActuatorController::simulated(config))
    }

    /// State backed by any [`Actuator`](crate::actuator::Actuator) driver.
    pub fn with_controller(controller: ActuatorController) -> Self {
        Self { controller }
    }
}

pub fn status_for(err: &ActuatorError) -> StatusCode {
    match err {
        ActuatorError::Busy => StatusCode::CONFLICT,
        ActuatorError::InvalidValue { .. }
        | ActuatorError::OutOfRange { .. }
        | ActuatorError::UnknownPreset(_) => StatusCode::BAD_REQUEST,
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn command_probe() -> impl IntoResponse {
    (
        cors("POST, GET, OPTIONS"),
        Json(json!({"message": "API route is working"})),
    )
}

async fn command_preflight() -> impl IntoResponse {
    (StatusCode::OK, cors("POST, OPTIONS"))
}

async fn command_handler(State(state): State<SharedState>, body: Bytes) -> impl IntoResponse {
    let req = match CommandRequest::from_json(&body) {
        Ok(req) => req,
        Err(e) => {
            let msg = format!("invalid request body: {}", e);
            state.controller.audit().malformed_request(&msg);
            return (
                StatusCode::BAD_REQUEST,
                cors("POST, GET, OPTIONS"),
                Json(CommandResponse::failed(msg)),
            );
        }
    };

    match state.controller.execute(&req).await {
        Ok((command, _motion, sven)) => {
            let data = serde_json::to_value(sven).ok();
            (
                StatusCode::OK,
                cors("POST, GET, OPTIONS"),
                Json(CommandResponse::ok(command.describe(), data)),
            )
        }
        Err(e) => {
            error!(command = %req.command, value = req.value, "command failed: {}", e);
            (
                status_for(&e),
                cors("POST, GET, OPTIONS"),
                Json(CommandResponse::failed(e.to_string())),
            )
        }
    }
}

async fn state_handler(State(state): State<SharedState>) -> impl IntoResponse {
    (cors("POST, GET, OPTIONS"), Json(state.controller.state().await))
}

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            COMMAND_PATH,
            post(command_handler)
                .get(command_probe)
                .options(command_preflight),
        )
        .route(STATE_PATH, get(state_handler))
        .with_state(state)
}

pub async fn serve(config: ServerConfig) -> Result<()> {
    let port = config.port;
    let state = Arc::new(AppState::new(&config));
    let initial = state.controller.state().await;
    info!(
        height_mm = initial.height_mm,
        position = ?initial.position,
        "simulated actuator ready"
    );

    let app = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received, stopping server");
        })
        .await?;
    Ok(())
}
