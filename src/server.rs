//! HTTP API.
//!
//! Routes:
//! - `GET /` service banner
//! - `GET /health` liveness check
//! - `POST /api/verify` body `{"claim": "..."}`, returns the verdict
//!
//! Claims are validated before the pipeline runs (422 on failure). The
//! pipeline itself never fails, so a 500 only comes from a verification task
//! that died.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::config::{ResolvedConfig, APP_NAME};
use crate::core::{ClaimViolation, Verifier};
use crate::domain::Verdict;

const GENERIC_FAILURE: &str = "An error occurred during verification. Please try again.";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<Verifier>,
    /// Include error details in 500 responses
    pub debug: bool,
}

impl AppState {
    pub fn new(verifier: Verifier, debug: bool) -> Self {
        Self {
            verifier: Arc::new(verifier),
            debug,
        }
    }
}

/// Request body for `POST /api/verify`
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    pub claim: String,
}

/// Error response body
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub detail: String,
}

/// Error returned by the API handlers
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn invalid_claim(violation: ClaimViolation) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: ErrorBody {
                error: "invalid_claim".to_string(),
                detail: violation.to_string(),
            },
        }
    }

    /// 500 with the detail only when `debug` is set
    pub fn internal(detail: impl Into<String>, debug: bool) -> Self {
        let detail = if debug {
            detail.into()
        } else {
            GENERIC_FAILURE.to_string()
        };
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody {
                error: "verification_failed".to_string(),
                detail,
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &ErrorBody {
        &self.body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Build the router with permissive CORS
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/verify", post(verify))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": APP_NAME,
        "message": "Welcome to the Fake News Verification API",
    }))
}

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Verify a claim
pub async fn verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<Verdict>, ApiError> {
    let claim = request.claim.trim().to_string();
    state
        .verifier
        .limits()
        .validate_claim(&claim)
        .map_err(ApiError::invalid_claim)?;

    let verifier = Arc::clone(&state.verifier);
    let task = tokio::spawn(async move { verifier.verify(&claim).await });

    match task.await {
        Ok(verdict) => Ok(Json(verdict)),
        Err(e) => {
            error!(error = %e, "Verification task failed");
            Err(ApiError::internal(e.to_string(), state.debug))
        }
    }
}

/// Run the server until Ctrl-C
pub async fn serve(config: &ResolvedConfig, address: &str) -> Result<()> {
    let state = AppState::new(Verifier::from_config(config), config.debug);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!(address, debug = config.debug, "{} is starting", APP_NAME);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("{} is shutting down", APP_NAME);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}
