//! HTTP interface to the [`Engine`].
//!
//! | Method | Path            | Description                               |
//! |--------|-----------------|-------------------------------------------|
//! | POST   | `/transactions` | Record a transaction (201, 400, 422)      |
//! | DELETE | `/transactions` | Forget every transaction                  |
//! | GET    | `/statistics`   | Aggregates over the last 60 seconds       |
//! | GET    | `/health`       | Liveness check                            |
//!
//! Body validation happens here. Only a well-formed, non-negative
//! `(amount, timestamp)` pair is handed to the engine.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::dto::{
    CreateTransaction, ErrorResponse, HealthResponse, MessageResponse, StatisticsRow,
    DELETED_MESSAGE,
};
use crate::rate_limit::{self, RateLimiter};
use crate::{Engine, Error};

/// Shared state for every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

pub fn create_router(engine: Arc<Engine>, limiter: RateLimiter) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route(
            "/transactions",
            post(create_transaction).delete(delete_transactions),
        )
        .route("/statistics", get(statistics))
        .route("/health", get(health))
        .layer(middleware::from_fn_with_state(limiter, rate_limit::throttle))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { engine })
}

/// A failed request, rendered as an [`ErrorResponse`] body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            status_code: self.status.as_u16(),
            message: self.message,
            error: self
                .status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::FutureTimestamp { .. } => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Transaction cannot be in the future",
            ),
            Error::InvalidAmount(_) => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
        }
    }
}

/// Any body that fails to parse or validate is a client error, whatever axum's
/// default status for it would be.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

async fn create_transaction(
    State(state): State<AppState>,
    payload: Result<Json<CreateTransaction>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(body) = payload?;
    debug!(amount = %body.amount, timestamp = %body.timestamp, "creating transaction");
    state.engine.create_transaction(body.amount, body.timestamp)?;
    Ok(StatusCode::CREATED)
}

async fn delete_transactions(State(state): State<AppState>) -> Json<MessageResponse> {
    state.engine.delete_all_transactions();
    Json(MessageResponse {
        message: DELETED_MESSAGE.to_string(),
    })
}

async fn statistics(State(state): State<AppState>) -> Json<StatisticsRow> {
    Json(state.engine.get_statistics().into())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: Utc::now(),
    })
}
