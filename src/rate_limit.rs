//! Global request throttling using a token bucket.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorRateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::warn;

use crate::api::ApiError;

/// Shared limiter; `None` inside means throttling is switched off.
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Option<Arc<GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>>>,
}

impl RateLimiter {
    /// Allows `requests_per_minute` requests, all of which may arrive in one burst.
    /// A quota of zero disables limiting.
    pub fn per_minute(requests_per_minute: u32) -> Self {
        let limiter = NonZeroU32::new(requests_per_minute)
            .map(|quota| Arc::new(GovernorRateLimiter::direct(Quota::per_minute(quota))));
        Self { limiter }
    }

    pub fn disabled() -> Self {
        Self { limiter: None }
    }

    pub fn check(&self) -> bool {
        match &self.limiter {
            Some(limiter) => limiter.check().is_ok(),
            None => true,
        }
    }
}

/// Rejects the request with 429 once the bucket is empty.
pub async fn throttle(State(limiter): State<RateLimiter>, request: Request, next: Next) -> Response {
    if !limiter.check() {
        warn!(path = %request.uri().path(), "rate limit exceeded");
        return ApiError::new(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests").into_response();
    }
    next.run(request).await
}
