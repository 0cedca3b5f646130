//! Per-client request throttling: an in-memory sliding-window counter
//! keyed by client IP. State is process-local; a multi-instance deployment
//! rate-limits per instance.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use once_cell::sync::Lazy;

use crate::config;
use crate::error::ApiError;

// Entries for idle clients are swept once the map grows past this.
const SWEEP_THRESHOLD: usize = 10_000;

pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Record a hit for `key` at `now`. Returns Err(retry_after_secs) when
    /// the trailing window already holds the maximum number of requests.
    pub fn check_at(&self, key: &str, now: Instant) -> Result<(), u64> {
        let mut hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());

        if hits.len() > SWEEP_THRESHOLD {
            let window = self.window;
            hits.retain(|_, q| q.back().is_some_and(|t| now.duration_since(*t) < window));
        }

        let queue = hits.entry(key.to_string()).or_default();
        while let Some(front) = queue.front() {
            if now.duration_since(*front) >= self.window {
                queue.pop_front();
            } else {
                break;
            }
        }

        if queue.len() >= self.max_requests as usize {
            let retry_after = queue
                .front()
                .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or(self.window);
            return Err(retry_after.as_secs().max(1));
        }

        queue.push_back(now);
        Ok(())
    }

    pub fn check(&self, key: &str) -> Result<(), u64> {
        self.check_at(key, Instant::now())
    }
}

static LIMITER: Lazy<RateLimiter> = Lazy::new(|| {
    let api = &config::config().api;
    RateLimiter::new(
        api.rate_limit_requests,
        Duration::from_secs(api.rate_limit_window_secs),
    )
});

/// Global throttling middleware. A no-op unless enabled in config.
pub async fn rate_limit_middleware(request: Request, next: Next) -> Response {
    if !config::config().api.enable_rate_limiting {
        return next.run(request).await;
    }

    let key = client_key(&request);
    match LIMITER.check(&key) {
        Ok(()) => next.run(request).await,
        Err(retry_after_secs) => {
            tracing::warn!(client = %key, retry_after_secs, "rate limit exceeded");
            ApiError::too_many_requests("Rate limit exceeded", Some(retry_after_secs))
                .into_response()
        }
    }
}

/// Client identity for throttling: first X-Forwarded-For hop when present
/// (the service normally sits behind a proxy), else the socket address.
fn client_key(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
