//! Rate limiting middleware using Governor.
//!
//! Implements per-client rate limiting with a token bucket algorithm. Clients
//! are told apart by the first `X-Forwarded-For` hop, so the service must sit
//! behind a proxy that overwrites that header; a client reaching it directly
//! can pick its own key.
//!
//! Buckets idle for a whole period are full again and get evicted, which keeps
//! the table bounded by the clients seen in the last period.

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::{
    num::NonZeroU32,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use voucher_types::Failure;

const ANONYMOUS: &str = "anonymous";
const EXEMPT_PATHS: [&str; 2] = ["/health", "/metrics"];
/// Checks between sweeps of idle buckets.
const SWEEP_EVERY: u64 = 1024;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

struct ClientBucket {
    limiter: Arc<DirectLimiter>,
    last_seen: Instant,
}

/// Rate limiter state shared across requests.
pub struct RateLimiterState {
    /// Per-client rate limiters
    limiters: DashMap<String, ClientBucket>,
    /// Quota for new clients
    quota: Quota,
    /// Idle time after which a bucket is full again
    idle_after: Duration,
    checks: AtomicU64,
}

impl Default for RateLimiterState {
    fn default() -> Self {
        Self::new(100, Duration::from_secs(60))
    }
}

impl RateLimiterState {
    /// Creates a new rate limiter state.
    ///
    /// # Arguments
    /// * `requests` - Number of requests allowed per period (zero is treated as one)
    /// * `period` - Time period for the quota
    pub fn new(requests: u32, period: Duration) -> Self {
        let burst = NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(period / burst.get())
            .map(|q| q.allow_burst(burst))
            .unwrap_or_else(|| Quota::per_second(burst));

        Self {
            limiters: DashMap::new(),
            quota,
            idle_after: period,
            checks: AtomicU64::new(0),
        }
    }

    /// Checks if a request should be rate limited.
    /// Returns true if the request is allowed, false if rate limited.
    pub fn check(&self, key: &str) -> bool {
        let limiter = {
            let mut bucket = self
                .limiters
                .entry(key.to_string())
                .or_insert_with(|| ClientBucket {
                    limiter: Arc::new(RateLimiter::direct(self.quota)),
                    last_seen: Instant::now(),
                });
            bucket.last_seen = Instant::now();
            bucket.limiter.clone()
        };

        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.evict_idle();
        }

        limiter.check().is_ok()
    }

    /// Drops buckets that have not been used for a whole period.
    pub fn evict_idle(&self) {
        let before = self.limiters.len();
        self.limiters
            .retain(|_, bucket| bucket.last_seen.elapsed() < self.idle_after);
        let evicted = before.saturating_sub(self.limiters.len());
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.limiters.len(), "Evicted idle rate limit buckets");
        }
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.limiters.len()
    }
}

fn client_key(request: &Request<Body>) -> String {
    request
        .headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(ANONYMOUS)
        .to_string()
}

/// Rate limiting middleware.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiterState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if EXEMPT_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let key = client_key(&request);
    if !limiter.check(&key) {
        tracing::warn!(client = %key, "Rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(Failure::new(
                "Rate limit exceeded. Please try again later.",
            )),
        )
            .into_response();
    }

    next.run(request).await
}
