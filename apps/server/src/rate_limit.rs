//! In-memory per-IP rate limiting with sliding windows.
//!
//! Three fixed tiers: public reads, booking creation (strictest) and the
//! admin surface. Keys are client IPs; values are request timestamps.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::models::ApiResponse;

/// Request tier, each with its own budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Read-only endpoints: services, slots.
    Public,
    /// Booking creation.
    Booking,
    /// Admin endpoints (authenticated separately).
    Admin,
}

impl Tier {
    /// (max requests, window).
    fn budget(self) -> (usize, Duration) {
        match self {
            Tier::Public => (60, Duration::from_secs(60)),
            Tier::Booking => (5, Duration::from_secs(300)),
            Tier::Admin => (120, Duration::from_secs(60)),
        }
    }
}

/// Sliding-window counter shared across handlers. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct RateLimiter {
    hits: Arc<DashMap<(Tier, IpAddr), Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Ok(())` if the request fits the tier budget, `Err(retry_after_secs)`
    /// otherwise.
    pub fn check(&self, tier: Tier, ip: IpAddr) -> Result<(), u64> {
        let (max_requests, window) = tier.budget();
        let now = Instant::now();

        let mut timestamps = self.hits.entry((tier, ip)).or_default();
        timestamps.retain(|t| now.duration_since(*t) < window);

        if timestamps.len() >= max_requests {
            let oldest = timestamps[0];
            let retry_after = (oldest + window)
                .saturating_duration_since(now)
                .as_secs()
                .max(1);
            return Err(retry_after);
        }

        timestamps.push(now);
        Ok(())
    }

    /// Drop IPs with no request in twice their tier window. Run this from
    /// a periodic background task.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.hits.retain(|(tier, _), timestamps| {
            let (_, window) = tier.budget();
            timestamps.retain(|t| now.duration_since(*t) < window * 2);
            !timestamps.is_empty()
        });
    }
}

/// Client IP from X-Forwarded-For (reverse proxy) or the socket address.
fn extract_client_ip(req: &Request) -> IpAddr {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            if let Ok(ip) = first.trim().parse() {
                return ip;
            }
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip())
        .unwrap_or(IpAddr::V4(std::net::Ipv4Addr::LOCALHOST))
}

fn too_many_requests(retry_after: u64) -> Response {
    let body = ApiResponse::<()>::error(format!(
        "Too many requests. Try again in {} seconds",
        retry_after
    ));
    (
        StatusCode::TOO_MANY_REQUESTS,
        [("Retry-After", retry_after.to_string())],
        Json(body),
    )
        .into_response()
}

async fn enforce(
    limiter: RateLimiter,
    tier: Tier,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    let ip = extract_client_ip(&req);
    limiter.check(tier, ip).map_err(too_many_requests)?;
    Ok(next.run(req).await)
}

// ── Middleware (one per tier, for from_fn_with_state) ──

pub async fn rate_limit_public(
    State(limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    enforce(limiter, Tier::Public, req, next).await
}

pub async fn rate_limit_booking(
    State(limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    enforce(limiter, Tier::Booking, req, next).await
}

pub async fn rate_limit_admin(
    State(limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    enforce(limiter, Tier::Admin, req, next).await
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn test_ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_booking_tier_budget() {
        let limiter = RateLimiter::new();
        let ip = test_ip(1);
        for _ in 0..5 {
            assert!(limiter.check(Tier::Booking, ip).is_ok());
        }
        let retry_after = limiter.check(Tier::Booking, ip).unwrap_err();
        assert!((1..=300).contains(&retry_after));
    }

    #[test]
    fn test_ips_are_independent() {
        let limiter = RateLimiter::new();
        for _ in 0..5 {
            limiter.check(Tier::Booking, test_ip(1)).unwrap();
        }
        assert!(limiter.check(Tier::Booking, test_ip(1)).is_err());
        assert!(limiter.check(Tier::Booking, test_ip(2)).is_ok());
    }

    #[test]
    fn test_tiers_are_independent() {
        let limiter = RateLimiter::new();
        let ip = test_ip(1);
        for _ in 0..5 {
            limiter.check(Tier::Booking, ip).unwrap();
        }
        assert!(limiter.check(Tier::Booking, ip).is_err());
        assert!(limiter.check(Tier::Public, ip).is_ok());
        assert!(limiter.check(Tier::Admin, ip).is_ok());
    }

    #[test]
    fn test_cleanup_keeps_recent_hits() {
        let limiter = RateLimiter::new();
        let ip = test_ip(1);
        for _ in 0..5 {
            limiter.check(Tier::Booking, ip).unwrap();
        }
        limiter.cleanup();
        // Recent hits survive cleanup, so the budget is still spent.
        assert!(limiter.check(Tier::Booking, ip).is_err());
    }
}
