//! Per-client rate limiting.
//!
//! The limiting algorithm comes from the governor crate; this module only
//! wires a keyed limiter (per client IP) into the router with the quota from
//! config.

use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter,
};

use crate::errors::AppError;

pub type IpRateLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

pub fn build_rate_limiter(per_minute: u32) -> Arc<IpRateLimiter> {
    let quota = Quota::per_minute(NonZeroU32::new(per_minute.max(1)).expect("clamped above zero"));
    Arc::new(RateLimiter::keyed(quota))
}

/// Applied via `axum::middleware::from_fn_with_state` ahead of the API routes.
pub async fn rate_limit(
    State(limiter): State<Arc<IpRateLimiter>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if limiter.check_key(&addr.ip()).is_err() {
        return Err(AppError::RateLimited);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_beyond_quota_is_rejected() {
        let limiter = build_rate_limiter(2);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        assert!(limiter.check_key(&ip).is_ok());
        assert!(limiter.check_key(&ip).is_ok());
        assert!(limiter.check_key(&ip).is_err());
    }

    #[test]
    fn test_clients_are_limited_independently() {
        let limiter = build_rate_limiter(1);
        let first: IpAddr = "10.0.0.1".parse().unwrap();
        let second: IpAddr = "10.0.0.2".parse().unwrap();
        assert!(limiter.check_key(&first).is_ok());
        assert!(limiter.check_key(&first).is_err());
        assert!(limiter.check_key(&second).is_ok());
    }

    #[test]
    fn test_zero_quota_is_clamped_to_one() {
        let limiter = build_rate_limiter(0);
        let ip: IpAddr = "10.0.0.3".parse().unwrap();
        assert!(limiter.check_key(&ip).is_ok());
    }
}
