use std::{num::NonZeroU32, sync::Arc};

use dashmap::DashMap;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};

type UrlLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Request budget per RPC endpoint URL.
///
/// Public endpoints throttle per host, so each URL gets its own bucket and a
/// busy endpoint never slows calls routed elsewhere. No quota means every
/// call passes immediately.
pub(crate) struct RpcRateLimiter {
    limiters: DashMap<String, Arc<UrlLimiter>>,
    quota: Option<Quota>,
}

impl RpcRateLimiter {
    pub(crate) fn new(requests_per_second: Option<u32>) -> Self {
        Self {
            limiters: DashMap::new(),
            quota: requests_per_second
                .and_then(NonZeroU32::new)
                .map(Quota::per_second),
        }
    }

    fn limiter_for(&self, url: &str) -> Option<Arc<UrlLimiter>> {
        let quota = self.quota?;
        if let Some(limiter) = self.limiters.get(url) {
            return Some(Arc::clone(&limiter));
        }
        let limiter = self
            .limiters
            .entry(url.to_string())
            .or_insert_with(|| Arc::new(RateLimiter::direct(quota)));
        Some(Arc::clone(&limiter))
    }

    pub(crate) async fn acquire(&self, url: &str) {
        if let Some(limiter) = self.limiter_for(url) {
            limiter.until_ready().await;
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_quota_is_tracked_per_url() {
        let limiter = RpcRateLimiter::new(Some(1));

        let a = limiter.limiter_for("https://a.example").unwrap();
        assert!(a.check().is_ok());
        assert!(limiter.limiter_for("https://a.example").unwrap().check().is_err());
        assert!(limiter.limiter_for("https://b.example").unwrap().check().is_ok());
    }

    #[tokio::test]
    async fn test_missing_or_zero_quota_passes_through() {
        assert!(RpcRateLimiter::new(None).limiter_for("https://a.example").is_none());
        assert!(RpcRateLimiter::new(Some(0)).limiter_for("https://a.example").is_none());
        RpcRateLimiter::new(None).acquire("https://a.example").await;
    }
}
