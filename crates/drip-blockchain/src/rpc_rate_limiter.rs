use std::num::NonZeroU32;

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};

/// Requests-per-second cap shared by every RPC request of one client.
///
/// Without a configured limit all requests pass through immediately.
pub struct RpcRateLimiter {
    limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl RpcRateLimiter {
    pub fn new(requests_per_second: Option<u32>) -> Self {
        let limiter = requests_per_second
            .and_then(NonZeroU32::new)
            .map(|rps| RateLimiter::direct(Quota::per_second(rps)));

        Self { limiter }
    }

    pub fn is_limited(&self) -> bool {
        self.limiter.is_some()
    }

    /// Waits until the next request fits in the quota.
    pub async fn acquire(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}
