//! Per-domain request pacing.
//!
//! Restaurant sites are small and easily knocked over; the pipeline
//! spaces requests to any single domain by a configurable minimum
//! interval while leaving unrelated domains free to proceed in
//! parallel. Uses the governor crate keyed by host.

use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use std::time::Duration;
use url::Url;

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Rate limiter keyed by the URL's host.
///
/// A zero interval disables pacing entirely (used by tests).
pub struct DomainLimiter {
    limiter: Option<KeyedLimiter>,
}

impl DomainLimiter {
    /// Limit each domain to one request per `interval`.
    pub fn new(interval: Duration) -> Self {
        let limiter = Quota::with_period(interval).map(RateLimiter::keyed);
        Self { limiter }
    }

    /// Unpaced limiter.
    pub fn unlimited() -> Self {
        Self { limiter: None }
    }

    /// Wait until a request to `url`'s domain is permitted.
    pub async fn acquire(&self, url: &str) {
        if let Some(limiter) = &self.limiter {
            limiter.until_key_ready(&domain_of(url)).await;
        }
    }
}

/// Host component of a URL, lowercased; `"unknown"` when unparsable.
pub(crate) fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .unwrap_or_else(|| "unknown".to_string())
}
