//! Rate limiting utilities

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

/// Per-credential limiter for player actions (move, shoot, bomb)
#[derive(Clone)]
pub struct ActionRateLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<String>>,
}

impl ActionRateLimiter {
    pub fn new(actions_per_second: u32) -> Self {
        let quota =
            Quota::per_second(NonZeroU32::new(actions_per_second).unwrap_or(NonZeroU32::MIN));
        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
        }
    }

    /// Check if an action is allowed for this credential (returns true if allowed)
    pub fn check(&self, credential: &str) -> bool {
        self.limiter.check_key(&credential.to_string()).is_ok()
    }

    /// Drop bookkeeping for credentials that are back at full quota
    pub fn prune(&self) {
        self.limiter.retain_recent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_is_limited_per_credential() {
        let limiter = ActionRateLimiter::new(2);
        assert!(limiter.check("Bearer a"));
        assert!(limiter.check("Bearer a"));
        assert!(!limiter.check("Bearer a"));

        // other credentials have their own budget
        assert!(limiter.check("Bearer b"));
    }
}
