//! Sliding-window rate limiter for the public AI endpoints
//!
//! Keyed by client identifier (forwarded IP), with a fixed window and a
//! fixed quota per limiter instance. State is an in-process map from
//! identifier to the timestamps of allowed requests; on every check the
//! timestamps that have fallen out of the window are discarded before
//! counting. A periodic sweep removes identifiers with no remaining
//! timestamps to bound memory.
//!
//! State is not persisted and not coordinated across instances: it resets
//! on restart, and horizontal scaling multiplies the effective quota.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Sliding-window rate limiter
pub struct SlidingWindowLimiter {
    /// Maximum allowed requests per window
    max_requests: usize,
    /// Window length
    window: Duration,
    /// Timestamps of allowed requests, per client identifier
    hits: Arc<RwLock<HashMap<String, Vec<DateTime<Utc>>>>>,
}

impl SlidingWindowLimiter {
    /// Create a limiter allowing `max_requests` per `window_ms` milliseconds
    pub fn new(max_requests: usize, window_ms: i64) -> Self {
        Self {
            max_requests,
            window: Duration::milliseconds(window_ms),
            hits: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check whether a request from `key` is allowed right now.
    ///
    /// An allowed request is recorded; a denied one is not.
    pub async fn check(&self, key: &str) -> bool {
        self.check_at(key, Utc::now()).await
    }

    /// Clock-parameterized variant of [`check`](Self::check).
    pub async fn check_at(&self, key: &str, now: DateTime<Utc>) -> bool {
        let cutoff = now - self.window;
        let mut hits = self.hits.write().await;
        let timestamps = hits.entry(key.to_string()).or_default();

        // Discard timestamps older than the window before counting
        timestamps.retain(|t| *t > cutoff);

        if timestamps.len() >= self.max_requests {
            return false;
        }

        timestamps.push(now);
        true
    }

    /// Remove identifiers whose timestamps have all aged out.
    ///
    /// Called periodically from a background task so that one-off clients
    /// don't accumulate in the map forever.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Utc::now()).await
    }

    /// Clock-parameterized variant of [`sweep`](Self::sweep).
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.window;
        let mut hits = self.hits.write().await;
        let before = hits.len();
        hits.retain(|_, timestamps| {
            timestamps.retain(|t| *t > cutoff);
            !timestamps.is_empty()
        });
        before - hits.len()
    }

    /// Number of identifiers currently tracked
    pub async fn tracked_keys(&self) -> usize {
        self.hits.read().await.len()
    }
}

/// Spawn a background task that sweeps the given limiters on an interval.
pub fn spawn_sweep_task(
    limiters: Vec<Arc<SlidingWindowLimiter>>,
    interval: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            for limiter in &limiters {
                let evicted = limiter.sweep().await;
                if evicted > 0 {
                    tracing::debug!(evicted, "Rate limiter sweep evicted idle clients");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-08-07T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn test_quota_within_window() {
        // Quota 10 / window 60000ms: 10 calls at t=0 succeed, the 11th is
        // denied, and a call at t=61000 succeeds again.
        let limiter = SlidingWindowLimiter::new(10, 60_000);
        let t0 = t0();

        for _ in 0..10 {
            assert!(limiter.check_at("1.2.3.4", t0).await);
        }
        assert!(!limiter.check_at("1.2.3.4", t0).await);

        let later = t0 + Duration::milliseconds(61_000);
        assert!(limiter.check_at("1.2.3.4", later).await);
    }

    #[tokio::test]
    async fn test_denied_requests_are_not_recorded() {
        let limiter = SlidingWindowLimiter::new(2, 60_000);
        let t0 = t0();

        assert!(limiter.check_at("k", t0).await);
        assert!(limiter.check_at("k", t0).await);
        // Hammering while denied must not extend the window
        for _ in 0..20 {
            assert!(!limiter.check_at("k", t0).await);
        }

        // Both allowed timestamps age out together
        let later = t0 + Duration::milliseconds(60_001);
        assert!(limiter.check_at("k", later).await);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = SlidingWindowLimiter::new(1, 60_000);
        let t0 = t0();

        assert!(limiter.check_at("a", t0).await);
        assert!(!limiter.check_at("a", t0).await);
        assert!(limiter.check_at("b", t0).await);
    }

    #[tokio::test]
    async fn test_partial_window_expiry() {
        let limiter = SlidingWindowLimiter::new(2, 60_000);
        let t0 = t0();

        assert!(limiter.check_at("k", t0).await);
        assert!(limiter.check_at("k", t0 + Duration::milliseconds(30_000)).await);
        // t=59s: first hit still inside the window
        assert!(!limiter.check_at("k", t0 + Duration::milliseconds(59_000)).await);
        // t=61s: first hit aged out, one slot free
        assert!(limiter.check_at("k", t0 + Duration::milliseconds(61_000)).await);
        // ...and the slot is taken again
        assert!(!limiter.check_at("k", t0 + Duration::milliseconds(61_500)).await);
    }

    #[tokio::test]
    async fn test_sweep_removes_idle_keys() {
        let limiter = SlidingWindowLimiter::new(5, 60_000);
        let t0 = t0();

        limiter.check_at("idle", t0).await;
        limiter.check_at("busy", t0).await;
        assert_eq!(limiter.tracked_keys().await, 2);

        // "busy" fires again later, "idle" does not
        let later = t0 + Duration::milliseconds(90_000);
        limiter.check_at("busy", later).await;

        let evicted = limiter.sweep_at(later).await;
        assert_eq!(evicted, 1);
        assert_eq!(limiter.tracked_keys().await, 1);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Fewer than `quota` requests in the trailing window are always
        /// allowed; once the quota is met, requests are denied until the
        /// oldest timestamp falls outside the window.
        #[test]
        fn quota_boundary(quota in 1usize..20, gap_ms in 0i64..1000) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("runtime");
            rt.block_on(async {
                let limiter = SlidingWindowLimiter::new(quota, 60_000);
                let t0 = DateTime::parse_from_rfc3339("2026-08-07T12:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc);

                for i in 0..quota {
                    let t = t0 + Duration::milliseconds(gap_ms * i as i64);
                    prop_assert!(limiter.check_at("k", t).await, "request {} should pass", i);
                }

                let last = t0 + Duration::milliseconds(gap_ms * quota.saturating_sub(1) as i64);
                prop_assert!(!limiter.check_at("k", last).await, "over-quota request should fail");

                // Once every timestamp has aged out, requests pass again
                let expired = last + Duration::milliseconds(60_001);
                prop_assert!(limiter.check_at("k", expired).await);
                Ok(())
            })?;
        }
    }
}
