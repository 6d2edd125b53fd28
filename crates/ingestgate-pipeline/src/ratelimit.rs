//! Per-tenant rate limiter (C8, §4.8): a `dashmap::DashMap` keyed by
//! cluster identity gives per-key atomicity without a single global lock,
//! satisfying §5's "no request handler may hold a lock across an outbound
//! network call" by never doing network I/O while the shard is held.

use std::time::Duration;

use dashmap::DashMap;
use ingestgate_types::cluster::ClusterIdentity;
use ingestgate_types::timestamp::UnixTimestamp;

/// The outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// Rejected; carries the number of seconds until the caller may retry.
    Limited { retry_after_secs: u64 },
}

/// Tracks the last-admitted timestamp per cluster identity.
pub struct RateLimiter {
    interval: Duration,
    last_admitted: DashMap<ClusterIdentity, UnixTimestamp>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_admitted: DashMap::new(),
        }
    }

    /// Atomically checks and, if admitted, updates the last-accepted
    /// timestamp for `key`. Two concurrent callers for the same key can
    /// never both be admitted within `interval` of each other.
    pub fn check_and_update(&self, key: &ClusterIdentity) -> Admission {
        let now = UnixTimestamp::now();
        match self.last_admitted.entry(key.clone()) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                let last = *occupied.get();
                match now.elapsed_since(last) {
                    Some(elapsed) if elapsed >= self.interval => {
                        occupied.insert(now);
                        Admission::Admitted
                    }
                    Some(elapsed) => Admission::Limited {
                        retry_after_secs: self.interval.as_secs().saturating_sub(elapsed.as_secs()),
                    },
                    // Clock went backwards relative to the stored entry;
                    // treat conservatively as still within the window.
                    None => Admission::Limited {
                        retry_after_secs: self.interval.as_secs(),
                    },
                }
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(now);
                Admission::Admitted
            }
        }
    }

    /// Drops entries older than `interval`. Correctness does not depend
    /// on this running; it only bounds memory use.
    pub fn gc(&self) {
        let now = UnixTimestamp::now();
        self.last_admitted.retain(|_, last| {
            now.elapsed_since(*last)
                .map(|elapsed| elapsed < self.interval)
                .unwrap_or(true)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_request_is_always_admitted() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        let key = ClusterIdentity::from("cluster-a");
        assert_eq!(limiter.check_and_update(&key), Admission::Admitted);
    }

    #[test]
    fn second_request_within_window_is_rejected() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        let key = ClusterIdentity::from("cluster-a");
        assert_eq!(limiter.check_and_update(&key), Admission::Admitted);
        assert!(matches!(
            limiter.check_and_update(&key),
            Admission::Limited { .. }
        ));
    }

    #[test]
    fn different_clusters_do_not_share_state() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        assert_eq!(
            limiter.check_and_update(&ClusterIdentity::from("a")),
            Admission::Admitted
        );
        assert_eq!(
            limiter.check_and_update(&ClusterIdentity::from("b")),
            Admission::Admitted
        );
    }

    #[test]
    fn request_after_window_elapses_is_admitted_again() {
        let limiter = RateLimiter::new(Duration::from_millis(50));
        let key = ClusterIdentity::from("cluster-a");
        assert_eq!(limiter.check_and_update(&key), Admission::Admitted);
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(limiter.check_and_update(&key), Admission::Admitted);
    }
}
