//! The authorization response cache (C3, §4.3): a decorator around C2's
//! outbound transport rather than a separate layer the handler calls, so
//! the hot path stays a single call and timeout handling isn't duplicated.

pub mod backend;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ingestgate_types::cluster::ClusterIdentity;
use ingestgate_types::metrics::GatewayMetrics;
use sha2::{Digest, Sha256};

use crate::authorizer::ClusterAuthorizer;
use crate::cache::backend::CacheBackend;
use crate::error::AuthorizerError;
use crate::outcome::{AuthOutcome, CachedAccept};

/// Derives a stable cache key from the external bearer. Returns `None` to
/// signal "do not cache" for tokens that shouldn't be persisted (empty).
pub fn default_cache_key(external_token: &str) -> Option<String> {
    if external_token.is_empty() {
        return None;
    }
    let mut hasher = Sha256::new();
    hasher.update(external_token.as_bytes());
    Some(hex::encode(hasher.finalize()))
}

/// Wraps a [`ClusterAuthorizer`] with a response cache. Concurrent
/// requests with the same key may race to upstream on a cold cache;
/// exactly-once is not required.
pub struct CachingAuthorizer<A> {
    inner: A,
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
    metrics: GatewayMetrics,
}

impl<A: ClusterAuthorizer> CachingAuthorizer<A> {
    pub fn new(inner: A, backend: Box<dyn CacheBackend>, ttl: Duration, metrics: GatewayMetrics) -> Self {
        Self {
            inner,
            backend: Arc::from(backend),
            ttl,
            metrics,
        }
    }
}

#[async_trait]
impl<A: ClusterAuthorizer> ClusterAuthorizer for CachingAuthorizer<A> {
    async fn authorize(
        &self,
        external_token: &str,
        cluster: &ClusterIdentity,
    ) -> Result<AuthOutcome, AuthorizerError> {
        let Some(key) = default_cache_key(external_token) else {
            return self.inner.authorize(external_token, cluster).await;
        };

        match self.backend.get(&key).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<CachedAccept>(&bytes) {
                Ok(cached) => {
                    self.metrics
                        .cache_lookups_total
                        .with_label_values(&["hit"])
                        .inc();
                    return Ok(AuthOutcome::Accepted(cached.into()));
                }
                Err(err) => {
                    tracing::warn!(error = %err, "corrupt cache entry, falling through to upstream");
                    self.metrics
                        .cache_lookups_total
                        .with_label_values(&["error"])
                        .inc();
                }
            },
            Ok(None) => {
                self.metrics
                    .cache_lookups_total
                    .with_label_values(&["miss"])
                    .inc();
            }
            Err(err) => {
                tracing::warn!(error = %err, "cache lookup failed, falling through to upstream");
                self.metrics
                    .cache_lookups_total
                    .with_label_values(&["error"])
                    .inc();
            }
        }

        let outcome = self.inner.authorize(external_token, cluster).await?;

        if let AuthOutcome::Accepted(claims) = &outcome {
            let cached = CachedAccept::from(claims);
            match serde_json::to_vec(&cached) {
                Ok(bytes) => {
                    // Detached: the write is allowed to finish opportunistically
                    // after the response has already gone out (§5), and a
                    // failure here never fails the request (§4.3).
                    let backend = Arc::clone(&self.backend);
                    let ttl = self.ttl;
                    tokio::spawn(async move {
                        if let Err(err) = backend.put(&key, bytes, ttl).await {
                            tracing::warn!(error = %err, "failed to write authorization cache entry");
                        }
                    });
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to serialize cache entry");
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorizer::StubAuthorizer;
    use crate::cache::backend::InProcessBackend;
    use prometheus::Registry;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingAuthorizer {
        inner: StubAuthorizer,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ClusterAuthorizer for CountingAuthorizer {
        async fn authorize(
            &self,
            external_token: &str,
            cluster: &ClusterIdentity,
        ) -> Result<AuthOutcome, AuthorizerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.authorize(external_token, cluster).await
        }
    }

    #[tokio::test]
    async fn repeated_lookups_with_same_key_hit_the_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = Registry::new();
        let metrics = GatewayMetrics::register(&registry).unwrap();
        let caching = CachingAuthorizer::new(
            CountingAuthorizer {
                inner: StubAuthorizer,
                calls: Arc::clone(&calls),
            },
            Box::new(InProcessBackend::new()),
            Duration::from_secs(60),
            metrics,
        );

        let cluster = ClusterIdentity::from("cluster-a");
        caching.authorize("ext-token", &cluster).await.unwrap();
        // The cache write runs as a detached task after the first call
        // already returned (§5); give it a turn before reading it back.
        tokio::time::sleep(Duration::from_millis(10)).await;
        caching.authorize("ext-token", &cluster).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
