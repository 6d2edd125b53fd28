//! Backing stores for the authorization response cache (C3, §4.3).

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::CacheError;

/// A key/value store with TTL semantics, safe for concurrent get/put.
///
/// Every failure is soft: implementations return `Ok(None)` on a cache
/// miss and an `Err` only for genuine backend failures, which callers are
/// expected to treat as a miss too (§4.3: "failures... are non-fatal").
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;
}

/// In-process fallback used when no memcached servers are configured
/// (REDESIGN FLAGS §3): same TTL and key semantics, no external
/// infrastructure required.
#[derive(Default)]
pub struct InProcessBackend {
    entries: DashMap<String, (Vec<u8>, Instant)>,
}

impl InProcessBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for InProcessBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match self.entries.get(key) {
            Some(entry) if entry.1 > Instant::now() => Ok(Some(entry.0.clone())),
            Some(_) => {
                self.entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        self.entries
            .insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }
}

/// A set of memcached servers, consistent-hash sharded by the `memcache`
/// crate's own client, periodically re-resolved via DNS.
///
/// The sync `memcache::Client` is driven from `spawn_blocking` so the
/// async request path never blocks the executor.
pub struct MemcachedBackend {
    client: Arc<std::sync::RwLock<memcache::Client>>,
}

impl MemcachedBackend {
    /// Connects to `servers` (e.g. `["memcache://host1:11211", ...]`) and,
    /// if `reresolve_interval` is non-zero, spawns a background task that
    /// periodically rebuilds the client so DNS changes are picked up.
    pub fn new(servers: Vec<String>, reresolve_interval: Duration) -> Result<Self, CacheError> {
        let client = memcache::Client::connect(servers.clone())
            .map_err(|e| CacheError::Connection(e.to_string()))?;
        let backend = Self {
            client: Arc::new(std::sync::RwLock::new(client)),
        };

        if !reresolve_interval.is_zero() {
            let client_handle = Arc::clone(&backend.client);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(reresolve_interval);
                loop {
                    ticker.tick().await;
                    match memcache::Client::connect(servers.clone()) {
                        Ok(fresh) => {
                            if let Ok(mut guard) = client_handle.write() {
                                *guard = fresh;
                            }
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, "failed to re-resolve memcached servers, keeping previous connections");
                        }
                    }
                }
            });
        }

        Ok(backend)
    }
}

#[async_trait]
impl CacheBackend for MemcachedBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let client = Arc::clone(&self.client);
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            let guard = client
                .read()
                .map_err(|_| CacheError::Connection("memcached client lock poisoned".into()))?;
            guard
                .get::<Vec<u8>>(&key)
                .map_err(|e| CacheError::Connection(e.to_string()))
        })
        .await
        .map_err(|e| CacheError::Connection(format!("blocking task panicked: {e}")))?
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let client = Arc::clone(&self.client);
        let key = key.to_string();
        let exptime = ttl.as_secs() as u32;
        tokio::task::spawn_blocking(move || {
            let guard = client
                .read()
                .map_err(|_| CacheError::Connection("memcached client lock poisoned".into()))?;
            guard
                .set(&key, value.as_slice(), exptime)
                .map_err(|e| CacheError::Connection(e.to_string()))
        })
        .await
        .map_err(|e| CacheError::Connection(format!("blocking task panicked: {e}")))?
    }
}

/// Selects which backend the decorator should use, built from config.
pub enum Backend {
    Memcached(MemcachedBackend),
    InProcess(InProcessBackend),
}

#[async_trait]
impl CacheBackend for Backend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match self {
            Backend::Memcached(b) => b.get(key).await,
            Backend::InProcess(b) => b.get(key).await,
        }
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        match self {
            Backend::Memcached(b) => b.put(key, value, ttl).await,
            Backend::InProcess(b) => b.put(key, value, ttl).await,
        }
    }
}
