//! The gateway's Prometheus counter set (§4.11), registered once at startup
//! and shared (cloned `Arc`-internally via the `prometheus` vector types)
//! across every component that needs to record an outcome.

use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

#[derive(Clone)]
pub struct GatewayMetrics {
    /// `forward_requests_total{result="success"|"error"}` (C9).
    pub forward_requests_total: IntCounterVec,
    /// `rate_limited_total` (C8).
    pub rate_limited_total: IntCounter,
    /// `authorize_requests_total{outcome="accepted"|"rejected"|"transient"}` (C4/C2).
    pub authorize_requests_total: IntCounterVec,
    /// `cache_lookups_total{outcome="hit"|"miss"|"error"}` (C3).
    pub cache_lookups_total: IntCounterVec,
}

impl GatewayMetrics {
    /// Registers every counter against `registry`, returning the handles
    /// components should hold onto for the lifetime of the process.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let forward_requests_total = IntCounterVec::new(
            Opts::new(
                "forward_requests_total",
                "Outcomes of forwarding a batch to the upstream remote-write receiver",
            ),
            &["result"],
        )?;
        let rate_limited_total = IntCounter::new(
            "rate_limited_total",
            "Requests rejected by the per-tenant rate limiter",
        )?;
        let authorize_requests_total = IntCounterVec::new(
            Opts::new(
                "authorize_requests_total",
                "Outcomes of v1 /authorize and v2 cluster-authorization calls",
            ),
            &["outcome"],
        )?;
        let cache_lookups_total = IntCounterVec::new(
            Opts::new(
                "cache_lookups_total",
                "Outcomes of authorization response cache lookups",
            ),
            &["outcome"],
        )?;

        registry.register(Box::new(forward_requests_total.clone()))?;
        registry.register(Box::new(rate_limited_total.clone()))?;
        registry.register(Box::new(authorize_requests_total.clone()))?;
        registry.register(Box::new(cache_lookups_total.clone()))?;

        Ok(Self {
            forward_requests_total,
            rate_limited_total,
            authorize_requests_total,
            cache_lookups_total,
        })
    }
}
