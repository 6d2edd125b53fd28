//! Shared data model and wire formats for the metrics ingestion gateway.
//!
//! This crate has no knowledge of HTTP, authorization, or rate limiting — it
//! only defines the shapes that flow between the gateway's components: the
//! in-memory time-series model (§3), the Prometheus remote-write wire format,
//! and small value types (cluster identity, Unix timestamps, label maps)
//! reused across the token, authz, pipeline and axum crates.

pub mod claims;
pub mod cluster;
pub mod kv;
pub mod metrics;
pub mod model;
pub mod timestamp;
pub mod wire;

mod proto {
    include!(concat!(env!("OUT_DIR"), "/ingestgate.remote_write.rs"));
}

pub use proto::{Label as ProtoLabel, Sample as ProtoSample, TimeSeries as ProtoTimeSeries, WriteRequest};
