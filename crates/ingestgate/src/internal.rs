//! Internal listener: `/healthz`, `/healthz/ready`, `/metrics` (§2, §6).
//!
//! A thin named interface per §1's Non-goals — this spec only requires
//! that the counters and readiness flag it reads are maintained
//! correctly by the core, not that these handlers do anything elaborate.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, Registry, TextEncoder};

#[derive(Clone)]
pub struct InternalState {
    registry: Registry,
    ready: Arc<AtomicBool>,
}

impl InternalState {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            ready: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn healthz_ready(State(state): State<InternalState>) -> StatusCode {
    if state.ready.load(Ordering::SeqCst) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn metrics(State(state): State<InternalState>) -> (StatusCode, Vec<u8>) {
    let metric_families = state.registry.gather();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (StatusCode::OK, buffer),
        Err(err) => {
            tracing::error!(error = %err, "failed to encode prometheus metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, Vec::new())
        }
    }
}

pub fn router(state: InternalState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/healthz/ready", get(healthz_ready))
        .route("/metrics", get(metrics))
        .with_state(state)
}
