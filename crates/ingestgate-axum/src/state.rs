//! Shared state for the external listener's handlers.

use std::collections::HashMap;
use std::sync::Arc;

use ingestgate_authz::ClusterAuthorizer;
use ingestgate_pipeline::{Forwarder, RateLimiter, TransformConfig};
use ingestgate_token::TokenIssuer;
use ingestgate_types::metrics::GatewayMetrics;

/// Options that don't warrant their own field struct but are read by more
/// than one handler.
#[derive(Clone)]
pub struct ExternalOptions {
    pub partition_label: String,
    pub tenant_key: String,
    /// The `required-label` map (name → expected value). C4 (`/authorize`)
    /// checks both name and value literally and merges this map into the
    /// minted token's labels (§4.4); C6 (`/upload`, `/receive`) only checks
    /// that each name is present on every series (§4.6), so those call
    /// sites read `.keys()`.
    pub required_labels: HashMap<String, String>,
    pub v1_limit_bytes: usize,
    pub v2_limit_bytes: usize,
}

impl ExternalOptions {
    /// Label names C6 must assert are present on every series before
    /// forwarding (§4.6, Invariant 1): the metric name, the partition
    /// label that identifies the series' owning cluster, and whatever
    /// names `--required-label` added. The partition label's value is the
    /// per-cluster identity, not a fixed `k=v`, so unlike `required_labels`
    /// only its name is ever checked here.
    pub fn required_label_names(&self) -> impl Iterator<Item = &str> + Clone {
        std::iter::once("__name__")
            .chain(std::iter::once(self.partition_label.as_str()))
            .chain(self.required_labels.keys().map(String::as_str))
    }
}

#[derive(Clone)]
pub struct AppState {
    pub token_issuer: Arc<TokenIssuer>,
    pub authorizer: Arc<dyn ClusterAuthorizer>,
    pub transform: Arc<TransformConfig>,
    pub rate_limiter: Arc<RateLimiter>,
    pub forwarder: Arc<Forwarder>,
    pub metrics: GatewayMetrics,
    pub options: ExternalOptions,
}
