//! Resolved tenant identity, shared between C1 (token issuer/verifier),
//! C2/C3 (upstream authorization) and the axum middleware that stashes it
//! on the request context (§4.1, §4.2, §4.5).

use std::collections::HashMap;

use crate::cluster::ClusterIdentity;

/// The outcome of a successful authentication: who the caller is and the
/// extra labels that should be attached to everything they push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantClaims {
    pub subject: ClusterIdentity,
    pub labels: HashMap<String, String>,
}

impl TenantClaims {
    pub fn new(subject: ClusterIdentity, labels: HashMap<String, String>) -> Self {
        Self { subject, labels }
    }
}
