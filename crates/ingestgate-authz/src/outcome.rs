use std::collections::HashMap;

use http::StatusCode;
use ingestgate_types::claims::TenantClaims;
use ingestgate_types::cluster::ClusterIdentity;
use serde::{Deserialize, Serialize};

/// The upstream's verdict for one (external-token, cluster) pair (§3).
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    /// Upstream accepted the cluster; carries the resolved subject and any
    /// labels to attach to everything it pushes.
    Accepted(TenantClaims),
    /// Upstream rejected the cluster (a 4xx, echoed verbatim).
    Rejected {
        status: StatusCode,
        body: String,
    },
}

/// The wire shape stored in the cache (C3) — only [`AuthOutcome::Accepted`]
/// is ever cached (§4.3: cache is populated "only if the response is
/// successful (2xx)").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedAccept {
    pub subject: String,
    pub labels: HashMap<String, String>,
}

impl From<&TenantClaims> for CachedAccept {
    fn from(claims: &TenantClaims) -> Self {
        Self {
            subject: claims.subject.as_str().to_string(),
            labels: claims.labels.clone(),
        }
    }
}

impl From<CachedAccept> for TenantClaims {
    fn from(cached: CachedAccept) -> Self {
        TenantClaims::new(ClusterIdentity::from(cached.subject), cached.labels)
    }
}
