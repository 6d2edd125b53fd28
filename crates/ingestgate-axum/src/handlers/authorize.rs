//! Token-exchange handler — v1 `/authorize` (C4, §4.4).

use std::collections::HashMap;

use axum::extract::{Query, State};
use http::HeaderMap;
use ingestgate_authz::AuthOutcome;
use ingestgate_types::cluster::ClusterIdentity;

use crate::error::GatewayHttpError;
use crate::state::AppState;

#[derive(serde::Deserialize)]
pub struct AuthorizeQuery {
    id: String,
}

pub async fn authorize(
    State(state): State<AppState>,
    Query(query): Query<AuthorizeQuery>,
    headers: HeaderMap,
) -> Result<String, GatewayHttpError> {
    let bearer = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| GatewayHttpError::AuthReject("missing Authorization bearer".into()))?;

    let cluster = ClusterIdentity::from(query.id);

    let outcome = match state.authorizer.authorize(bearer, &cluster).await {
        Ok(outcome) => outcome,
        Err(err) => {
            state
                .metrics
                .authorize_requests_total
                .with_label_values(&["transient"])
                .inc();
            return Err(err.into());
        }
    };

    let upstream_labels = match outcome {
        AuthOutcome::Accepted(claims) => {
            state
                .metrics
                .authorize_requests_total
                .with_label_values(&["accepted"])
                .inc();
            claims.labels
        }
        AuthOutcome::Rejected { status, body } => {
            state
                .metrics
                .authorize_requests_total
                .with_label_values(&["rejected"])
                .inc();
            return Err(GatewayHttpError::UpstreamPermanent { status, body });
        }
    };

    // §4.4: every configured required label must appear literally in what
    // C2 returned; the minted token's labels are required ∪ upstream.
    for (name, expected) in &state.options.required_labels {
        match upstream_labels.get(name) {
            Some(actual) if actual == expected => {}
            _ => {
                return Err(GatewayHttpError::ClientMalformed(format!(
                    "missing or mismatched required label {name:?}"
                )));
            }
        }
    }

    let mut labels: HashMap<String, String> = upstream_labels;
    labels.extend(state.options.required_labels.iter().map(|(k, v)| (k.clone(), v.clone())));

    // Mint only fails on signature failure (§4.1) — that is an internal
    // error, not a rejection of the caller's credentials (§7).
    let token = state
        .token_issuer
        .mint(&cluster, labels)
        .map_err(|err| GatewayHttpError::Internal(err.to_string()))?;
    Ok(token)
}
