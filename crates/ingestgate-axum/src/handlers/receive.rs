//! v2 `/metrics/v1/receive`: every request is authenticated directly
//! against C2/C3 (no pre-minted token), then runs the same structural
//! validation, rate limiting and forwarding as v1 — minus the C7
//! transform chain, which §4.7 scopes to v1 only.

use axum::body::Bytes;
use axum::extract::State;
use http::HeaderMap;
use ingestgate_authz::AuthOutcome;
use ingestgate_pipeline::Admission;
use ingestgate_types::wire::decode_batch;

use crate::error::GatewayHttpError;
use crate::state::AppState;
use crate::v2_bearer::extract_cluster;

pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Vec<u8>, GatewayHttpError> {
    if body.len() > state.options.v2_limit_bytes {
        return Err(GatewayHttpError::TooLarge);
    }

    let bearer = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| GatewayHttpError::AuthReject("missing Authorization bearer".into()))?;

    let cluster = extract_cluster(bearer, &state.options.tenant_key)
        .ok_or_else(|| GatewayHttpError::AuthReject("malformed v2 bearer payload".into()))?;

    match state.authorizer.authorize(bearer, &cluster).await? {
        AuthOutcome::Accepted(_) => {}
        AuthOutcome::Rejected { status, body } => {
            return Err(GatewayHttpError::UpstreamPermanent { status, body });
        }
    }

    let batch = decode_batch(&body)
        .map_err(|e| GatewayHttpError::ClientMalformed(e.to_string()))?;
    ingestgate_pipeline::validate::require_labels(&batch, state.options.required_label_names())?;
    drop(batch);

    match state.rate_limiter.check_and_update(&cluster) {
        Admission::Admitted => {}
        Admission::Limited { retry_after_secs } => {
            state.metrics.rate_limited_total.inc();
            return Err(GatewayHttpError::RateLimited { retry_after_secs });
        }
    }

    let content_type = headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/x-protobuf")
        .to_string();

    // §4.6: the body is re-presented to the forwarder in its original
    // compressed form — v2 runs no label transform, so there is nothing
    // to re-encode.
    let outcome = state
        .forwarder
        .forward(cluster.as_str(), &content_type, body.to_vec())
        .await?;

    if outcome.status.is_success() {
        Ok(outcome.body)
    } else {
        Err(GatewayHttpError::UpstreamPermanent {
            status: outcome.status,
            body: String::from_utf8_lossy(&outcome.body).into_owned(),
        })
    }
}
