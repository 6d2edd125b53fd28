//! v1 `/upload`: body limit, structural validation, the C7 transform
//! chain, rate limiting, and forwarding (§4.5–§4.9).

use axum::extract::State;
use axum::body::Bytes;
use axum::Extension;
use http::HeaderMap;
use ingestgate_pipeline::Admission;
use ingestgate_types::claims::TenantClaims;
use ingestgate_types::wire::{decode_batch, encode_batch};

use crate::error::GatewayHttpError;
use crate::state::AppState;

pub async fn upload(
    State(state): State<AppState>,
    Extension(claims): Extension<TenantClaims>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Vec<u8>, GatewayHttpError> {
    if body.len() > state.options.v1_limit_bytes {
        return Err(GatewayHttpError::TooLarge);
    }

    let mut batch = decode_batch(&body)
        .map_err(|e| GatewayHttpError::ClientMalformed(e.to_string()))?;

    ingestgate_pipeline::validate::require_labels(&batch, state.options.required_label_names())?;

    ingestgate_pipeline::transform::apply(&state.transform, &mut batch)?;

    match state.rate_limiter.check_and_update(&claims.subject) {
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

    let outcome = state
        .forwarder
        .forward(claims.subject.as_str(), &content_type, encode_batch(batch))
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
