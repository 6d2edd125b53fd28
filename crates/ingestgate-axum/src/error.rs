//! Maps component errors onto the HTTP status taxonomy (§7).

use axum_core::response::{IntoResponse, Response};
use http::StatusCode;
use ingestgate_authz::AuthorizerError;
use ingestgate_pipeline::{ForwardError, TransformError};
use ingestgate_token::TokenError;

/// A request-ending outcome already classified into one of §7's
/// categories. Handlers build this directly rather than routing through a
/// single crate-wide error type, mirroring the per-component `thiserror`
/// enums named in §4.12.
pub enum GatewayHttpError {
    AuthReject(String),
    ClientMalformed(String),
    TooLarge,
    RateLimited { retry_after_secs: u64 },
    UpstreamTransient(String),
    UpstreamPermanent { status: StatusCode, body: String },
    Internal(String),
}

impl IntoResponse for GatewayHttpError {
    fn into_response(self) -> Response {
        match self {
            GatewayHttpError::AuthReject(reason) => {
                (StatusCode::UNAUTHORIZED, reason).into_response()
            }
            GatewayHttpError::ClientMalformed(reason) => {
                (StatusCode::BAD_REQUEST, reason).into_response()
            }
            GatewayHttpError::TooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response()
            }
            GatewayHttpError::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                [("Retry-After", retry_after_secs.to_string())],
                "rate limit exceeded",
            )
                .into_response(),
            GatewayHttpError::UpstreamTransient(reason) => {
                tracing::warn!(error = %reason, "upstream call failed transiently");
                (StatusCode::BAD_GATEWAY, "upstream authorization unavailable").into_response()
            }
            GatewayHttpError::UpstreamPermanent { status, body } => {
                (status, body).into_response()
            }
            GatewayHttpError::Internal(reason) => {
                tracing::error!(error = %reason, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}

impl From<TokenError> for GatewayHttpError {
    fn from(err: TokenError) -> Self {
        GatewayHttpError::AuthReject(err.to_string())
    }
}

impl From<AuthorizerError> for GatewayHttpError {
    fn from(err: AuthorizerError) -> Self {
        GatewayHttpError::UpstreamTransient(err.to_string())
    }
}

impl From<TransformError> for GatewayHttpError {
    fn from(err: TransformError) -> Self {
        GatewayHttpError::ClientMalformed(err.to_string())
    }
}

impl From<ForwardError> for GatewayHttpError {
    fn from(err: ForwardError) -> Self {
        GatewayHttpError::UpstreamTransient(err.to_string())
    }
}
