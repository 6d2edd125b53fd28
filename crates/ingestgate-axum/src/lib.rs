//! The external listener: route table, middleware stack and shared state
//! for the v1/v2 push flows and the token-exchange endpoint.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;
pub mod v2_bearer;

use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

pub use middleware::{BearerAuthLayer, TenantClaims};
pub use state::{AppState, ExternalOptions};

/// Builds the external listener's router (§6).
///
/// `/upload` is wrapped, outermost first, by [`BearerAuthLayer`] (C5) and
/// then a body-size limit (C6) — auth runs before the size check per
/// §5's "auth → limit → parse → transform → rate-check → forward"
/// ordering. `/metrics/v1/receive` authenticates inside its own handler
/// (the v2 bearer also carries the cluster identity, so there is no
/// separate auth layer to compose).
pub fn router(state: AppState) -> Router {
    let upload_route = Router::new()
        .route("/upload", post(handlers::upload::upload))
        .layer(RequestBodyLimitLayer::new(state.options.v1_limit_bytes))
        .layer(BearerAuthLayer::new(state.token_issuer.clone()));

    let receive_route = Router::new()
        .route("/metrics/v1/receive", post(handlers::receive::receive))
        .layer(RequestBodyLimitLayer::new(state.options.v2_limit_bytes));

    Router::new()
        .route("/", get(handlers::root::root))
        .route("/authorize", post(handlers::authorize::authorize))
        .merge(upload_route)
        .merge(receive_route)
        .with_state(state)
}
