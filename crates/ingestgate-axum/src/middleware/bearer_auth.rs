//! Bearer-auth middleware for v1 `/upload` (C5, §4.5).
//!
//! Shaped like the teacher's `X402Middleware`/`X402MiddlewareService` pair:
//! a cheap-to-clone [`tower::Layer`] that wraps the inner service, and a
//! [`tower::Service`] that intercepts each request before it reaches the
//! handler.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum_core::extract::Request;
use axum_core::response::{IntoResponse, Response};
use http::StatusCode;
use ingestgate_token::TokenIssuer;
use tower::util::BoxCloneSyncService;
use tower::{Layer, Service};

/// The well-known request-extension key [`crate::middleware::bearer_auth`]
/// stores the resolved tenant claims under.
pub use ingestgate_types::claims::TenantClaims;

/// Layer that verifies a v1 token on the `Authorization` header before
/// letting a request through to `/upload`.
#[derive(Clone)]
pub struct BearerAuthLayer {
    issuer: Arc<TokenIssuer>,
}

impl BearerAuthLayer {
    pub fn new(issuer: Arc<TokenIssuer>) -> Self {
        Self { issuer }
    }
}

impl<S> Layer<S> for BearerAuthLayer
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
{
    type Service = BearerAuthService;

    fn layer(&self, inner: S) -> Self::Service {
        BearerAuthService {
            issuer: self.issuer.clone(),
            inner: BoxCloneSyncService::new(inner),
        }
    }
}

#[derive(Clone)]
pub struct BearerAuthService {
    issuer: Arc<TokenIssuer>,
    inner: BoxCloneSyncService<Request, Response, Infallible>,
}

impl Service<Request> for BearerAuthService {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let bearer = extract_bearer(req.headers());
        let issuer = self.issuer.clone();
        let mut inner = self.inner.clone();
        Box::pin(async move {
            let token = match bearer {
                Some(token) => token,
                None => return Ok(unauthorized("missing Authorization bearer")),
            };
            match issuer.verify(&token) {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    inner.call(req).await
                }
                Err(err) => Ok(unauthorized(&err.to_string())),
            }
        })
    }
}

fn extract_bearer(headers: &http::HeaderMap) -> Option<String> {
    let value = headers.get(http::header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(str::to_string)
}

fn unauthorized(reason: &str) -> Response {
    (StatusCode::UNAUTHORIZED, reason.to_string()).into_response()
}
