use thiserror::Error;

/// Transient failures talking to the upstream authorizer (C2, §4.2).
///
/// Permanent rejections (a 4xx from upstream) are not an error at all —
/// they are a successful [`crate::outcome::AuthOutcome::Rejected`].
#[derive(Debug, Error)]
pub enum AuthorizerError {
    #[error("upstream authorization call failed: {context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("upstream authorization response was malformed: {0}")]
    MalformedResponse(String),
    #[error("failed to obtain an OIDC access token: {0}")]
    Oidc(String),
}

/// Errors from the authorization response cache (C3, §4.3).
///
/// Every variant here is soft-fail by contract: callers log it and fall
/// through to the upstream authorizer rather than failing the request.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend connection error: {0}")]
    Connection(String),
}
