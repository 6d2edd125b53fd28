//! The upstream cluster authorizer (C2, §4.2): a single capability trait
//! substituted at startup between a local stub and a real HTTP call, the
//! way the teacher's `Facilitator` trait is substituted between local and
//! remote implementations.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use ingestgate_types::claims::TenantClaims;
use ingestgate_types::cluster::ClusterIdentity;
use serde::Deserialize;
use url::Url;

use crate::error::AuthorizerError;
use crate::oidc::OidcTokenSource;
use crate::outcome::AuthOutcome;

/// Authorizes a (external bearer, cluster identity) pair against an
/// upstream source of truth.
#[async_trait]
pub trait ClusterAuthorizer: Send + Sync {
    async fn authorize(
        &self,
        external_token: &str,
        cluster: &ClusterIdentity,
    ) -> Result<AuthOutcome, AuthorizerError>;
}

#[async_trait]
impl ClusterAuthorizer for Box<dyn ClusterAuthorizer> {
    async fn authorize(
        &self,
        external_token: &str,
        cluster: &ClusterIdentity,
    ) -> Result<AuthOutcome, AuthorizerError> {
        (**self).authorize(external_token, cluster).await
    }
}

/// Accepts every cluster unconditionally. Used when no `authorize` URL is
/// configured — local and test deployments only (§4.2).
#[derive(Debug, Clone, Default)]
pub struct StubAuthorizer;

#[async_trait]
impl ClusterAuthorizer for StubAuthorizer {
    async fn authorize(
        &self,
        _external_token: &str,
        cluster: &ClusterIdentity,
    ) -> Result<AuthOutcome, AuthorizerError> {
        Ok(AuthOutcome::Accepted(TenantClaims::new(
            cluster.clone(),
            HashMap::new(),
        )))
    }
}

/// Expected JSON body of a `200` response from the upstream authorization
/// endpoint.
#[derive(Debug, Deserialize)]
struct AcceptBody {
    subject: String,
    #[serde(default)]
    labels: HashMap<String, String>,
}

/// Calls an operator-configured authorization URL, optionally wrapping the
/// outbound client with OIDC client-credentials (§4.2).
pub struct HttpAuthorizer {
    client: reqwest::Client,
    authorize_url: Url,
    oidc: Option<OidcTokenSource>,
}

impl HttpAuthorizer {
    pub fn new(authorize_url: Url, oidc: Option<OidcTokenSource>) -> Result<Self, AuthorizerError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(20))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AuthorizerError::Http {
                context: "building upstream authorizer HTTP client",
                source: e,
            })?;
        Ok(Self {
            client,
            authorize_url,
            oidc,
        })
    }
}

#[async_trait]
impl ClusterAuthorizer for HttpAuthorizer {
    async fn authorize(
        &self,
        external_token: &str,
        cluster: &ClusterIdentity,
    ) -> Result<AuthOutcome, AuthorizerError> {
        let mut req = self
            .client
            .get(self.authorize_url.clone())
            .bearer_auth(external_token)
            .query(&[("id", cluster.as_str())]);

        if let Some(oidc) = &self.oidc {
            let access_token = oidc.access_token().await?;
            req = req.header("X-Upstream-Authorization", format!("Bearer {access_token}"));
        }

        let response = req.send().await.map_err(|e| AuthorizerError::Http {
            context: "calling upstream authorization endpoint",
            source: e,
        })?;

        let status = response.status();
        if status.is_success() {
            let body: AcceptBody = response.json().await.map_err(|e| {
                AuthorizerError::MalformedResponse(format!(
                    "could not parse accept body as JSON: {e}"
                ))
            })?;
            Ok(AuthOutcome::Accepted(TenantClaims::new(
                ClusterIdentity::from(body.subject),
                body.labels,
            )))
        } else if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            Ok(AuthOutcome::Rejected { status, body })
        } else {
            // 5xx and anything else unexpected is transient (§4.2, §7).
            let body = response.text().await.unwrap_or_default();
            Err(AuthorizerError::MalformedResponse(format!(
                "upstream returned {status}: {body}"
            )))
        }
    }
}

/// Maps an [`AuthorizerError`] to the HTTP status the caller should see:
/// always `502`, per the transient-failure taxonomy (§7).
pub fn transient_status() -> StatusCode {
    StatusCode::BAD_GATEWAY
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingestgate_types::cluster::ClusterIdentity;

    #[tokio::test]
    async fn stub_authorizer_accepts_everything() {
        let stub = StubAuthorizer;
        let outcome = stub
            .authorize("any-token", &ClusterIdentity::from("cluster-a"))
            .await
            .unwrap();
        match outcome {
            AuthOutcome::Accepted(claims) => {
                assert_eq!(claims.subject, ClusterIdentity::from("cluster-a"));
            }
            AuthOutcome::Rejected { .. } => panic!("stub must never reject"),
        }
    }
}
