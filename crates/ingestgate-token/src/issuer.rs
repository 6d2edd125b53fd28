//! Mint and verify v1 tokens (§4.1).

use std::collections::HashMap;

use ingestgate_types::claims::TenantClaims;
use ingestgate_types::cluster::ClusterIdentity;
use jsonwebtoken::{decode, encode, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::TokenError;
use crate::keys::{load_or_generate, KeyMaterial};

/// JWT claim set minted for the v1 token-exchange flow.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    aud: String,
    sub: String,
    iat: u64,
    exp: u64,
    #[serde(default)]
    labels: HashMap<String, String>,
}

/// Issues and verifies the short-lived signed tokens handed out by
/// `/authorize` and checked on `/upload` (C1).
pub struct TokenIssuer {
    key: KeyMaterial,
    issuer: String,
    audience: String,
    expire_seconds: u64,
}

impl TokenIssuer {
    /// Builds an issuer/verifier from operator-supplied key bytes (or
    /// generates an ephemeral keypair if `key_bytes` is `None`).
    pub fn new(
        key_bytes: Option<&[u8]>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        expire_seconds: u64,
    ) -> Result<Self, TokenError> {
        Ok(Self {
            key: load_or_generate(key_bytes)?,
            issuer: issuer.into(),
            audience: audience.into(),
            expire_seconds,
        })
    }

    /// Mints a signed token binding `subject` to `labels`, valid for
    /// `expire_seconds` from now.
    pub fn mint(
        &self,
        subject: &ClusterIdentity,
        labels: HashMap<String, String>,
    ) -> Result<String, TokenError> {
        let now = ingestgate_types::timestamp::UnixTimestamp::now().as_secs();
        let claims = Claims {
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            sub: subject.as_str().to_string(),
            iat: now,
            exp: now + self.expire_seconds,
            labels,
        };
        let header = Header::new(self.key.algorithm);
        encode(&header, &claims, &self.key.encoding_key).map_err(TokenError::from)
    }

    /// Verifies a token's signature, issuer, audience and expiry, and
    /// returns the resolved tenant identity and labels on success.
    pub fn verify(&self, token: &str) -> Result<TenantClaims, TokenError> {
        let mut validation = Validation::new(self.key.algorithm);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_required_spec_claims(&["iss", "aud", "sub", "exp"]);

        let data = decode::<Claims>(token, &self.key.decoding_key, &validation)?;
        Ok(TenantClaims::new(
            ClusterIdentity::from(data.claims.sub),
            data.claims.labels,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(None, "telemeter.selfsigned", "telemeter-client", 3600).unwrap()
    }

    #[test]
    fn mint_then_verify_round_trips_subject_and_labels() {
        let issuer = issuer();
        let subject = ClusterIdentity::from("cluster-a");
        let mut labels = HashMap::new();
        labels.insert("region".to_string(), "us".to_string());

        let token = issuer.mint(&subject, labels.clone()).unwrap();
        let claims = issuer.verify(&token).unwrap();

        assert_eq!(claims.subject, subject);
        assert_eq!(claims.labels, labels);
    }

    #[test]
    fn verify_rejects_malformed_token() {
        let issuer = issuer();
        assert!(matches!(
            issuer.verify("not-a-jwt"),
            Err(TokenError::Malformed)
        ));
    }

    #[test]
    fn verify_rejects_token_signed_by_a_different_key() {
        let issuer_a = issuer();
        let issuer_b = issuer();
        let token = issuer_a
            .mint(&ClusterIdentity::from("cluster-a"), HashMap::new())
            .unwrap();
        assert!(matches!(
            issuer_b.verify(&token),
            Err(TokenError::BadSignature)
        ));
    }

    #[test]
    fn verify_rejects_expired_token() {
        let issuer = TokenIssuer::new(None, "telemeter.selfsigned", "telemeter-client", 0).unwrap();
        let token = issuer
            .mint(&ClusterIdentity::from("cluster-a"), HashMap::new())
            .unwrap();
        std::thread::sleep(std::time::Duration::from_secs(1));
        assert!(matches!(issuer.verify(&token), Err(TokenError::Expired)));
    }
}
