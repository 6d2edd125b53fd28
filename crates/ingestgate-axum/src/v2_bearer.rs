//! Extracts the cluster identity carried inside a v2 bearer payload (§3,
//! §6: "the JSON key in v2 bearer payload whose value is the tenant ID").
//!
//! The v2 bearer is treated as a JWT-shaped token: if it has three
//! dot-separated segments the middle one is the payload; otherwise the
//! whole token is taken as a base64url-encoded JSON object. Either way,
//! `tenant_key` is looked up in that JSON object.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ingestgate_types::cluster::ClusterIdentity;

pub fn extract_cluster(bearer: &str, tenant_key: &str) -> Option<ClusterIdentity> {
    let payload_segment = match bearer.splitn(3, '.').collect::<Vec<_>>().as_slice() {
        [_, payload, _] => *payload,
        _ => bearer,
    };
    let decoded = URL_SAFE_NO_PAD.decode(payload_segment).ok()?;
    let value: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    value
        .get(tenant_key)
        .and_then(|v| v.as_str())
        .map(ClusterIdentity::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_tenant_from_jwt_shaped_payload() {
        let payload = serde_json::json!({"cluster": "cluster-a"});
        let encoded = URL_SAFE_NO_PAD.encode(payload.to_string());
        let bearer = format!("header.{encoded}.sig");
        assert_eq!(
            extract_cluster(&bearer, "cluster"),
            Some(ClusterIdentity::from("cluster-a"))
        );
    }

    #[test]
    fn extracts_tenant_from_bare_base64_json() {
        let payload = serde_json::json!({"cluster": "cluster-b"});
        let encoded = URL_SAFE_NO_PAD.encode(payload.to_string());
        assert_eq!(
            extract_cluster(&encoded, "cluster"),
            Some(ClusterIdentity::from("cluster-b"))
        );
    }

    #[test]
    fn returns_none_for_garbage_input() {
        assert_eq!(extract_cluster("not-base64-!!!", "cluster"), None);
    }
}
