//! Private-key loading for C1 (§4.1, §6): PKCS#1 RSA, PKCS#8 (RSA or EC) or
//! SEC1 EC, PEM-wrapped or raw DER, with an ephemeral P-256 fallback.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use p256::ecdsa::SigningKey;
use p256::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey};
use pkcs8::LineEnding;
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::pkcs8::DecodePrivateKey as RsaDecodePrivateKey;
use rsa::RsaPrivateKey;

use crate::error::TokenError;

/// A loaded (or freshly generated) signing/verification key pair, already
/// paired with the JWT algorithm it signs with.
pub struct KeyMaterial {
    pub algorithm: Algorithm,
    pub encoding_key: EncodingKey,
    pub decoding_key: DecodingKey,
}

/// Loads a private key from operator-supplied bytes, trying PKCS#1 RSA,
/// then PKCS#8 (RSA or EC), then SEC1 EC, in PEM or raw DER form. If `bytes`
/// is `None`, generates an ephemeral P-256 keypair and warns loudly, since
/// a restart invalidates every outstanding token signed with it.
pub fn load_or_generate(bytes: Option<&[u8]>) -> Result<KeyMaterial, TokenError> {
    match bytes {
        Some(bytes) => load_private_key(bytes),
        None => {
            tracing::warn!(
                "no signing key configured; generating an ephemeral P-256 keypair. \
                 Restarting the gateway will invalidate every token minted this run."
            );
            Ok(generate_ephemeral_ecdsa())
        }
    }
}

fn load_private_key(bytes: &[u8]) -> Result<KeyMaterial, TokenError> {
    let text = std::str::from_utf8(bytes).ok();

    // 1. PKCS#1 RSA (PEM, then DER).
    let rsa_pkcs1 = text
        .and_then(|t| RsaPrivateKey::from_pkcs1_pem(t).ok())
        .or_else(|| RsaPrivateKey::from_pkcs1_der(bytes).ok());
    if let Some(key) = rsa_pkcs1 {
        return rsa_key_material(key);
    }

    // 2. PKCS#8 (wraps either RSA or EC; try RSA first, then EC).
    let rsa_pkcs8 = text
        .and_then(|t| RsaPrivateKey::from_pkcs8_pem(t).ok())
        .or_else(|| RsaPrivateKey::from_pkcs8_der(bytes).ok());
    if let Some(key) = rsa_pkcs8 {
        return rsa_key_material(key);
    }
    let ec_pkcs8 = text
        .and_then(|t| SigningKey::from_pkcs8_pem(t).ok())
        .or_else(|| SigningKey::from_pkcs8_der(bytes).ok());
    if let Some(key) = ec_pkcs8 {
        return ecdsa_key_material(key);
    }

    // 3. SEC1 EC (PEM, then DER).
    let ec_sec1 = text
        .and_then(|t| <SigningKey as sec1::DecodeEcPrivateKey>::from_sec1_pem(t).ok())
        .or_else(|| <SigningKey as sec1::DecodeEcPrivateKey>::from_sec1_der(bytes).ok());
    if let Some(key) = ec_sec1 {
        return ecdsa_key_material(key);
    }

    Err(TokenError::KeyLoad(
        "key is not valid PKCS#1 RSA, PKCS#8 (RSA or EC), or SEC1 EC, in PEM or DER".to_string(),
    ))
}

fn generate_ephemeral_ecdsa() -> KeyMaterial {
    let signing_key = SigningKey::random(&mut OsRng);
    ecdsa_key_material(signing_key).expect("freshly generated key material always encodes")
}

fn ecdsa_key_material(signing_key: SigningKey) -> Result<KeyMaterial, TokenError> {
    let private_pem = signing_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| TokenError::KeyLoad(format!("failed to re-encode EC private key: {e}")))?;
    let verifying_key = signing_key.verifying_key();
    let public_pem = verifying_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| TokenError::KeyLoad(format!("failed to derive EC public key: {e}")))?;

    let encoding_key = EncodingKey::from_ec_pem(private_pem.as_bytes())
        .map_err(|e| TokenError::KeyLoad(format!("jsonwebtoken rejected EC private key: {e}")))?;
    let decoding_key = DecodingKey::from_ec_pem(public_pem.as_bytes())
        .map_err(|e| TokenError::KeyLoad(format!("jsonwebtoken rejected EC public key: {e}")))?;

    Ok(KeyMaterial {
        algorithm: Algorithm::ES256,
        encoding_key,
        decoding_key,
    })
}

fn rsa_key_material(private_key: RsaPrivateKey) -> Result<KeyMaterial, TokenError> {
    let private_pem = private_key
        .to_pkcs1_pem(LineEnding::LF)
        .map_err(|e| TokenError::KeyLoad(format!("failed to re-encode RSA private key: {e}")))?;
    let public_key = private_key.to_public_key();
    let public_pem = public_key
        .to_pkcs1_pem(LineEnding::LF)
        .map_err(|e| TokenError::KeyLoad(format!("failed to derive RSA public key: {e}")))?;

    let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
        .map_err(|e| TokenError::KeyLoad(format!("jsonwebtoken rejected RSA private key: {e}")))?;
    let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
        .map_err(|e| TokenError::KeyLoad(format!("jsonwebtoken rejected RSA public key: {e}")))?;

    Ok(KeyMaterial {
        algorithm: Algorithm::RS256,
        encoding_key,
        decoding_key,
    })
}
