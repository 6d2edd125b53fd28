use thiserror::Error;

/// Errors raised by the signed-token issuer/verifier (C1, §4.1).
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to load signing key: {0}")]
    KeyLoad(String),
    #[error("failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("token has expired")]
    Expired,
    #[error("token signature is invalid")]
    BadSignature,
    #[error("token issuer does not match the configured issuer")]
    WrongIssuer,
    #[error("token audience does not contain the configured audience")]
    WrongAudience,
    #[error("token is malformed")]
    Malformed,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            ErrorKind::InvalidIssuer => TokenError::WrongIssuer,
            ErrorKind::InvalidAudience => TokenError::WrongAudience,
            ErrorKind::InvalidToken
            | ErrorKind::InvalidKeyFormat
            | ErrorKind::Json(_)
            | ErrorKind::Base64(_)
            | ErrorKind::Utf8(_) => TokenError::Malformed,
            _ => TokenError::Signing(err),
        }
    }
}
