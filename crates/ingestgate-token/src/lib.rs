//! Signed-token issuer and verifier for the v1 token-exchange flow (C1, §4.1).

pub mod error;
pub mod issuer;
pub mod keys;

pub use error::TokenError;
pub use issuer::TokenIssuer;
