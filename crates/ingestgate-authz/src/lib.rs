//! Upstream cluster authorizer (C2, §4.2) and authorization response cache
//! (C3, §4.3).

pub mod authorizer;
pub mod cache;
pub mod error;
pub mod oidc;
pub mod outcome;

pub use authorizer::{ClusterAuthorizer, HttpAuthorizer, StubAuthorizer};
pub use cache::CachingAuthorizer;
pub use error::{AuthorizerError, CacheError};
pub use outcome::AuthOutcome;
