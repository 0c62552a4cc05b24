//! Authentication infrastructure module

mod jwt;

#[cfg(test)]
pub(crate) use jwt::issue_test_token;
pub use jwt::{JwtClaims, JwtIdentityVerifier};
