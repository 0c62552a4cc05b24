//! Caller identity verification

use std::fmt::Debug;

use serde::Serialize;

use crate::domain::DomainError;

/// Verified external subject id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolves a bearer token to the subject it was issued for
pub trait IdentityVerifier: Send + Sync + Debug {
    /// Fails with `DomainError::Unauthorized` for any invalid token
    fn verify(&self, token: &str) -> Result<SubjectId, DomainError>;
}
