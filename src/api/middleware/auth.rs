//! Bearer token authentication

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::identity::SubjectId;

/// Extractor that requires a verified `Authorization: Bearer <token>`
#[derive(Debug, Clone)]
pub struct RequireSubject(pub SubjectId);

impl RequireSubject {
    /// Reject callers acting on another subject's account
    pub fn ensure_owns(&self, subject_id: &str) -> Result<(), ApiError> {
        if self.0.as_str() != subject_id {
            return Err(ApiError::forbidden("Cannot access another user's credits"));
        }

        Ok(())
    }
}

impl FromRequestParts<AppState> for RequireSubject {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;

        let subject = state.identity.verify(&token).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            ApiError::unauthorized("Invalid token")
        })?;

        Ok(RequireSubject(subject))
    }
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?
        .to_str()
        .map_err(|_| ApiError::unauthorized("Unauthorized"))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(ApiError::unauthorized("Unauthorized")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(
            extract_bearer_token(&headers("Bearer abc.def")).unwrap(),
            "abc.def"
        );
        assert_eq!(
            extract_bearer_token(&headers("Bearer   padded  ")).unwrap(),
            "padded"
        );
    }

    #[test]
    fn test_missing_or_malformed() {
        let err = extract_bearer_token(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);

        assert!(extract_bearer_token(&headers("Basic dXNlcjpwYXNz")).is_err());
        assert!(extract_bearer_token(&headers("Bearer ")).is_err());
    }

    #[test]
    fn test_ensure_owns() {
        let subject = RequireSubject(SubjectId::new("user_1"));

        assert!(subject.ensure_owns("user_1").is_ok());
        assert_eq!(
            subject.ensure_owns("user_2").unwrap_err().status,
            StatusCode::FORBIDDEN
        );
    }
}
