//! Bearer token verification with `jsonwebtoken`

use std::fmt::Debug;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::domain::identity::{IdentityVerifier, SubjectId};

/// Claims read from an identity provider's access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (external user id)
    pub sub: String,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Verifies HS256 tokens signed with a shared secret, or RS256 tokens
/// signed by the holder of a configured public key
#[derive(Clone)]
pub struct JwtIdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl Debug for JwtIdentityVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIdentityVerifier")
            .field("algorithms", &self.validation.algorithms)
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtIdentityVerifier {
    pub fn from_secret(secret: &str) -> Self {
        Self::with_key(DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
    }

    pub fn from_rsa_pem(pem: &str) -> Result<Self, DomainError> {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| DomainError::configuration(format!("Invalid JWT public key: {}", e)))?;

        Ok(Self::with_key(key, Algorithm::RS256))
    }

    /// Only accept tokens whose `iss` matches
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.validation.set_issuer(&[issuer]);
        self
    }

    fn with_key(decoding_key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.validate_aud = false;

        Self {
            decoding_key,
            validation,
        }
    }

    pub fn claims(&self, token: &str) -> Result<JwtClaims, DomainError> {
        decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| DomainError::unauthorized(format!("Invalid token: {}", e)))
    }
}

impl IdentityVerifier for JwtIdentityVerifier {
    fn verify(&self, token: &str) -> Result<SubjectId, DomainError> {
        let claims = self.claims(token)?;

        if claims.sub.is_empty() {
            return Err(DomainError::unauthorized("Token has no subject"));
        }

        Ok(SubjectId::new(claims.sub))
    }
}

#[cfg(test)]
pub(crate) fn issue_test_token(secret: &str, subject: &str, issuer: Option<&str>) -> String {
    use jsonwebtoken::{EncodingKey, Header, encode};

    let claims = JwtClaims {
        sub: subject.to_string(),
        exp: chrono::Utc::now().timestamp() + 3600,
        iss: issuer.map(str::to_string),
        email: None,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    #[test]
    fn test_verify_valid_token() {
        let verifier = JwtIdentityVerifier::from_secret("secret");
        let token = issue_test_token("secret", "user_1", None);

        assert_eq!(verifier.verify(&token).unwrap().as_str(), "user_1");
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let verifier = JwtIdentityVerifier::from_secret("secret");
        let token = issue_test_token("other", "user_1", None);

        assert!(matches!(
            verifier.verify(&token).unwrap_err(),
            DomainError::Unauthorized { .. }
        ));
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        let verifier = JwtIdentityVerifier::from_secret("secret");
        let claims = JwtClaims {
            sub: "user_1".to_string(),
            exp: chrono::Utc::now().timestamp() - 3600,
            iss: None,
            email: None,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_issuer_is_enforced() {
        let verifier = JwtIdentityVerifier::from_secret("secret").with_issuer("https://auth.test");

        let good = issue_test_token("secret", "user_1", Some("https://auth.test"));
        let bad = issue_test_token("secret", "user_1", Some("https://evil.test"));

        assert!(verifier.verify(&good).is_ok());
        assert!(verifier.verify(&bad).is_err());
    }

    #[test]
    fn test_garbage_and_bad_pem() {
        let verifier = JwtIdentityVerifier::from_secret("secret");
        assert!(verifier.verify("not-a-jwt").is_err());

        assert!(matches!(
            JwtIdentityVerifier::from_rsa_pem("not a pem").unwrap_err(),
            DomainError::Configuration { .. }
        ));
    }

    #[test]
    fn test_debug_hides_key() {
        let verifier = JwtIdentityVerifier::from_secret("super-secret");
        assert!(!format!("{:?}", verifier).contains("super-secret"));
    }
}
