use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::Role;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,           // user id (hex ObjectId)
    pub role: Role,
    pub iat: i64,              // issued at
    pub exp: i64,              // expiration
    pub jti: String,           // JWT ID
    pub iss: String,           // issuer
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,
    #[error("Token invalid")]
    Invalid,
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Issues and verifies HS256 identity tokens.
///
/// Keys are derived once from the configured secret; the service holds no
/// other state and is shared across workers.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, issuer: &str, ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.jwt_secret, &config.jwt_issuer, config.jwt_expiration_hours)
    }

    /// Token lifetime in seconds
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn issue(&self, subject_id: &str, role: Role) -> Result<String, TokenError> {
        self.issue_at(subject_id, role, Utc::now())
    }

    fn issue_at(&self, subject_id: &str, role: Role, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Signing("Token expiry out of range".to_string()))?;
        let claims = Claims {
            sub: subject_id.to_string(),
            role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            iss: self.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Checks signature, issuer and expiry (no leeway).
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret-key-for-testing", "blog-service", 24)
    }

    #[test]
    fn test_issue_and_verify_token() {
        let tokens = service();
        let token = tokens.issue("64b7f0c2a1b2c3d4e5f60718", Role::Viewer).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "64b7f0c2a1b2c3d4e5f60718");
        assert_eq!(claims.role, Role::Viewer);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = service();
        let two_days_ago = Utc::now() - Duration::hours(48);
        let token = tokens.issue_at("user", Role::Admin, two_days_ago).unwrap();

        assert!(matches!(tokens.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_token_from_other_key_is_rejected() {
        let other = TokenService::new("another-secret", "blog-service", 24);
        let token = other.issue("user", Role::Admin).unwrap();

        assert!(matches!(service().verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_token_from_other_issuer_is_rejected() {
        let other = TokenService::new("test-secret-key-for-testing", "someone-else", 24);
        let token = other.issue("user", Role::Viewer).unwrap();

        assert!(matches!(service().verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let tokens = service();
        let token = tokens.issue("user", Role::Viewer).unwrap();
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        parts[1].push('A');

        assert!(matches!(tokens.verify(&parts.join(".")), Err(TokenError::Invalid)));
        assert!(matches!(tokens.verify("invalid.token.here"), Err(TokenError::Invalid)));
        assert!(matches!(tokens.verify(""), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_overflowing_lifetime_fails_instead_of_panicking() {
        let tokens = TokenService::new("test-secret-key-for-testing", "blog-service", 1_000_000_000_000);

        assert!(matches!(tokens.issue("user", Role::Viewer), Err(TokenError::Signing(_))));
    }
}
