use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Access-token claims as issued by the hosted auth provider (HS256)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: Option<String>, audience: &str, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            email,
            role: Some(audience.to_string()),
            aud: audience.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

pub fn issue_token(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Verify signature, expiry and audience, returning the decoded claims
pub fn verify_token(token: &str, secret: &str, audience: &str) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[audience]);

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-with-enough-entropy";

    #[test]
    fn issued_token_verifies() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Some("a@b.org".into()), "authenticated", Duration::hours(1));
        let token = issue_token(&claims, SECRET).unwrap();
        let decoded = verify_token(&token, SECRET, "authenticated").unwrap();
        assert_eq!(decoded.sub, user_id);
        assert_eq!(decoded.email.as_deref(), Some("a@b.org"));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = Claims::new(Uuid::new_v4(), None, "authenticated", Duration::hours(1));
        let token = issue_token(&claims, SECRET).unwrap();
        assert!(matches!(
            verify_token(&token, "another-secret", "authenticated"),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let claims = Claims::new(Uuid::new_v4(), None, "anon", Duration::hours(1));
        let token = issue_token(&claims, SECRET).unwrap();
        assert!(verify_token(&token, SECRET, "authenticated").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims::new(Uuid::new_v4(), None, "authenticated", Duration::hours(-2));
        let token = issue_token(&claims, SECRET).unwrap();
        assert!(verify_token(&token, SECRET, "authenticated").is_err());
    }

    #[test]
    fn empty_secret_is_an_error() {
        assert!(matches!(verify_token("x.y.z", "", "authenticated"), Err(AuthError::MissingSecret)));
    }
}
