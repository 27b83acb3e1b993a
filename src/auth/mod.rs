pub mod permissions;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use permissions::{is_known_city, DataScope, Permission, Role};

/// Session claims carried in the `token` cookie / bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: Uuid,
    pub login: String,
    pub role: Role,
    pub city: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, login: String, role: Role, city: String, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            user_id,
            login,
            role,
            city,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Verify signature and expiry, returning the claims.
pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Invalid(e.to_string()),
        })
}

/// Constant-time comparison of a shared secret.
pub fn secret_matches(expected: &str, given: &str) -> bool {
    expected.len() == given.len()
        && expected
            .bytes()
            .zip(given.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Hash a password with bcrypt on the blocking pool.
pub async fn hash_password(password: String, cost: u32) -> anyhow::Result<String> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

/// Check a password against a stored bcrypt hash. A malformed hash is a mismatch.
pub async fn verify_password(password: String, hash: String) -> anyhow::Result<bool> {
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false)).await?;
    Ok(verified)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_compare_whole_value() {
        assert!(secret_matches("registration", "registration"));
        assert!(!secret_matches("registration", "registratioN"));
        assert!(!secret_matches("registration", "registration-longer"));
        assert!(!secret_matches("registration", ""));
    }

    const SECRET: &str = "test-secret-that-is-at-least-32-chars";

    fn claims(expiry_hours: u64) -> Claims {
        Claims::new(Uuid::new_v4(), "anna".into(), Role::HiringManager, "WARSAW".into(), expiry_hours)
    }

    #[test]
    fn token_round_trip() {
        let original = claims(168);
        let token = generate_jwt(&original, SECRET).unwrap();
        let decoded = validate_jwt(&token, SECRET).unwrap();

        assert_eq!(decoded.user_id, original.user_id);
        assert_eq!(decoded.login, "anna");
        assert_eq!(decoded.role, Role::HiringManager);
        assert_eq!(decoded.exp - decoded.iat, 168 * 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut expired = claims(1);
        expired.iat -= 7200;
        expired.exp = Utc::now().timestamp() - 60;
        let token = generate_jwt(&expired, SECRET).unwrap();

        assert!(matches!(validate_jwt(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_jwt(&claims(1), SECRET).unwrap();
        let result = validate_jwt(&token, "another-secret-that-is-32-chars-long!");
        assert!(matches!(result, Err(JwtError::Invalid(_))));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(validate_jwt("not.a.jwt", SECRET), Err(JwtError::Invalid(_))));
        assert!(matches!(generate_jwt(&claims(1), ""), Err(JwtError::InvalidSecret)));
    }

    #[test]
    fn claims_use_camel_case() {
        let value = serde_json::to_value(claims(1)).unwrap();
        assert!(value.get("userId").is_some());
        assert_eq!(value["role"], "HIRING_MANAGER");
    }

    #[tokio::test]
    async fn password_hash_verifies() {
        let hash = hash_password("s3cret!".into(), 4).await.unwrap();
        assert!(verify_password("s3cret!".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong".into(), hash).await.unwrap());
        assert!(!verify_password("x".into(), "not-a-hash".into()).await.unwrap());
    }
}
