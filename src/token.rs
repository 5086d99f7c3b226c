use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

/// Signs and verifies session tokens (HS256).
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::internal("Failed to set expiration"))?;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp() as usize,
            exp: expiration.timestamp() as usize,
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(AppError::internal)
    }

    /// Checks signature and expiry, returning the user id the token was
    /// issued for. A well-signed but expired token yields `Expired`.
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let decoded = decode::<Claims>(token, &self.decoding, &validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        Uuid::parse_str(&decoded.claims.sub).map_err(|_| TokenError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> TokenKeys {
        TokenKeys::new("test-secret", Duration::hours(1))
    }

    #[test]
    fn issued_token_verifies_to_same_user() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).unwrap();
        assert_eq!(keys.verify(&token), Ok(user_id));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let keys = keys();
        let past = (Utc::now() - Duration::minutes(5)).timestamp() as usize;
        let token = keys
            .sign(&Claims {
                sub: Uuid::new_v4().to_string(),
                iat: past - 60,
                exp: past,
            })
            .unwrap();
        assert_eq!(keys.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn spliced_payload_fails_signature_check() {
        let keys = keys();
        let victim = keys.issue(Uuid::new_v4()).unwrap();
        let forged = TokenKeys::new("other-secret", Duration::hours(1))
            .issue(Uuid::new_v4())
            .unwrap();

        let victim_parts: Vec<&str> = victim.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let tampered = format!(
            "{}.{}.{}",
            victim_parts[0], forged_parts[1], victim_parts[2]
        );

        assert_eq!(keys.verify(&tampered), Err(TokenError::Invalid));
    }

    #[test]
    fn foreign_secret_and_garbage_are_invalid() {
        let keys = keys();
        let foreign = TokenKeys::new("other-secret", Duration::hours(1))
            .issue(Uuid::new_v4())
            .unwrap();
        assert_eq!(keys.verify(&foreign), Err(TokenError::Invalid));
        assert_eq!(keys.verify("not-a-token"), Err(TokenError::Invalid));
        assert_eq!(keys.verify(""), Err(TokenError::Invalid));
    }

    #[test]
    fn non_uuid_subject_is_invalid() {
        let keys = keys();
        let exp = (Utc::now() + Duration::hours(1)).timestamp() as usize;
        let token = keys
            .sign(&Claims {
                sub: "42".into(),
                iat: exp - 3600,
                exp,
            })
            .unwrap();
        assert_eq!(keys.verify(&token), Err(TokenError::Invalid));
    }
}
