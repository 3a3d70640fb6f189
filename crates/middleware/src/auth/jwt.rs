use chrono::{Duration, Utc};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use recall_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// What a token authorizes, and therefore how long it lives: a standard
/// multi-day login session, or a short password-reset window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Session,
    PasswordReset,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
    pub purpose: TokenPurpose,
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_expiry_days: u64,
    reset_expiry_secs: u64,
}

impl JwtService {
    pub fn new(secret: &[u8], session_expiry_days: u64, reset_expiry_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            session_expiry_days,
            reset_expiry_secs,
        }
    }

    pub fn generate_token(&self, user_id: &str, purpose: TokenPurpose) -> AppResult<String> {
        let now = Utc::now();
        let expiry = match purpose {
            TokenPurpose::Session => Duration::days(self.session_expiry_days as i64),
            TokenPurpose::PasswordReset => Duration::seconds(self.reset_expiry_secs as i64),
        };
        let expires_at = now + expiry;

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            purpose,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::AuthenticationError(format!("Failed to generate token: {}", e)))
    }

    /// Decode and verify a token. Expired signatures are distinguishable from
    /// every other failure so callers can tell the user which happened.
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &Validation::default()).map_err(|e| {
                warn!("Token validation failed: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => AppError::token_expired(),
                    _ => AppError::token_invalid(),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Helper function to create a test JWT service
    fn create_test_jwt_service() -> JwtService {
        let secret = b"test_secret_key_for_testing_purposes_only";
        JwtService::new(secret, 3, 3600)
    }

    #[test]
    fn test_token_round_trip() {
        let jwt_service = create_test_jwt_service();
        let user_id = "user123";

        let token = jwt_service
            .generate_token(user_id, TokenPurpose::Session)
            .expect("Token generation should succeed");
        assert!(!token.is_empty(), "Generated token should not be empty");

        let claims = jwt_service
            .validate_token(&token)
            .expect("Valid token should be validated successfully");

        assert_eq!(claims.sub, user_id, "Subject claim should match user ID");
        assert_eq!(claims.purpose, TokenPurpose::Session);
    }

    #[test]
    fn test_reset_token_round_trip() {
        let jwt_service = create_test_jwt_service();

        let token = jwt_service
            .generate_token("user123", TokenPurpose::PasswordReset)
            .unwrap();
        let claims = jwt_service.validate_token(&token).unwrap();

        assert_eq!(claims.purpose, TokenPurpose::PasswordReset);
        // The reset window is much shorter than the session window
        assert!(claims.exp - claims.iat <= 3600);
    }

    #[test]
    fn test_garbage_token_is_invalid_not_expired() {
        let jwt_service = create_test_jwt_service();

        let result = jwt_service.validate_token("invalid.token.string");
        match result {
            Err(AppError::AuthenticationError(msg)) => {
                assert!(msg.contains("Invalid token"), "got message: {}", msg);
            }
            other => panic!("expected AuthenticationError, got {:?}", other),
        }
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let jwt_service = create_test_jwt_service();

        // Craft a token whose reset window has already elapsed (beyond the
        // default decode leeway)
        let now = Utc::now();
        let claims = Claims {
            sub: "user123".to_string(),
            iat: (now - Duration::hours(2)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
            purpose: TokenPurpose::PasswordReset,
        };

        let token = encode(&Header::default(), &claims, &jwt_service.encoding_key)
            .expect("Failed to encode token");

        match jwt_service.validate_token(&token) {
            Err(AppError::AuthenticationError(msg)) => {
                assert!(msg.contains("expired"), "got message: {}", msg);
            }
            other => panic!("expected AuthenticationError, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let jwt_service = create_test_jwt_service();
        let other_service = JwtService::new(b"a_completely_different_secret", 3, 3600);

        let token = other_service
            .generate_token("user123", TokenPurpose::Session)
            .unwrap();

        match jwt_service.validate_token(&token) {
            Err(AppError::AuthenticationError(msg)) => {
                assert!(msg.contains("Invalid token"), "got message: {}", msg);
            }
            other => panic!("expected AuthenticationError, got {:?}", other),
        }
    }
}
