//! JWT signing and verification
//!
//! HS256 tokens carrying the user identifier in `sub`. The signer also
//! renders the `jwt` cookie used by the server-rendered pages.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::error::{AppError, Result};

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user identifier
    pub sub: String,
    /// Issued-at, seconds since epoch
    pub iat: i64,
    /// Expiry, seconds since epoch
    pub exp: i64,
}

/// Signs and verifies access tokens.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    validation: Validation,
    expires_in_secs: u64,
    cookie_max_age_secs: u64,
    secure_cookies: bool,
}

impl TokenSigner {
    /// Build a signer from configuration. Cookies carry the `Secure`
    /// attribute outside development mode.
    #[must_use]
    pub fn new(config: &JwtConfig, development: bool) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(config.secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(config.secret.as_bytes())),
            validation: Validation::new(Algorithm::HS256),
            expires_in_secs: config.expires_in_secs,
            cookie_max_age_secs: config.cookie_expires_days * 24 * 60 * 60,
            secure_cookies: !development,
        }
    }

    /// Sign a token for a user identifier.
    pub fn sign(&self, user_id: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.expires_in_secs as i64,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Verify a token and return its claims.
    ///
    /// Expired and malformed tokens both map to `Unauthorized`, with the
    /// messages the API contract promises.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Expired token, please log in again".to_string())
                }
                _ => AppError::Unauthorized("Invalid token, please log in again".to_string()),
            })
    }

    /// The `Set-Cookie` value delivering a signed token.
    #[must_use]
    pub fn cookie(&self, token: &str) -> String {
        let mut cookie = format!(
            "jwt={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_max_age_secs
        );
        if self.secure_cookies {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// The `Set-Cookie` value clearing the token on logout.
    #[must_use]
    pub fn logout_cookie(&self) -> String {
        "jwt=logged-out; Path=/; HttpOnly; SameSite=Lax; Max-Age=10".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(
            &JwtConfig {
                secret: "unit-test-secret".to_string(),
                expires_in_secs: 3600,
                cookie_expires_days: 1,
            },
            true,
        )
    }

    #[test]
    fn test_sign_and_verify_round_trip() {
        let signer = signer();
        let token = signer.sign("user-42").unwrap();
        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-42");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_garbage_token_is_unauthorized() {
        let signer = signer();
        let err = signer.verify("not.a.token").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signer = signer();
        let other = TokenSigner::new(
            &JwtConfig {
                secret: "different-secret".to_string(),
                expires_in_secs: 3600,
                cookie_expires_days: 1,
            },
            true,
        );
        let token = signer.sign("user-42").unwrap();
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_cookie_attributes() {
        let dev = signer();
        let cookie = dev.cookie("abc");
        assert!(cookie.starts_with("jwt=abc"));
        assert!(cookie.contains("HttpOnly"));
        assert!(!cookie.contains("Secure"));

        let prod = TokenSigner::new(
            &JwtConfig {
                secret: "s".to_string(),
                expires_in_secs: 10,
                cookie_expires_days: 1,
            },
            false,
        );
        assert!(prod.cookie("abc").contains("Secure"));
    }

    #[test]
    fn test_logout_cookie_expires_quickly() {
        assert!(signer().logout_cookie().contains("Max-Age=10"));
    }
}
