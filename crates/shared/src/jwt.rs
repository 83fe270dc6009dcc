//! Branch access tokens.
//!
//! Tokens are HS256 JWTs carrying the caller's user, branch and role. The
//! identity provider issues them in production; the seeder and the tests mint
//! their own with [`JwtService::generate_access_token`].

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

use crate::auth::Claims;
use crate::types::{BranchId, UserId};

/// Token settings, loaded from the `jwt` config section.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret shared with the identity provider.
    pub secret: String,
    /// Lifetime of minted tokens.
    pub access_token_expires_minutes: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            access_token_expires_minutes: 15,
        }
    }
}

/// Why a branch token could not be minted or accepted.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Could not sign the claims.
    #[error("failed to sign access token: {0}")]
    Signing(String),

    /// Bad signature, bad encoding or unusable claims.
    #[error("access token rejected: {0}")]
    Rejected(String),

    /// Past its `exp`.
    #[error("access token has expired")]
    Expired,
}

/// Mints and verifies branch access tokens.
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("access_token_expires_minutes", &self.config.access_token_expires_minutes)
            .field("secret", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Derives both HMAC keys from the configured secret.
    #[must_use]
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Mints a token scoping `user_id` to `branch_id` with `role`.
    ///
    /// # Errors
    /// `Signing` if the claims cannot be signed.
    pub fn generate_access_token(
        &self,
        user_id: UserId,
        branch_id: BranchId,
        role: &str,
    ) -> Result<String, JwtError> {
        let expires_at = Utc::now() + Duration::minutes(self.config.access_token_expires_minutes);
        let claims = Claims::new(user_id, branch_id, role, expires_at);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Signing(e.to_string()))
    }

    /// Verifies a bearer token and returns its claims.
    ///
    /// # Errors
    /// `Expired` past `exp`, `Rejected` for anything else that fails
    /// verification.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Rejected(e.to_string()),
            })
    }

    /// Token lifetime in seconds, as reported to clients.
    #[must_use]
    pub const fn access_token_expires_in(&self) -> i64 {
        self.config.access_token_expires_minutes * 60
    }
}
