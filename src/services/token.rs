//! Token service
//!
//! Issues and verifies the signed bearer tokens that carry a user's identity
//! between requests. Tokens are HS256 JWTs with the claims
//! `{ "userId": <id>, "iat": <secs>, "exp": <secs> }`.
//!
//! Verification collapses every failure (bad encoding, wrong signature,
//! unsupported algorithm, expiry, missing claims) into `None`; callers only
//! learn that the token is not acceptable.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{AuthConfig, MAX_TOKEN_TTL_DAYS};

/// Claims embedded in every token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and checks user tokens with a process-wide HMAC secret
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a token service with an explicit secret and lifetime
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Create the service from configuration.
    ///
    /// Without a configured secret a random one is generated, which means
    /// tokens do not survive a restart.
    pub fn from_config(config: &AuthConfig) -> Self {
        let secret = match config.jwt_secret.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => secret.to_string(),
            None => {
                tracing::warn!(
                    "auth.jwt_secret is not set; using a random secret, tokens will not survive a restart"
                );
                random_hex_64()
            }
        };
        let ttl = if (1..=MAX_TOKEN_TTL_DAYS).contains(&config.token_ttl_days) {
            Duration::days(config.token_ttl_days)
        } else {
            tracing::warn!(
                "auth.token_ttl_days = {} is out of range; using 30 days",
                config.token_ttl_days
            );
            Duration::days(30)
        };
        Self::new(secret.as_bytes(), ttl)
    }

    /// Token lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `user_id` valid from now
    pub fn issue(&self, user_id: i64) -> Result<String> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issue a token as if it had been created at `issued_at`
    pub fn issue_at(&self, user_id: i64, issued_at: DateTime<Utc>) -> Result<String> {
        if self.ttl <= Duration::zero() {
            bail!("Token lifetime must be positive");
        }
        let expires = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| anyhow!("Token expiry out of range"))?;

        let claims = Claims {
            user_id,
            iat: issued_at.timestamp(),
            exp: expires.timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to sign token")
    }

    /// Return the subject of a valid, unexpired token
    pub fn verify(&self, token: &str) -> Option<i64> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .ok()
            .map(|data| data.claims.user_id)
    }
}

/// 64 hex characters from two random v4 UUIDs
fn random_hex_64() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Generate an opaque single-use password reset token (64 hex characters)
pub fn generate_reset_token() -> String {
    random_hex_64()
}
