//! Token service.
//!
//! Issues and verifies the two classes of signed, time-limited tokens:
//! short-lived access tokens and longer-lived refresh tokens. Each class is
//! signed with its own secret, so a leaked access token can never be
//! presented as a refresh token or vice versa. This service is stateless;
//! refresh-token revocation lives in the credential store.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::user::Role;

/// Access token claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Role at issue time; authorization re-checks the store where freshness
    /// matters
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Unique token id
    pub jti: Uuid,
}

/// Refresh token claims. Carries only the user identity.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    /// Unique token id; guarantees rotation yields a distinct token even
    /// within a single clock second
    pub jti: Uuid,
}

/// Access + refresh token pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Stateless JWT signer/verifier with independent access and refresh keys.
#[derive(Clone)]
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_expiry_minutes: i64,
    refresh_expiry_days: i64,
}

impl TokenService {
    /// Create a new token service from the configured secrets.
    pub fn new(config: &Config) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.jwt_access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.jwt_access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.jwt_refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.jwt_refresh_secret.as_bytes()),
            access_expiry_minutes: config.jwt_access_token_expiry_minutes,
            refresh_expiry_days: config.jwt_refresh_token_expiry_days,
        }
    }

    /// Refresh token lifetime in seconds; used for the cookie Max-Age.
    pub fn refresh_max_age_secs(&self) -> i64 {
        self.refresh_expiry_days * 24 * 60 * 60
    }

    /// Issue a signed access token for a user.
    pub fn issue_access_token(&self, user_id: Uuid, role: Role) -> Result<String> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: (now + Duration::minutes(self.access_expiry_minutes)).timestamp(),
            jti: Uuid::new_v4(),
        };

        encode(&Header::default(), &claims, &self.access_encoding)
            .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))
    }

    /// Issue a signed refresh token for a user.
    pub fn issue_refresh_token(&self, user_id: Uuid) -> Result<String> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + Duration::days(self.refresh_expiry_days)).timestamp(),
            jti: Uuid::new_v4(),
        };

        encode(&Header::default(), &claims, &self.refresh_encoding)
            .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))
    }

    /// Issue a fresh access+refresh pair.
    pub fn issue_pair(&self, user_id: Uuid, role: Role) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user_id, role)?,
            refresh_token: self.issue_refresh_token(user_id)?,
        })
    }

    /// Validate and decode an access token. Any failure (malformed, expired,
    /// wrong signature) is an `Authentication` error; callers treat it as a
    /// normal unauthenticated outcome, never as fatal.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims> {
        decode::<AccessClaims>(token, &self.access_decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| AppError::Authentication(format!("Invalid token: {}", e)))
    }

    /// Validate and decode a refresh token.
    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| AppError::Authentication(format!("Invalid token: {}", e)))
    }
}
