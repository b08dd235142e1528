//! JWT token generation and validation
//! Access and refresh tokens are signed with independent keys and lifetimes

use crate::{config::SecurityConfig, error::AppError, models::identity::Identity};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Token kind, embedded in every token as `typ`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    /// Subject (identity ID)
    pub sub: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub typ: TokenKind,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Claims carried by refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject (identity ID)
    pub sub: String,
    pub typ: TokenKind,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Decoded claims of either kind
#[derive(Debug, Clone)]
pub enum Claims {
    Access(AccessClaims),
    Refresh(RefreshClaims),
}

impl Claims {
    pub fn identity_id(&self) -> &str {
        match self {
            Claims::Access(c) => &c.sub,
            Claims::Refresh(c) => &c.sub,
        }
    }
}

/// Why a presented token was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    BadSignature,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            _ => TokenError::Malformed,
        }
    }
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    exp_secs: u64,
}

impl SigningKeys {
    fn new(secret: &str, exp_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            exp_secs,
        }
    }
}

/// Signs and verifies access and refresh tokens
pub struct TokenCodec {
    access: SigningKeys,
    refresh: SigningKeys,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(
        access_secret: &str,
        access_exp_secs: u64,
        refresh_secret: &str,
        refresh_exp_secs: u64,
    ) -> Result<Self, AppError> {
        // Ensure secrets are at least 32 bytes for HS256
        if access_secret.len() < 32 || refresh_secret.len() < 32 {
            return Err(AppError::Config("Token secret too short (min 32 chars)".to_string()));
        }
        if access_secret == refresh_secret {
            return Err(AppError::Config(
                "Access and refresh tokens must use different secrets".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            access: SigningKeys::new(access_secret, access_exp_secs),
            refresh: SigningKeys::new(refresh_secret, refresh_exp_secs),
            validation,
        })
    }

    /// Create codec from config
    pub fn from_config(config: &SecurityConfig) -> Result<Self, AppError> {
        Self::new(
            config.access_token_secret.expose_secret(),
            config.access_token_exp_secs,
            config.refresh_token_secret.expose_secret(),
            config.refresh_token_exp_secs,
        )
    }

    /// Access token lifetime in seconds
    pub fn access_exp_secs(&self) -> u64 {
        self.access.exp_secs
    }

    /// Refresh token lifetime in seconds
    pub fn refresh_exp_secs(&self) -> u64 {
        self.refresh.exp_secs
    }

    /// Issue an access token for an identity
    pub fn issue_access(&self, identity: &Identity) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: identity.id.to_string(),
            username: identity.username.clone(),
            email: identity.email.clone(),
            full_name: identity.full_name.clone(),
            typ: TokenKind::Access,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.access.exp_secs as i64)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.access.encoding).map_err(|e| {
            tracing::error!(error = ?e.kind(), "Failed to encode access token");
            AppError::internal_error("Failed to encode access token")
        })
    }

    /// Issue a refresh token for an identity id
    pub fn issue_refresh(&self, identity_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: identity_id.to_string(),
            typ: TokenKind::Refresh,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.refresh.exp_secs as i64)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.refresh.encoding).map_err(|e| {
            tracing::error!(error = ?e.kind(), "Failed to encode refresh token");
            AppError::internal_error("Failed to encode refresh token")
        })
    }

    /// Verify a token of the given kind
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        match kind {
            TokenKind::Access => self.verify_access(token).map(Claims::Access),
            TokenKind::Refresh => self.verify_refresh(token).map(Claims::Refresh),
        }
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims =
            decode::<AccessClaims>(token, &self.access.decoding, &self.validation)?.claims;

        if claims.typ != TokenKind::Access {
            tracing::debug!(typ = ?claims.typ, "Token kind mismatch: expected access");
            return Err(TokenError::Malformed);
        }

        Ok(claims)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let claims =
            decode::<RefreshClaims>(token, &self.refresh.decoding, &self.validation)?.claims;

        if claims.typ != TokenKind::Refresh {
            tracing::debug!(typ = ?claims.typ, "Token kind mismatch: expected refresh");
            return Err(TokenError::Malformed);
        }

        Ok(claims)
    }
}
