//! Identity domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account record with credentials and session state.
///
/// Never serialized directly; use [`PublicIdentity`] for anything leaving the process.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    /// The single refresh token currently honoured for this account
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identity with secrets stripped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIdentity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Identity> for PublicIdentity {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            username: identity.username.clone(),
            email: identity.email.clone(),
            full_name: identity.full_name.clone(),
            created_at: identity.created_at,
        }
    }
}

impl From<Identity> for PublicIdentity {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            username: identity.username,
            email: identity.email,
            full_name: identity.full_name,
            created_at: identity.created_at,
        }
    }
}

/// Registration request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub password: String,
}

/// Normalized identity ready to be inserted
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
}

/// Usernames and emails are unique case-insensitively; they are stored trimmed and lowercased.
pub fn normalize_handle(raw: &str) -> String {
    raw.trim().to_lowercase()
}
