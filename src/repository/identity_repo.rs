//! Identity repository (数据库访问层)

use crate::{
    error::AppError,
    models::identity::{Identity, NewIdentity},
};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Persisted identity lookup and update.
///
/// Every write is a single statement so each session operation commits atomically.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find an identity whose username or email matches; `None` arguments never match.
    ///
    /// When the username and the email resolve to different identities, the username match wins.
    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<Identity>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, AppError>;

    /// Insert a new identity; a taken username or email is `Conflict`
    async fn insert(&self, identity: &NewIdentity) -> Result<Identity, AppError>;

    /// Replace the password hash, optionally clearing the stored refresh token in the same write
    async fn update_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
        clear_refresh_token: bool,
    ) -> Result<bool, AppError>;

    /// Unconditionally overwrite (or clear) the stored refresh token
    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<bool, AppError>;

    /// Replace the stored refresh token only if it still equals `expected`
    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        next: &str,
    ) -> Result<bool, AppError>;
}

pub struct IdentityRepository {
    db: PgPool,
}

impl IdentityRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for IdentityRepository {
    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<Identity>, AppError> {
        // 用户名命中优先于邮箱命中
        let identity = sqlx::query_as::<_, Identity>(
            r#"
            SELECT * FROM users
            WHERE username = $1 OR email = $2
            ORDER BY (username = $1) IS TRUE DESC
            LIMIT 1
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        Ok(identity)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, AppError> {
        let identity = sqlx::query_as::<_, Identity>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(identity)
    }

    async fn insert(&self, identity: &NewIdentity) -> Result<Identity, AppError> {
        let result = sqlx::query_as::<_, Identity>(
            r#"
            INSERT INTO users (id, username, email, full_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&identity.username)
        .bind(&identity.email)
        .bind(&identity.full_name)
        .bind(&identity.password_hash)
        .fetch_one(&self.db)
        .await;

        match result {
            Ok(identity) => Ok(identity),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
                "User with email or username already exists".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
        clear_refresh_token: bool,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET
                password_hash = $2,
                refresh_token = CASE WHEN $3 THEN NULL ELSE refresh_token END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .bind(clear_refresh_token)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(token)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        next: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token = $3, updated_at = NOW()
            WHERE id = $1 AND refresh_token = $2
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(next)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
