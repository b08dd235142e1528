//! 认证服务：注册、登录、令牌刷新、登出、修改密码

use crate::{
    auth::{jwt::TokenCodec, password::PasswordHasher},
    error::AppError,
    models::{
        auth::{ChangePasswordRequest, LoginRequest, LoginResponse, TokenPair},
        identity::{normalize_handle, Identity, NewIdentity, PublicIdentity, RegisterRequest},
    },
    repository::CredentialStore,
};
use std::sync::Arc;
use uuid::Uuid;

/// Policy applied when an account's password changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordChangePolicy {
    /// Keep the stored refresh token; the current session survives
    PreserveSession,
    /// Clear the stored refresh token together with the new hash
    RevokeSession,
}

impl PasswordChangePolicy {
    pub fn from_flag(revoke_sessions_on_password_change: bool) -> Self {
        if revoke_sessions_on_password_change {
            PasswordChangePolicy::RevokeSession
        } else {
            PasswordChangePolicy::PreserveSession
        }
    }
}

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    tokens: Arc<TokenCodec>,
    hasher: Arc<PasswordHasher>,
    password_change_policy: PasswordChangePolicy,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        tokens: Arc<TokenCodec>,
        hasher: Arc<PasswordHasher>,
        password_change_policy: PasswordChangePolicy,
    ) -> Self {
        Self {
            store,
            tokens,
            hasher,
            password_change_policy,
        }
    }

    /// 注册新用户
    pub async fn register(&self, req: RegisterRequest) -> Result<PublicIdentity, AppError> {
        if [&req.username, &req.email, &req.full_name, &req.password]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(AppError::bad_request("All fields are required"));
        }

        let username = normalize_handle(&req.username);
        let email = normalize_handle(&req.email);

        if self
            .store
            .find_by_username_or_email(Some(&username), Some(&email))
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "User with email or username already exists".to_string(),
            ));
        }

        let password_hash = self.hasher.hash(&req.password)?;

        let identity = self
            .store
            .insert(&NewIdentity {
                username,
                email,
                full_name: req.full_name.trim().to_string(),
                password_hash,
            })
            .await?;

        tracing::info!(identity_id = %identity.id, "Identity registered");

        Ok(PublicIdentity::from(identity))
    }

    /// 用户登录：校验凭据并轮换刷新令牌
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        let username = non_blank(req.username.as_deref()).map(normalize_handle);
        let email = non_blank(req.email.as_deref()).map(normalize_handle);

        if username.is_none() && email.is_none() {
            return Err(AppError::bad_request("username or email is required"));
        }
        let password = req
            .password
            .ok_or_else(|| AppError::bad_request("password is required"))?;

        let identity = self
            .store
            .find_by_username_or_email(username.as_deref(), email.as_deref())
            .await?
            .ok_or_else(|| AppError::not_found("user does not exist"))?;

        if !self.hasher.verify(&password, &identity.password_hash)? {
            tracing::info!(identity_id = %identity.id, "Login rejected: bad credentials");
            return Err(AppError::unauthorized("invalid user credentials"));
        }

        let pair = self.mint_pair(&identity)?;

        // 覆盖保存的刷新令牌，之前登录签发的令牌随即失效
        if !self
            .store
            .set_refresh_token(identity.id, Some(&pair.refresh_token))
            .await?
        {
            return Err(AppError::not_found("user does not exist"));
        }

        tracing::info!(identity_id = %identity.id, "Login succeeded");

        Ok(LoginResponse {
            user: PublicIdentity::from(identity),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in: pair.expires_in,
        })
    }

    /// 刷新令牌：只接受当前保存的那一个刷新令牌
    pub async fn refresh(&self, presented: Option<&str>) -> Result<TokenPair, AppError> {
        let presented = non_blank(presented)
            .ok_or_else(|| AppError::unauthorized("unauthorized request"))?;

        let claims = self.tokens.verify_refresh(presented).map_err(|e| {
            tracing::info!(reason = %e, "Refresh rejected: token verification failed");
            AppError::from(e)
        })?;

        let identity_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthorized("invalid refresh token"))?;

        let identity = self
            .store
            .find_by_id(identity_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("invalid refresh token"))?;

        if identity.refresh_token.as_deref() != Some(presented) {
            tracing::warn!(%identity_id, "Refresh rejected: token is not the current one");
            return Err(AppError::unauthorized("refresh token is expired or used"));
        }

        let pair = self.mint_pair(&identity)?;

        if !self
            .store
            .rotate_refresh_token(identity_id, presented, &pair.refresh_token)
            .await?
        {
            tracing::warn!(%identity_id, "Refresh rejected: lost rotation race");
            return Err(AppError::unauthorized("refresh token is expired or used"));
        }

        tracing::debug!(%identity_id, "Refresh token rotated");

        Ok(pair)
    }

    /// 登出：清空保存的刷新令牌（幂等）
    pub async fn logout(&self, identity_id: Uuid) -> Result<(), AppError> {
        self.store.set_refresh_token(identity_id, None).await?;

        tracing::info!(%identity_id, "Logged out");
        Ok(())
    }

    /// 修改密码
    pub async fn change_password(
        &self,
        identity_id: Uuid,
        req: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        if req.new_password.is_empty() {
            return Err(AppError::bad_request("new password is required"));
        }

        let identity = self
            .store
            .find_by_id(identity_id)
            .await?
            .ok_or_else(|| AppError::not_found("user does not exist"))?;

        if !self.hasher.verify(&req.old_password, &identity.password_hash)? {
            return Err(AppError::bad_request("invalid old password"));
        }

        let password_hash = self.hasher.hash(&req.new_password)?;
        let revoke = self.password_change_policy == PasswordChangePolicy::RevokeSession;

        if !self
            .store
            .update_password_hash(identity_id, &password_hash, revoke)
            .await?
        {
            return Err(AppError::not_found("user does not exist"));
        }

        tracing::info!(%identity_id, sessions_revoked = revoke, "Password changed");
        Ok(())
    }

    fn mint_pair(&self, identity: &Identity) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.tokens.issue_access(identity)?,
            refresh_token: self.tokens.issue_refresh(identity.id)?,
            expires_in: self.tokens.access_exp_secs(),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
