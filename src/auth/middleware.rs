//! 认证中间件：校验访问令牌并把调用者身份附加到请求扩展

use crate::{
    auth::{
        cookie::{get_cookie, ACCESS_COOKIE_NAME},
        jwt::TokenCodec,
    },
    error::AppError,
    models::identity::PublicIdentity,
    repository::CredentialStore,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

/// 认证上下文（附加到请求扩展）
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub identity: PublicIdentity,
}

impl AuthContext {
    pub fn identity_id(&self) -> Uuid {
        self.identity.id
    }
}

// 实现 FromRequestParts 以便在 handler 中直接提取 AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("unauthorized request"))
    }
}

/// 提取访问令牌：优先使用 accessToken Cookie，没有 Cookie 时才读取 Authorization 头
pub fn extract_token(headers: &HeaderMap) -> Result<String, AppError> {
    if let Some(token) = get_cookie(headers, ACCESS_COOKIE_NAME) {
        return Ok(token.to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::unauthorized("unauthorized request"))
}

/// 认证守卫：访问令牌 + 身份仍然存在
#[derive(Clone)]
pub struct AuthGuard {
    store: Arc<dyn CredentialStore>,
    tokens: Arc<TokenCodec>,
}

impl AuthGuard {
    pub fn new(store: Arc<dyn CredentialStore>, tokens: Arc<TokenCodec>) -> Self {
        Self { store, tokens }
    }

    /// 解析调用者身份；不读取保存的刷新令牌，登出后的访问令牌在过期前仍然有效
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, AppError> {
        let token = extract_token(headers)?;

        let claims = self.tokens.verify_access(&token).map_err(|e| {
            tracing::debug!(reason = %e, "Access token rejected");
            AppError::from(e)
        })?;

        let identity_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthorized("invalid access token"))?;

        let identity = self
            .store
            .find_by_id(identity_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("invalid access token"))?;

        Ok(AuthContext {
            identity: PublicIdentity::from(identity),
        })
    }
}

/// 认证中间件 - 必须认证
pub async fn require_auth(
    State(guard): State<AuthGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_context = guard.authenticate(req.headers()).await?;

    // 附加到请求扩展
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
