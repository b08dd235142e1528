//! 认证相关的 HTTP 处理器

use crate::{
    auth::{
        cookie::{
            cleared_cookie, get_cookie, session_cookie, ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME,
        },
        middleware::AuthContext,
    },
    error::AppError,
    middleware::SharedState,
    models::{
        auth::{ChangePasswordRequest, LoginRequest, RefreshTokenRequest, TokenPair},
        identity::RegisterRequest,
    },
};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use serde_json::json;

/// 注册
pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let identity = state.auth_service.register(req).await?;

    Ok((StatusCode::CREATED, Json(identity)))
}

/// 登录
pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.login(req).await?;

    let cookies = session_cookies(
        &state,
        &TokenPair {
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.clone(),
            expires_in: response.expires_in,
        },
    )?;

    Ok((cookies, Json(response)))
}

/// 刷新令牌：Cookie 优先，其次请求体中的 refreshToken
pub async fn refresh_token(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let presented = match get_cookie(&headers, REFRESH_COOKIE_NAME) {
        Some(token) => Some(token.to_string()),
        None if body.is_empty() => None,
        // 无法解析的请求体等同于未提供令牌
        None => serde_json::from_slice::<RefreshTokenRequest>(&body)
            .ok()
            .and_then(|req| req.refresh_token),
    };

    let pair = state.auth_service.refresh(presented.as_deref()).await?;
    let cookies = session_cookies(&state, &pair)?;

    Ok((cookies, Json(pair)))
}

/// 登出
pub async fn logout(
    State(state): State<SharedState>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.logout(auth_context.identity_id()).await?;

    let secure = state.config.security.cookie_secure;
    let cookies = AppendHeaders([
        (header::SET_COOKIE, cleared_cookie(ACCESS_COOKIE_NAME, secure)),
        (header::SET_COOKIE, cleared_cookie(REFRESH_COOKIE_NAME, secure)),
    ]);

    Ok((cookies, Json(json!({"message": "user logged out"}))))
}

/// 修改密码
pub async fn change_password(
    State(state): State<SharedState>,
    auth_context: AuthContext,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .auth_service
        .change_password(auth_context.identity_id(), req)
        .await?;

    Ok(Json(json!({"message": "password changed successfully"})))
}

/// 获取当前用户信息
pub async fn get_current_user(auth_context: AuthContext) -> Result<impl IntoResponse, AppError> {
    Ok(Json(auth_context.identity))
}

fn session_cookies(
    state: &SharedState,
    pair: &TokenPair,
) -> Result<AppendHeaders<[(header::HeaderName, HeaderValue); 2]>, AppError> {
    let secure = state.config.security.cookie_secure;
    let access_max_age = state.config.security.access_token_exp_secs;
    let refresh_max_age = state.config.security.refresh_token_exp_secs;

    Ok(AppendHeaders([
        (
            header::SET_COOKIE,
            session_cookie(ACCESS_COOKIE_NAME, &pair.access_token, access_max_age, secure)?,
        ),
        (
            header::SET_COOKIE,
            session_cookie(REFRESH_COOKIE_NAME, &pair.refresh_token, refresh_max_age, secure)?,
        ),
    ]))
}
