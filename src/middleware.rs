//! HTTP 中间件
//! 应用状态与请求追踪

use axum::{extract::Request, http::HeaderMap, http::HeaderValue, middleware::Next, response::Response};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    auth::{AuthGuard, OwnershipGuard, PasswordHasher, TokenCodec},
    config::AppConfig,
    error::AppError,
    models::resource::{Comment, Playlist, Video},
    repository::{CredentialStore, ResourceStore},
    services::{AuthService, PasswordChangePolicy},
};

/// 应用状态
///
/// 存储与令牌编解码器都以 trait 对象/Arc 共享，Clone 成本低廉
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub auth_service: Arc<AuthService>,
    pub auth_guard: AuthGuard,
    pub comments: OwnershipGuard<Comment>,
    pub videos: OwnershipGuard<Video>,
    pub playlists: OwnershipGuard<Playlist>,
}

impl AppState {
    /// 由配置和各类存储组装出服务与守卫
    pub fn new(
        config: AppConfig,
        identities: Arc<dyn CredentialStore>,
        comments: Arc<dyn ResourceStore<Comment>>,
        videos: Arc<dyn ResourceStore<Video>>,
        playlists: Arc<dyn ResourceStore<Playlist>>,
    ) -> Result<Self, AppError> {
        let tokens = Arc::new(TokenCodec::from_config(&config.security)?);
        let hasher = Arc::new(PasswordHasher::from_config(&config.security)?);

        let auth_service = Arc::new(AuthService::new(
            identities.clone(),
            tokens.clone(),
            hasher,
            PasswordChangePolicy::from_flag(config.security.revoke_sessions_on_password_change),
        ));

        Ok(Self {
            auth_guard: AuthGuard::new(identities, tokens),
            auth_service,
            comments: OwnershipGuard::new(comments),
            videos: OwnershipGuard::new(videos),
            playlists: OwnershipGuard::new(playlists),
            config,
        })
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().clone();
    let uri = req.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        // 指标标签只使用有限取值
        let method_name = match method.as_str() {
            "GET" => "GET",
            "POST" => "POST",
            "PUT" => "PUT",
            "PATCH" => "PATCH",
            "DELETE" => "DELETE",
            _ => "OTHER",
        };
        let status_class = match status {
            200..=299 => "2xx",
            400 => "400",
            401 => "401",
            404 => "404",
            409 => "409",
            400..=499 => "4xx",
            _ => "5xx",
        };

        metrics::counter!("http_requests_total", "method" => method_name, "status" => status_class)
            .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            status = status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// 共享状态的便捷别名
pub type SharedState = Arc<AppState>;
