//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{
    auth::{middleware::require_auth, ownership::require_owner, AuthGuard, OwnershipGuard},
    handlers,
    middleware::SharedState,
    models::resource::OwnedResource,
};

const MAX_BODY_BYTES: usize = 64 * 1024;

/// 创建应用路由
pub fn create_router(state: SharedState) -> Router {
    // 公开端点
    let public_routes = Router::new()
        .route("/api/v1/users/register", post(handlers::auth::register))
        .route("/api/v1/users/login", post(handlers::auth::login))
        .route("/api/v1/users/refresh-token", post(handlers::auth::refresh_token));

    // 需要认证的路由
    let authenticated_routes = Router::new()
        .route("/api/v1/users/logout", post(handlers::auth::logout))
        .route("/api/v1/users/change-password", post(handlers::auth::change_password))
        .route("/api/v1/users/current-user", get(handlers::auth::get_current_user))
        .route_layer(from_fn_with_state(state.auth_guard.clone(), require_auth));

    // 需要认证且校验资源属主的路由
    let owned_routes = Router::new()
        .nest(
            "/api/v1/comments",
            owned_resource_routes(state.comments.clone(), state.auth_guard.clone()),
        )
        .nest(
            "/api/v1/videos",
            owned_resource_routes(state.videos.clone(), state.auth_guard.clone()),
        )
        .nest(
            "/api/v1/playlists",
            owned_resource_routes(state.playlists.clone(), state.auth_guard.clone()),
        );

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(owned_routes)
        // 认证请求体都很小
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}

/// 单一资源类型的路由：认证守卫在外层，所有权守卫在内层
fn owned_resource_routes<R, S>(guard: OwnershipGuard<R>, auth_guard: AuthGuard) -> Router<S>
where
    R: OwnedResource,
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route(
            &format!("/{{{}}}", R::ID_PARAM),
            delete(handlers::resource::delete_owned::<R>),
        )
        .route_layer(from_fn_with_state(guard.clone(), require_owner::<R>))
        .route_layer(from_fn_with_state(auth_guard, require_auth))
        .with_state(guard)
}
