//! 带属主资源的 HTTP 处理器（在所有权守卫之后运行）

use crate::{
    auth::ownership::{Owned, OwnershipGuard},
    error::AppError,
    models::resource::OwnedResource,
};
use axum::{extract::State, Json};

/// 删除资源，返回被删除的记录
pub async fn delete_owned<R: OwnedResource>(
    State(guard): State<OwnershipGuard<R>>,
    Owned(resource): Owned<R>,
) -> Result<Json<R>, AppError> {
    if !guard.store().delete(resource.id()).await? {
        return Err(AppError::NotFound(format!("{} not found", R::KIND)));
    }

    tracing::info!(kind = %R::KIND, resource_id = %resource.id(), "Resource deleted");

    Ok(Json(resource))
}
