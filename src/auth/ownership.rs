//! Ownership guard, written once and parametrized by resource kind

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    models::resource::OwnedResource,
    repository::ResourceStore,
};
use axum::{
    extract::{FromRequestParts, Path, Request, State},
    middleware::Next,
    response::Response,
};
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

/// A resource the caller has been confirmed to own, attached to the request by [`require_owner`]
#[derive(Debug, Clone)]
pub struct Owned<R>(pub R);

impl<S, R> FromRequestParts<S> for Owned<R>
where
    S: Send + Sync,
    R: OwnedResource,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Owned<R>>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("user is not authorized to do this operation"))
    }
}

pub struct OwnershipGuard<R: OwnedResource> {
    store: Arc<dyn ResourceStore<R>>,
}

impl<R: OwnedResource> Clone for OwnershipGuard<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<R: OwnedResource> OwnershipGuard<R> {
    pub fn new(store: Arc<dyn ResourceStore<R>>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ResourceStore<R>> {
        &self.store
    }

    /// Resolve `raw_id` and confirm `caller` owns it.
    pub async fn authorize(&self, raw_id: &str, caller: &AuthContext) -> Result<R, AppError> {
        let id = Uuid::parse_str(raw_id)
            .map_err(|_| AppError::BadRequest(format!("Invalid {}Id", R::KIND)))?;

        let resource = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} not found", R::KIND)))?;

        if resource.owner() != caller.identity_id() {
            tracing::warn!(
                kind = %R::KIND,
                resource_id = %id,
                identity_id = %caller.identity_id(),
                "Ownership check failed"
            );
            return Err(AppError::unauthorized(
                "user is not authorized to do this operation",
            ));
        }

        Ok(resource)
    }
}

/// Middleware: must run behind [`require_auth`](crate::auth::middleware::require_auth)
pub async fn require_owner<R: OwnedResource>(
    State(guard): State<OwnershipGuard<R>>,
    Path(params): Path<HashMap<String, String>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller = req
        .extensions()
        .get::<AuthContext>()
        .cloned()
        .ok_or_else(|| AppError::unauthorized("unauthorized request"))?;

    let raw_id = params
        .get(R::ID_PARAM)
        .ok_or_else(|| AppError::BadRequest(format!("{} is required", R::ID_PARAM)))?;

    let resource = guard.authorize(raw_id, &caller).await?;
    req.extensions_mut().insert(Owned(resource));

    Ok(next.run(req).await)
}
