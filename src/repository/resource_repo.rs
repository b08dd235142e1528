//! Owned resource repository, one generic implementation for every kind

use crate::{error::AppError, models::resource::OwnedResource};
use async_trait::async_trait;
use sqlx::{postgres::PgRow, FromRow, PgPool};
use std::marker::PhantomData;
use uuid::Uuid;

/// Per-kind fetch capability used by the ownership guard
#[async_trait]
pub trait ResourceStore<R: OwnedResource>: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<R>, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

pub struct ResourceRepository<R> {
    db: PgPool,
    _kind: PhantomData<fn() -> R>,
}

impl<R> ResourceRepository<R> {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            _kind: PhantomData,
        }
    }
}

#[async_trait]
impl<R> ResourceStore<R> for ResourceRepository<R>
where
    R: OwnedResource + for<'r> FromRow<'r, PgRow> + Unpin,
{
    async fn find_by_id(&self, id: Uuid) -> Result<Option<R>, AppError> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", R::TABLE);
        let resource = sqlx::query_as::<_, R>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(resource)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", R::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(&self.db).await?;

        Ok(result.rows_affected() > 0)
    }
}
