use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};

use crate::error::ApiError;

/// One managed entity: a table, its wire row shape, and its write paths.
///
/// The row struct implementing this trait IS the serialized form, so list and
/// retrieve are fully generic; create and update differ per entity (required
/// fields, column lists) and are supplied by the implementor.
#[async_trait]
pub trait Resource:
    Sized + Serialize + Send + Unpin + for<'r> FromRow<'r, PgRow> + 'static
{
    const TABLE: &'static str;

    /// Singular name used in client-facing messages
    const NAME: &'static str;

    /// Create/update payload; Option-valued fields so the same shape serves
    /// full creates and partial updates
    type Payload: DeserializeOwned + Send;

    /// SELECT producing the wire shape for all rows, in id order
    fn select_sql() -> String {
        format!("SELECT * FROM {} ORDER BY id", Self::TABLE)
    }

    /// SELECT producing the wire shape for one row, bound to $1 = id
    fn select_one_sql() -> String {
        format!("SELECT * FROM {} WHERE id = $1", Self::TABLE)
    }

    /// Validate required fields and insert; returns the new row id
    async fn insert(pool: &PgPool, payload: Self::Payload) -> Result<i64, ApiError>;

    /// Apply whichever fields the payload supplies; Ok(false) when id is unknown
    async fn update(pool: &PgPool, id: i64, payload: Self::Payload) -> Result<bool, ApiError>;

    async fn fetch_all(pool: &PgPool) -> Result<Vec<Self>, ApiError> {
        Ok(sqlx::query_as::<_, Self>(&Self::select_sql())
            .fetch_all(pool)
            .await?)
    }

    async fn fetch_one(pool: &PgPool, id: i64) -> Result<Self, ApiError> {
        sqlx::query_as::<_, Self>(&Self::select_one_sql())
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("{} {} not found", Self::NAME, id)))
    }

    async fn delete(pool: &PgPool, id: i64) -> Result<(), ApiError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", Self::TABLE))
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found(format!(
                "{} {} not found",
                Self::NAME,
                id
            )));
        }
        Ok(())
    }
}
