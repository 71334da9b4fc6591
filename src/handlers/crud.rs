//! Generic CRUD handlers, parameterized over the Resource trait. The router
//! instantiates these per entity; only ACO list and Organization retrieve
//! need bespoke handlers.

use axum::{extract::Path, Json};
use serde_json::Value;

use crate::database::{self, Resource};
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};

/// Deserialize the request body into the entity payload, surfacing type
/// mismatches as a 400 rather than a transport-level rejection.
pub(crate) fn parse_payload<R: Resource>(body: Value) -> Result<R::Payload, ApiError> {
    serde_json::from_value(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))
}

/// GET /{collection} - list all rows in id order
pub async fn list<R: Resource>() -> ApiResult<Vec<R>> {
    let pool = database::pool().await?;
    let rows = R::fetch_all(&pool).await?;
    Ok(ApiResponse::success(rows))
}

/// GET /{collection}/:id - fetch one row
pub async fn retrieve<R: Resource>(Path(id): Path<i64>) -> ApiResult<R> {
    let pool = database::pool().await?;
    let row = R::fetch_one(&pool, id).await?;
    Ok(ApiResponse::success(row))
}

/// POST /{collection} - validate, insert, and return the persisted row
pub async fn create<R: Resource>(Json(body): Json<Value>) -> ApiResult<R> {
    let payload = parse_payload::<R>(body)?;
    let pool = database::pool().await?;
    let id = R::insert(&pool, payload).await?;
    let row = R::fetch_one(&pool, id).await?;
    Ok(ApiResponse::created(row))
}

/// PUT/PATCH /{collection}/:id - apply supplied fields and return the row
pub async fn update<R: Resource>(Path(id): Path<i64>, Json(body): Json<Value>) -> ApiResult<R> {
    let payload = parse_payload::<R>(body)?;
    let pool = database::pool().await?;
    if !R::update(&pool, id, payload).await? {
        return Err(ApiError::not_found(format!("{} {} not found", R::NAME, id)));
    }
    let row = R::fetch_one(&pool, id).await?;
    Ok(ApiResponse::success(row))
}

/// DELETE /{collection}/:id - remove the row (cascades per schema)
pub async fn destroy<R: Resource>(Path(id): Path<i64>) -> ApiResult<()> {
    let pool = database::pool().await?;
    R::delete(&pool, id).await?;
    Ok(ApiResponse::<()>::no_content())
}
