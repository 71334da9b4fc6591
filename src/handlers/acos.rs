use axum::extract::Query;
use serde::Deserialize;

use crate::database::{self, models::Aco, Resource};
use crate::middleware::response::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct AcoListQuery {
    /// Restrict results to one organization's ACOs; no other entity filters
    pub organization: Option<i64>,
}

/// GET /acos?organization={id} - list, optionally filtered by organization
pub async fn list(Query(query): Query<AcoListQuery>) -> ApiResult<Vec<Aco>> {
    let pool = database::pool().await?;
    let rows = match query.organization {
        Some(organization_id) => Aco::for_organization(&pool, organization_id).await?,
        None => Aco::fetch_all(&pool).await?,
    };
    Ok(ApiResponse::success(rows))
}
