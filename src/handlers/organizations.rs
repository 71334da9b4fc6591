use axum::extract::Path;

use crate::database::{self, models::OrganizationDetail};
use crate::middleware::response::{ApiResponse, ApiResult};

/// GET /organizations/:id - the one action that returns the detail shape.
/// Every other organization action goes through the generic handlers and
/// returns the summary shape.
pub async fn retrieve(Path(id): Path<i64>) -> ApiResult<OrganizationDetail> {
    let pool = database::pool().await?;
    let detail = OrganizationDetail::fetch(&pool, id).await?;
    Ok(ApiResponse::success(detail))
}
