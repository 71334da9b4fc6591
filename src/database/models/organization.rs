use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::database::models::{missing_fields, Aco, Saving, Workshop};
use crate::database::resource::Resource;
use crate::error::ApiError;

/// Summary shape: persisted fields plus the two derived aggregates, computed
/// fresh on every read by correlated subqueries.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub hq_address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub acos_count: i64,
    pub total_savings: Decimal,
}

/// Detail shape: summary plus the full related collections
#[derive(Debug, Serialize)]
pub struct OrganizationDetail {
    #[serde(flatten)]
    pub summary: Organization,
    pub acos: Vec<Aco>,
    pub savings: Vec<Saving>,
    pub workshops: Vec<Workshop>,
}

impl OrganizationDetail {
    pub async fn fetch(pool: &PgPool, id: i64) -> Result<Self, ApiError> {
        let summary = Organization::fetch_one(pool, id).await?;
        let acos = Aco::for_organization(pool, id).await?;
        let savings = Saving::for_organization(pool, id).await?;
        let workshops = Workshop::for_organization(pool, id).await?;
        Ok(Self {
            summary,
            acos,
            savings,
            workshops,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OrganizationPayload {
    pub name: Option<String>,
    pub hq_address: Option<String>,
}

const SUMMARY_SELECT: &str = "SELECT o.id, o.name, o.hq_address, o.created_at, o.updated_at, \
     (SELECT COUNT(*) FROM acos a WHERE a.organization_id = o.id) AS acos_count, \
     (SELECT COALESCE(SUM(s.amount), 0) FROM savings s WHERE s.organization_id = o.id) AS total_savings \
     FROM organizations o";

#[async_trait]
impl Resource for Organization {
    const TABLE: &'static str = "organizations";
    const NAME: &'static str = "organization";
    type Payload = OrganizationPayload;

    fn select_sql() -> String {
        format!("{} ORDER BY o.id", SUMMARY_SELECT)
    }

    fn select_one_sql() -> String {
        format!("{} WHERE o.id = $1", SUMMARY_SELECT)
    }

    async fn insert(pool: &PgPool, payload: Self::Payload) -> Result<i64, ApiError> {
        let (name, hq_address) = match (payload.name, payload.hq_address) {
            (Some(name), Some(hq_address)) => (name, hq_address),
            (name, hq_address) => {
                return Err(missing_fields(&[
                    ("name", name.is_none()),
                    ("hq_address", hq_address.is_none()),
                ]))
            }
        };

        let (id,): (i64,) =
            sqlx::query_as("INSERT INTO organizations (name, hq_address) VALUES ($1, $2) RETURNING id")
                .bind(name)
                .bind(hq_address)
                .fetch_one(pool)
                .await?;
        Ok(id)
    }

    async fn update(pool: &PgPool, id: i64, payload: Self::Payload) -> Result<bool, ApiError> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE organizations SET updated_at = now()");
        if let Some(name) = payload.name {
            query.push(", name = ").push_bind(name);
        }
        if let Some(hq_address) = payload.hq_address {
            query.push(", hq_address = ").push_bind(hq_address);
        }
        query.push(" WHERE id = ").push_bind(id);

        let result = query.build().execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
