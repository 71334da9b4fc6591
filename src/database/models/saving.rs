use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::database::models::missing_fields;
use crate::database::resource::Resource;
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Saving {
    pub id: i64,
    #[serde(rename = "organization")]
    pub organization_id: i64,
    pub amount: Decimal,
    pub year: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SavingPayload {
    pub organization: Option<i64>,
    pub amount: Option<Decimal>,
    pub year: Option<i32>,
}

impl Saving {
    pub async fn for_organization(pool: &PgPool, organization_id: i64) -> Result<Vec<Self>, ApiError> {
        Ok(sqlx::query_as::<_, Self>(
            "SELECT * FROM savings WHERE organization_id = $1 ORDER BY id",
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await?)
    }
}

#[async_trait]
impl Resource for Saving {
    const TABLE: &'static str = "savings";
    const NAME: &'static str = "saving";
    type Payload = SavingPayload;

    async fn insert(pool: &PgPool, payload: Self::Payload) -> Result<i64, ApiError> {
        let (organization, amount, year) = match (payload.organization, payload.amount, payload.year)
        {
            (Some(organization), Some(amount), Some(year)) => (organization, amount, year),
            (organization, amount, year) => {
                return Err(missing_fields(&[
                    ("organization", organization.is_none()),
                    ("amount", amount.is_none()),
                    ("year", year.is_none()),
                ]))
            }
        };

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO savings (organization_id, amount, year) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(organization)
        .bind(amount)
        .bind(year)
        .fetch_one(pool)
        .await?;
        Ok(id)
    }

    async fn update(pool: &PgPool, id: i64, payload: Self::Payload) -> Result<bool, ApiError> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE savings SET updated_at = now()");
        if let Some(organization) = payload.organization {
            query.push(", organization_id = ").push_bind(organization);
        }
        if let Some(amount) = payload.amount {
            query.push(", amount = ").push_bind(amount);
        }
        if let Some(year) = payload.year {
            query.push(", year = ").push_bind(year);
        }
        query.push(" WHERE id = ").push_bind(id);

        let result = query.build().execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
