use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::database::models::missing_fields;
use crate::database::resource::Resource;
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Workshop {
    pub id: i64,
    #[serde(rename = "organization")]
    pub organization_id: i64,
    pub title: String,
    pub value: Decimal,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkshopPayload {
    pub organization: Option<i64>,
    pub title: Option<String>,
    pub value: Option<Decimal>,
    pub date: Option<NaiveDate>,
}

impl Workshop {
    pub async fn for_organization(pool: &PgPool, organization_id: i64) -> Result<Vec<Self>, ApiError> {
        Ok(sqlx::query_as::<_, Self>(
            "SELECT * FROM workshops WHERE organization_id = $1 ORDER BY id",
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await?)
    }
}

#[async_trait]
impl Resource for Workshop {
    const TABLE: &'static str = "workshops";
    const NAME: &'static str = "workshop";
    type Payload = WorkshopPayload;

    async fn insert(pool: &PgPool, payload: Self::Payload) -> Result<i64, ApiError> {
        let (organization, title, value, date) = match (
            payload.organization,
            payload.title,
            payload.value,
            payload.date,
        ) {
            (Some(organization), Some(title), Some(value), Some(date)) => {
                (organization, title, value, date)
            }
            (organization, title, value, date) => {
                return Err(missing_fields(&[
                    ("organization", organization.is_none()),
                    ("title", title.is_none()),
                    ("value", value.is_none()),
                    ("date", date.is_none()),
                ]))
            }
        };

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO workshops (organization_id, title, value, date) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(organization)
        .bind(title)
        .bind(value)
        .bind(date)
        .fetch_one(pool)
        .await?;
        Ok(id)
    }

    async fn update(pool: &PgPool, id: i64, payload: Self::Payload) -> Result<bool, ApiError> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE workshops SET updated_at = now()");
        if let Some(organization) = payload.organization {
            query.push(", organization_id = ").push_bind(organization);
        }
        if let Some(title) = payload.title {
            query.push(", title = ").push_bind(title);
        }
        if let Some(value) = payload.value {
            query.push(", value = ").push_bind(value);
        }
        if let Some(date) = payload.date {
            query.push(", date = ").push_bind(date);
        }
        query.push(" WHERE id = ").push_bind(id);

        let result = query.build().execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
