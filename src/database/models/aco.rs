use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::database::models::{double_option, missing_fields};
use crate::database::resource::Resource;
use crate::error::ApiError;

/// Wire shape carries `program_name` resolved through the Program relationship;
/// it is not a stored column.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Aco {
    pub id: i64,
    pub name: String,
    #[serde(rename = "organization")]
    pub organization_id: i64,
    #[serde(rename = "program")]
    pub program_id: Option<i64>,
    pub program_name: Option<String>,
    pub projected_savings: Option<Decimal>,
    pub score: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AcoPayload {
    pub name: Option<String>,
    pub organization: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub program: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub projected_savings: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub score: Option<Option<String>>,
}

const ACO_SELECT: &str = "SELECT a.id, a.name, a.organization_id, a.program_id, \
     p.name AS program_name, a.projected_savings, a.score, a.created_at, a.updated_at \
     FROM acos a LEFT JOIN programs p ON p.id = a.program_id";

impl Aco {
    pub async fn for_organization(pool: &PgPool, organization_id: i64) -> Result<Vec<Self>, ApiError> {
        Ok(sqlx::query_as::<_, Self>(&format!(
            "{} WHERE a.organization_id = $1 ORDER BY a.id",
            ACO_SELECT
        ))
        .bind(organization_id)
        .fetch_all(pool)
        .await?)
    }
}

#[async_trait]
impl Resource for Aco {
    const TABLE: &'static str = "acos";
    const NAME: &'static str = "ACO";
    type Payload = AcoPayload;

    fn select_sql() -> String {
        format!("{} ORDER BY a.id", ACO_SELECT)
    }

    fn select_one_sql() -> String {
        format!("{} WHERE a.id = $1", ACO_SELECT)
    }

    async fn insert(pool: &PgPool, payload: Self::Payload) -> Result<i64, ApiError> {
        let (name, organization) = match (payload.name, payload.organization) {
            (Some(name), Some(organization)) => (name, organization),
            (name, organization) => {
                return Err(missing_fields(&[
                    ("name", name.is_none()),
                    ("organization", organization.is_none()),
                ]))
            }
        };

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO acos (name, organization_id, program_id, projected_savings, score) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(name)
        .bind(organization)
        .bind(payload.program.flatten())
        .bind(payload.projected_savings.flatten())
        .bind(payload.score.flatten())
        .fetch_one(pool)
        .await?;
        Ok(id)
    }

    async fn update(pool: &PgPool, id: i64, payload: Self::Payload) -> Result<bool, ApiError> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE acos SET updated_at = now()");
        if let Some(name) = payload.name {
            query.push(", name = ").push_bind(name);
        }
        if let Some(organization) = payload.organization {
            query.push(", organization_id = ").push_bind(organization);
        }
        if let Some(program) = payload.program {
            query.push(", program_id = ").push_bind(program);
        }
        if let Some(projected_savings) = payload.projected_savings {
            query.push(", projected_savings = ").push_bind(projected_savings);
        }
        if let Some(score) = payload.score {
            query.push(", score = ").push_bind(score);
        }
        query.push(" WHERE id = ").push_bind(id);

        let result = query.build().execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
