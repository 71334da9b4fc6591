use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::database::models::{double_option, missing_fields};
use crate::database::resource::Resource;
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Program {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProgramPayload {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

#[async_trait]
impl Resource for Program {
    const TABLE: &'static str = "programs";
    const NAME: &'static str = "program";
    type Payload = ProgramPayload;

    async fn insert(pool: &PgPool, payload: Self::Payload) -> Result<i64, ApiError> {
        let Some(name) = payload.name else {
            return Err(missing_fields(&[("name", true)]));
        };

        let (id,): (i64,) =
            sqlx::query_as("INSERT INTO programs (name, description) VALUES ($1, $2) RETURNING id")
                .bind(name)
                .bind(payload.description.flatten())
                .fetch_one(pool)
                .await?;
        Ok(id)
    }

    async fn update(pool: &PgPool, id: i64, payload: Self::Payload) -> Result<bool, ApiError> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE programs SET updated_at = now()");
        if let Some(name) = payload.name {
            query.push(", name = ").push_bind(name);
        }
        if let Some(description) = payload.description {
            query.push(", description = ").push_bind(description);
        }
        query.push(" WHERE id = ").push_bind(id);

        let result = query.build().execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
