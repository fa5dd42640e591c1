use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::row_parsers;
use crate::errors::AppError;
use crate::status::FieldPoolStatus;

/// Research-domain grouping topics are registered under.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldPool {
    pub id: Uuid,
    #[schema(example = "Distributed Systems")]
    pub name: String,
    pub description: Option<String>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub status: FieldPoolStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&SqliteRow> for FieldPool {
    type Error = AppError;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        use sqlx::Row;

        Ok(FieldPool {
            id: row_parsers::uuid(row, "id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            registration_deadline: row_parsers::opt_datetime(row, "registration_deadline")?,
            status: row_parsers::parsed(row, "status")?,
            created_at: row_parsers::datetime(row, "created_at")?,
            updated_at: row_parsers::datetime(row, "updated_at")?,
        })
    }
}
