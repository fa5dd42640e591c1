use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::row_parsers;
use crate::errors::AppError;
use crate::status::DefenseCommitteeStatus;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DefenseCommittee {
    pub id: Uuid,
    pub project_id: Option<Uuid>,
    #[schema(example = "Committee A - Spring")]
    pub name: String,
    pub defense_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub status: DefenseCommitteeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&SqliteRow> for DefenseCommittee {
    type Error = AppError;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        use sqlx::Row;

        Ok(DefenseCommittee {
            id: row_parsers::uuid(row, "id")?,
            project_id: row_parsers::opt_uuid(row, "project_id")?,
            name: row.try_get("name")?,
            defense_date: row_parsers::opt_datetime(row, "defense_date")?,
            location: row.try_get("location")?,
            status: row_parsers::parsed(row, "status")?,
            created_at: row_parsers::datetime(row, "created_at")?,
            updated_at: row_parsers::datetime(row, "updated_at")?,
        })
    }
}
