use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::UserType;
use crate::db::row_parsers;
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub project_id: Uuid,
    pub author_id: Uuid,
    pub author_type: UserType,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&SqliteRow> for Comment {
    type Error = AppError;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        use sqlx::Row;

        Ok(Comment {
            id: row_parsers::uuid(row, "id")?,
            project_id: row_parsers::uuid(row, "project_id")?,
            author_id: row_parsers::uuid(row, "author_id")?,
            author_type: row_parsers::parsed(row, "author_type")?,
            content: row.try_get("content")?,
            created_at: row_parsers::datetime(row, "created_at")?,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentCreateRequest {
    #[schema(example = "Please expand the related-work section before the next review.")]
    pub content: String,
}
