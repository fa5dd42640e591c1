use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::row_parsers;
use crate::errors::AppError;
use crate::status::ProjectStatus;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Project {
    pub id: Uuid,
    pub field_pool_id: Option<Uuid>,
    pub title: String,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&SqliteRow> for Project {
    type Error = AppError;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        use sqlx::Row;

        Ok(Project {
            id: row_parsers::uuid(row, "id")?,
            field_pool_id: row_parsers::opt_uuid(row, "field_pool_id")?,
            title: row.try_get("title")?,
            status: row_parsers::parsed(row, "status")?,
            created_at: row_parsers::datetime(row, "created_at")?,
            updated_at: row_parsers::datetime(row, "updated_at")?,
        })
    }
}

/// One row of `project_members`: exactly the student or the faculty member
/// column identifies the member.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProjectMember {
    pub id: Uuid,
    pub student_id: Option<Uuid>,
    pub faculty_member_id: Option<Uuid>,
    #[schema(example = "ADVISOR")]
    pub role: String,
}

impl TryFrom<&SqliteRow> for ProjectMember {
    type Error = AppError;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        use sqlx::Row;

        Ok(ProjectMember {
            id: row_parsers::uuid(row, "id")?,
            student_id: row_parsers::opt_uuid(row, "student_id")?,
            faculty_member_id: row_parsers::opt_uuid(row, "faculty_member_id")?,
            role: row.try_get("role")?,
        })
    }
}

/// Project loaded together with its membership list.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProjectWithMembers {
    #[serde(flatten)]
    pub project: Project,
    pub members: Vec<ProjectMember>,
}

impl ProjectWithMembers {
    pub fn has_student(&self, student_id: Uuid) -> bool {
        self.members.iter().any(|m| m.student_id == Some(student_id))
    }

    pub fn has_faculty_member(&self, faculty_member_id: Uuid) -> bool {
        self.members
            .iter()
            .any(|m| m.faculty_member_id == Some(faculty_member_id))
    }
}
