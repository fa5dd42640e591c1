//! Project comments and the membership check that guards them.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::authz::{AuthzMode, Identity, Role, UserType};
use crate::errors::{AppError, AppResult};
use crate::models::comment::Comment;
use crate::models::pagination::{PageQuery, Paginated};
use crate::models::project::{Project, ProjectMember, ProjectWithMembers};
use crate::utils::utc_now;

/// Faculty roles allowed to comment on projects they are not members of.
pub const SPECIAL_COMMENT_ROLES: &[Role] = &[Role::Admin, Role::Dean, Role::DepartmentHead, Role::Head];

const MAX_COMMENT_LENGTH: usize = 5000;

/// Special-role escape for non-member faculty. Under `Off` it always passes,
/// which is the historical behaviour.
fn has_special_role(identity: &Identity, mode: AuthzMode) -> bool {
    if identity.has_any_role(SPECIAL_COMMENT_ROLES) {
        return true;
    }

    match mode {
        AuthzMode::Off => true,
        AuthzMode::Advisory => {
            tracing::warn!(user_id = %identity.id, "advisory mode: non-member comment allowed");
            true
        }
        AuthzMode::Strict => false,
    }
}

/// Students must be project members. Faculty must be members or hold a
/// special role.
pub fn authorize_comment(identity: &Identity, project: &ProjectWithMembers, mode: AuthzMode) -> AppResult<()> {
    let allowed = match identity.user_type {
        UserType::Student => project.has_student(identity.id),
        UserType::Faculty => project.has_faculty_member(identity.id) || has_special_role(identity, mode),
    };

    if allowed {
        Ok(())
    } else {
        tracing::debug!(
            user_id = %identity.id,
            project_id = %project.project.id,
            "comment access denied"
        );
        Err(AppError::forbidden("not a member of this project"))
    }
}

pub async fn load_project_with_members(pool: &SqlitePool, project_id: Uuid) -> AppResult<ProjectWithMembers> {
    let row = sqlx::query("SELECT id, field_pool_id, title, status, created_at, updated_at FROM projects WHERE id = ?")
        .bind(project_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("project not found"))?;
    let project = Project::try_from(&row)?;

    let rows = sqlx::query(
        "SELECT id, student_id, faculty_member_id, role FROM project_members WHERE project_id = ?",
    )
    .bind(project_id.to_string())
    .fetch_all(pool)
    .await?;

    let members = rows
        .iter()
        .map(ProjectMember::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ProjectWithMembers { project, members })
}

pub async fn create_comment(
    pool: &SqlitePool,
    identity: &Identity,
    project_id: Uuid,
    content: &str,
    mode: AuthzMode,
) -> AppResult<Comment> {
    let project = load_project_with_members(pool, project_id).await?;
    authorize_comment(identity, &project, mode)?;

    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::bad_request("comment content must not be empty"));
    }
    if content.chars().count() > MAX_COMMENT_LENGTH {
        return Err(AppError::bad_request(format!(
            "comment content must be at most {} characters",
            MAX_COMMENT_LENGTH
        )));
    }

    let comment = Comment {
        id: Uuid::new_v4(),
        project_id,
        author_id: identity.id,
        author_type: identity.user_type,
        content: content.to_string(),
        created_at: utc_now(),
    };

    sqlx::query(
        "INSERT INTO project_comments (id, project_id, author_id, author_type, content, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(comment.id.to_string())
    .bind(comment.project_id.to_string())
    .bind(comment.author_id.to_string())
    .bind(comment.author_type.as_str())
    .bind(&comment.content)
    .bind(comment.created_at)
    .execute(pool)
    .await?;

    tracing::info!(comment_id = %comment.id, %project_id, author_id = %identity.id, "comment created");

    Ok(comment)
}

pub async fn list_comments(
    pool: &SqlitePool,
    identity: &Identity,
    project_id: Uuid,
    page: &PageQuery,
    mode: AuthzMode,
) -> AppResult<Paginated<Comment>> {
    let project = load_project_with_members(pool, project_id).await?;
    authorize_comment(identity, &project, mode)?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM project_comments WHERE project_id = ?")
        .bind(project_id.to_string())
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query(
        "SELECT id, project_id, author_id, author_type, content, created_at FROM project_comments WHERE project_id = ? ORDER BY created_at ASC, rowid ASC LIMIT ? OFFSET ?",
    )
    .bind(project_id.to_string())
    .bind(i64::from(page.limit()))
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let comments = rows
        .iter()
        .map(Comment::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Paginated::new(comments, page, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::ProjectStatus;

    fn project(members: Vec<ProjectMember>) -> ProjectWithMembers {
        let now = utc_now();
        ProjectWithMembers {
            project: Project {
                id: Uuid::new_v4(),
                field_pool_id: None,
                title: "Consensus in sensor networks".into(),
                status: ProjectStatus::InProgress,
                created_at: now,
                updated_at: now,
            },
            members,
        }
    }

    fn faculty_member(id: Uuid) -> ProjectMember {
        ProjectMember {
            id: Uuid::new_v4(),
            student_id: None,
            faculty_member_id: Some(id),
            role: "ADVISOR".into(),
        }
    }

    fn student_member(id: Uuid) -> ProjectMember {
        ProjectMember {
            id: Uuid::new_v4(),
            student_id: Some(id),
            faculty_member_id: None,
            role: "AUTHOR".into(),
        }
    }

    #[test]
    fn member_lecturer_may_comment_in_every_mode() {
        let lecturer = Identity::faculty(Uuid::new_v4(), vec![Role::Lecturer], Some(Uuid::new_v4()));
        let p = project(vec![faculty_member(lecturer.id)]);
        for mode in [AuthzMode::Off, AuthzMode::Advisory, AuthzMode::Strict] {
            assert!(authorize_comment(&lecturer, &p, mode).is_ok());
        }
    }

    #[test]
    fn non_member_lecturer_passes_only_through_the_legacy_escape() {
        let lecturer = Identity::faculty(Uuid::new_v4(), vec![Role::Lecturer], None);
        let p = project(vec![faculty_member(Uuid::new_v4())]);

        assert!(authorize_comment(&lecturer, &p, AuthzMode::Off).is_ok());
        assert!(authorize_comment(&lecturer, &p, AuthzMode::Advisory).is_ok());
        assert!(matches!(
            authorize_comment(&lecturer, &p, AuthzMode::Strict),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn special_roles_may_comment_without_membership() {
        let head = Identity::faculty(Uuid::new_v4(), vec![Role::Lecturer, Role::Head], None);
        let p = project(Vec::new());
        assert!(authorize_comment(&head, &p, AuthzMode::Strict).is_ok());
    }

    #[test]
    fn students_need_membership_regardless_of_mode() {
        let student = Identity::student(Uuid::new_v4(), None);
        let member = project(vec![student_member(student.id)]);
        let outsider = project(vec![student_member(Uuid::new_v4())]);

        assert!(authorize_comment(&student, &member, AuthzMode::Strict).is_ok());
        for mode in [AuthzMode::Off, AuthzMode::Advisory, AuthzMode::Strict] {
            assert!(authorize_comment(&student, &outsider, mode).is_err());
        }
    }

    #[test]
    fn student_id_does_not_match_faculty_membership() {
        let id = Uuid::new_v4();
        let student = Identity::student(id, None);
        let p = project(vec![faculty_member(id)]);
        assert!(authorize_comment(&student, &p, AuthzMode::Strict).is_err());
    }
}
