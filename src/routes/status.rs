//! Status transition endpoints
//!
//! Every handler parses the requested status, checks the caller's permission
//! for that move, then applies it through [`transition_row`], which validates
//! the move against the entity's transition table and writes it with a
//! compare-and-set on the previous value.

use axum::extract::{Path, State};
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{ensure_permission, permissions, AuthzMode, Identity, Role};
use crate::db::row_parsers;
use crate::errors::{AppError, AppResult};
use crate::models::status::{StatusChange, StatusUpdateRequest};
use crate::status::{
    DefenseCommitteeStatus, FieldPoolStatus, LecturerSelectionStatus, ProjectStatus, ProposedProjectStatus,
    StatusMachine, StudentSelectionStatus,
};
use crate::utils::utc_now;

/// Reads the current status of `table.id`, checks the move and stores it.
/// `table` is always one of the fixed table names below.
pub async fn transition_row<S: StatusMachine>(
    pool: &SqlitePool,
    table: &'static str,
    id: Uuid,
    to: S,
) -> AppResult<StatusChange> {
    let current: Option<String> = sqlx::query_scalar(&format!("SELECT status FROM {table} WHERE id = ?"))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    let current = current.ok_or_else(|| AppError::not_found(format!("{} not found", S::ENTITY)))?;
    let from: S = current
        .parse()
        .map_err(|_| AppError::internal(format!("stored {} status is invalid: {}", S::ENTITY, current)))?;

    from.transition(to)?;

    let result = sqlx::query(&format!(
        "UPDATE {table} SET status = ?, updated_at = ? WHERE id = ? AND status = ?"
    ))
    .bind(to.as_str())
    .bind(utc_now())
    .bind(id.to_string())
    .bind(from.as_str())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::conflict(format!("{} status changed concurrently", S::ENTITY)));
    }

    tracing::info!(entity = S::ENTITY, %id, from = from.as_str(), to = to.as_str(), "status transition");

    Ok(StatusChange {
        id,
        entity: S::ENTITY,
        from: from.as_str(),
        to: to.as_str(),
    })
}

async fn gate(state: &AppState, identity: &Identity, permission: &str) -> AppResult<()> {
    ensure_permission(state.evaluator.as_ref(), state.authz_mode, identity, permission).await
}

#[utoipa::path(
    patch,
    path = "/projects/{id}/status",
    tag = "Status",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Transition applied", body = StatusChange),
        (status = 409, description = "Illegal transition")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_project_status(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusUpdateRequest>,
) -> AppResult<Json<StatusChange>> {
    let to: ProjectStatus = payload.status.parse()?;
    gate(&state, &identity, permissions::PROJECT_MANAGE).await?;

    Ok(Json(transition_row(&state.pool, "projects", id, to).await?))
}

#[utoipa::path(
    patch,
    path = "/proposed-projects/{id}/status",
    tag = "Status",
    params(("id" = Uuid, Path, description = "Proposed project id")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Transition applied", body = StatusChange),
        (status = 403, description = "Caller may not make this decision"),
        (status = 409, description = "Illegal transition")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_proposed_project_status(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusUpdateRequest>,
) -> AppResult<Json<StatusChange>> {
    let to: ProposedProjectStatus = payload.status.parse()?;

    let permission = if to.is_advisor_decision() {
        permissions::PROPOSAL_REVIEW_ADVISOR
    } else if to.is_head_decision() {
        permissions::PROPOSAL_REVIEW_HEAD
    } else {
        permissions::PROPOSAL_SUBMIT
    };
    gate(&state, &identity, permission).await?;
    ensure_proposal_actor(&state.pool, &identity, id, to, state.authz_mode).await?;

    Ok(Json(transition_row(&state.pool, "proposed_projects", id, to).await?))
}

/// Ownership checks on top of the permission: only the assigned advisor
/// decides the advisor stage, only the author resubmits.
async fn ensure_proposal_actor(
    pool: &SqlitePool,
    identity: &Identity,
    id: Uuid,
    to: ProposedProjectStatus,
    mode: AuthzMode,
) -> AppResult<()> {
    if mode == AuthzMode::Off || identity.has_role(Role::Admin) {
        return Ok(());
    }

    let row = sqlx::query("SELECT student_id, advisor_id FROM proposed_projects WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("proposed project not found"))?;

    let student_id = row_parsers::uuid(&row, "student_id")?;
    let advisor_id = row_parsers::opt_uuid(&row, "advisor_id")?;

    let allowed = if to.is_advisor_decision() {
        advisor_id == Some(identity.id)
    } else if to.is_head_decision() {
        true
    } else {
        identity.is_student() && student_id == identity.id
    };

    if allowed {
        return Ok(());
    }

    if mode == AuthzMode::Advisory {
        tracing::warn!(user_id = %identity.id, proposal_id = %id, "advisory mode: proposal actor check ignored");
        return Ok(());
    }

    Err(AppError::forbidden("not the assigned reviewer or author of this proposal"))
}

#[utoipa::path(
    patch,
    path = "/lecturer-selections/{id}/status",
    tag = "Status",
    params(("id" = Uuid, Path, description = "Lecturer selection id")),
    request_body = StatusUpdateRequest,
    responses((status = 200, description = "Transition applied", body = StatusChange)),
    security(("bearerAuth" = []))
)]
pub async fn update_lecturer_selection_status(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusUpdateRequest>,
) -> AppResult<Json<StatusChange>> {
    let to: LecturerSelectionStatus = payload.status.parse()?;
    gate(&state, &identity, permissions::LECTURER_SELECTION_REVIEW).await?;

    Ok(Json(transition_row(&state.pool, "lecturer_selections", id, to).await?))
}

#[utoipa::path(
    patch,
    path = "/student-selections/{id}/status",
    tag = "Status",
    params(("id" = Uuid, Path, description = "Student selection id")),
    request_body = StatusUpdateRequest,
    responses((status = 200, description = "Transition applied", body = StatusChange)),
    security(("bearerAuth" = []))
)]
pub async fn update_student_selection_status(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusUpdateRequest>,
) -> AppResult<Json<StatusChange>> {
    let to: StudentSelectionStatus = payload.status.parse()?;
    gate(&state, &identity, permissions::STUDENT_SELECTION_REVIEW).await?;

    Ok(Json(transition_row(&state.pool, "student_selections", id, to).await?))
}

#[utoipa::path(
    patch,
    path = "/defense-committees/{id}/status",
    tag = "Status",
    params(("id" = Uuid, Path, description = "Defense committee id")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Transition applied", body = StatusChange),
        (status = 409, description = "Illegal transition, e.g. PREPARING to FINISHED")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_defense_committee_status(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusUpdateRequest>,
) -> AppResult<Json<StatusChange>> {
    let to: DefenseCommitteeStatus = payload.status.parse()?;
    gate(&state, &identity, permissions::DEFENSE_COMMITTEE_MANAGE).await?;

    Ok(Json(transition_row(&state.pool, "defense_committees", id, to).await?))
}

#[utoipa::path(
    patch,
    path = "/field-pool/{id}/status",
    tag = "Status",
    params(("id" = Uuid, Path, description = "Field pool id")),
    request_body = StatusUpdateRequest,
    responses((status = 200, description = "Transition applied", body = StatusChange)),
    security(("bearerAuth" = []))
)]
pub async fn update_field_pool_status(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusUpdateRequest>,
) -> AppResult<Json<StatusChange>> {
    let to: FieldPoolStatus = payload.status.parse()?;
    gate(&state, &identity, permissions::FIELD_POOL_MANAGE).await?;

    Ok(Json(transition_row(&state.pool, "field_pools", id, to).await?))
}
