use axum::extract::{Query, State};
use axum::Json;

use crate::app::AppState;
use crate::authz::{ensure_permission, permissions, Identity};
use crate::errors::AppResult;
use crate::models::defense::DefenseCommittee;
use crate::models::pagination::{PageQuery, Paginated};

#[utoipa::path(
    get,
    path = "/defense-committees",
    tag = "Defense committees",
    params(PageQuery),
    responses((status = 200, description = "Paginated committees ordered by defense date")),
    security(("bearerAuth" = []))
)]
pub async fn list_defense_committees(
    State(state): State<AppState>,
    identity: Identity,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<Paginated<DefenseCommittee>>> {
    ensure_permission(state.evaluator.as_ref(), state.authz_mode, &identity, permissions::DEFENSE_COMMITTEE_VIEW).await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM defense_committees")
        .fetch_one(&state.pool)
        .await?;

    let rows = sqlx::query(
        "SELECT id, project_id, name, defense_date, location, status, created_at, updated_at FROM defense_committees ORDER BY defense_date IS NULL, defense_date ASC, created_at DESC LIMIT ? OFFSET ?",
    )
    .bind(i64::from(page.limit()))
    .bind(page.offset())
    .fetch_all(&state.pool)
    .await?;

    let committees = rows
        .iter()
        .map(DefenseCommittee::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(Paginated::new(committees, &page, total)))
}
