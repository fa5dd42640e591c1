use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::app::AppState;
use crate::authz::{ensure_permission, permissions, AuthzMode, Identity};
use crate::errors::AppResult;
use crate::models::field_pool::FieldPool;
use crate::models::pagination::{PageQuery, Paginated};
use crate::status::{FieldPoolStatus, StatusMachine};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FieldPoolFilter {
    /// OPEN, CLOSED or HIDDEN
    pub status: Option<String>,
}

#[utoipa::path(
    get,
    path = "/field-pool",
    tag = "Field pools",
    params(PageQuery, FieldPoolFilter),
    responses((status = 200, description = "Paginated field pools, newest first")),
    security(("bearerAuth" = []))
)]
pub async fn list_field_pools(
    State(state): State<AppState>,
    identity: Identity,
    Query(page): Query<PageQuery>,
    Query(filter): Query<FieldPoolFilter>,
) -> AppResult<Json<Paginated<FieldPool>>> {
    ensure_permission(state.evaluator.as_ref(), state.authz_mode, &identity, permissions::FIELD_POOL_VIEW).await?;

    let status: Option<FieldPoolStatus> = filter.status.as_deref().map(str::parse).transpose()?;

    // hidden pools are only listed for those who manage them
    let include_hidden = match state.authz_mode {
        _ if identity.has_permission(permissions::FIELD_POOL_MANAGE) => true,
        AuthzMode::Off => true,
        AuthzMode::Advisory => {
            tracing::warn!(user_id = %identity.id, "advisory mode: hidden field pools listed");
            true
        }
        AuthzMode::Strict => false,
    };
    if status == Some(FieldPoolStatus::Hidden) && !include_hidden {
        return Ok(Json(Paginated::new(Vec::new(), &page, 0)));
    }

    let status_str = status.map(|s| s.as_str());
    let where_clause = "WHERE (?1 IS NULL OR status = ?1) AND (?2 OR status <> 'HIDDEN')";

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(1) FROM field_pools {where_clause}"))
        .bind(status_str)
        .bind(include_hidden)
        .fetch_one(&state.pool)
        .await?;

    let rows = sqlx::query(&format!(
        "SELECT id, name, description, registration_deadline, status, created_at, updated_at FROM field_pools {where_clause} ORDER BY created_at DESC LIMIT ?3 OFFSET ?4"
    ))
    .bind(status_str)
    .bind(include_hidden)
    .bind(i64::from(page.limit()))
    .bind(page.offset())
    .fetch_all(&state.pool)
    .await?;

    let pools = rows
        .iter()
        .map(FieldPool::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(Paginated::new(pools, &page, total)))
}
