use axum::extract::State;
use axum::Json;
use serde::Serialize;
use sqlx::query_scalar;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::authz::AuthzMode;
use crate::errors::AppResult;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub db_ok: bool,
    pub db_error: Option<String>,
    /// off, advisory or strict
    pub authz_mode: &'static str,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Health check", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let authz_mode = match state.authz_mode {
        AuthzMode::Off => "off",
        AuthzMode::Advisory => "advisory",
        AuthzMode::Strict => "strict",
    };

    let (db_ok, db_error) = match query_scalar::<_, i64>("SELECT 1").fetch_one(&state.pool).await {
        Ok(_) => (true, None),
        Err(e) => (false, Some(e.to_string())),
    };

    Ok(Json(HealthResponse {
        status: "ok",
        db_ok,
        db_error,
        authz_mode,
    }))
}
