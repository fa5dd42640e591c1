use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::Identity;
use crate::comments;
use crate::errors::AppResult;
use crate::models::comment::{Comment, CommentCreateRequest};
use crate::models::pagination::{PageQuery, Paginated};

#[utoipa::path(
    get,
    path = "/projects/{id}/comments",
    tag = "Comments",
    params(("id" = Uuid, Path, description = "Project id"), PageQuery),
    responses(
        (status = 200, description = "Paginated comments, oldest first"),
        (status = 403, description = "Not a member of the project"),
        (status = 404, description = "Project not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_comments(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<Paginated<Comment>>> {
    let comments = comments::list_comments(&state.pool, &identity, id, &page, state.authz_mode).await?;
    Ok(Json(comments))
}

#[utoipa::path(
    post,
    path = "/projects/{id}/comments",
    tag = "Comments",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = CommentCreateRequest,
    responses(
        (status = 201, description = "Comment created", body = Comment),
        (status = 400, description = "Empty or oversized content"),
        (status = 403, description = "Not a member of the project"),
        (status = 404, description = "Project not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_comment(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentCreateRequest>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let comment = comments::create_comment(&state.pool, &identity, id, &payload.content, state.authz_mode).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
