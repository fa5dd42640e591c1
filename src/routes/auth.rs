use axum::extract::State;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::strategy::{self, build_identity, find_account_by_email, store_refresh_hash};
use crate::authz::guard::{self, GuardDecision};
use crate::authz::{Identity, UserType};
use crate::errors::{AppError, AppResult};
use crate::models::user::{AccessRequest, AuthResponse, LoginRequest, MessageResponse, RefreshRequest};
use crate::utils::{hash_secret, verify_password};

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials or inactive account")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let account = find_account_by_email(&state.pool, payload.user_type, &payload.email)
        .await?
        .ok_or_else(|| AppError::unauthorized("invalid credentials"))?;

    let password_ok = verify_password(&payload.password, &account.password_hash).unwrap_or_else(|err| {
        tracing::warn!(user_id = %account.id, error = %err, "stored password hash is unreadable");
        false
    });
    if !password_ok {
        return Err(AppError::unauthorized("invalid credentials"));
    }

    if !account.is_active() {
        return Err(AppError::unauthorized("account is not active"));
    }

    let identity = build_identity(&state.pool, &account).await?;
    let response = issue_tokens(&state, identity).await?;

    tracing::info!(user_id = %account.id, user_type = %account.user_type, "login");

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "Auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = AuthResponse),
        (status = 401, description = "Refresh token invalid, expired or revoked")
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let claims = state.jwt.decode_refresh(&payload.refresh_token)?;
    let identity = strategy::validate_refresh(&state.pool, &claims, &payload.refresh_token).await?;

    // rotation: the presented token stops working once the new hash is stored
    let response = issue_tokens(&state, identity).await?;

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current identity", body = Identity),
        (status = 401, description = "Missing, invalid or expired token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn me(identity: Identity) -> AppResult<Json<Identity>> {
    Ok(Json(identity))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Refresh token revoked", body = MessageResponse)),
    security(("bearerAuth" = []))
)]
pub async fn logout(State(state): State<AppState>, identity: Identity) -> AppResult<Json<MessageResponse>> {
    store_refresh_hash(&state.pool, identity.user_type, identity.id, None).await?;

    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/auth/access",
    tag = "Auth",
    request_body = AccessRequest,
    responses((status = 200, description = "Render or redirect decision for a role-protected view"))
)]
pub async fn access(
    State(state): State<AppState>,
    identity: Option<Identity>,
    Json(payload): Json<AccessRequest>,
) -> AppResult<Json<GuardDecision>> {
    Ok(Json(guard::evaluate(identity.as_ref(), &payload.roles, state.authz_mode)))
}

async fn issue_tokens(state: &AppState, identity: Identity) -> AppResult<AuthResponse> {
    let (id, user_type): (Uuid, UserType) = (identity.id, identity.user_type);

    let access_token = state.jwt.encode_access(id, user_type)?;
    let refresh_token = state.jwt.encode_refresh(id, user_type)?;

    let refresh_hash = hash_secret(&refresh_token)?;
    store_refresh_hash(&state.pool, user_type, id, Some(&refresh_hash)).await?;

    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: identity,
    })
}
