use std::sync::Arc;

use axum::http::Method;
use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::guard::require_session;
use crate::authz::{AuthzMode, DefaultPolicyEvaluator, PolicyEvaluator};
use crate::errors::AppError;
use crate::jwt::JwtConfig;
use crate::routes::{auth, comments, defense, field_pools, health, status};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub authz_mode: AuthzMode,
    pub evaluator: Arc<dyn PolicyEvaluator>,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig, authz_mode: AuthzMode) -> Self {
        Self {
            pool,
            jwt: Arc::new(jwt),
            authz_mode,
            evaluator: Arc::new(DefaultPolicyEvaluator::new()),
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let mode = AuthzMode::from_env();
    tracing::info!(authz_mode = ?mode, "authorization mode");

    Ok(create_app_with_state(AppState::new(pool, jwt_config, mode)))
}

pub fn create_app_with_state(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let public = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        // answers with a redirect decision when no session is present
        .route("/auth/access", post(auth::access))
        .route("/api/health", get(health::health));

    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
        .route(
            "/projects/:id/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route("/projects/:id/status", patch(status::update_project_status))
        .route("/proposed-projects/:id/status", patch(status::update_proposed_project_status))
        .route("/lecturer-selections/:id/status", patch(status::update_lecturer_selection_status))
        .route("/student-selections/:id/status", patch(status::update_student_selection_status))
        .route("/defense-committees", get(defense::list_defense_committees))
        .route("/defense-committees/:id/status", patch(status::update_defense_committee_status))
        .route("/field-pool", get(field_pools::list_field_pools))
        .route("/field-pool/:id/status", patch(status::update_field_pool_status))
        .route_layer(middleware::from_fn(require_session));

    Router::new()
        .merge(public)
        .merge(protected)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
