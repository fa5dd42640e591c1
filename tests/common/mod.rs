#![allow(dead_code)]

use anyhow::Result;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt;
use uuid::Uuid;

use thesis_portal::authz::AuthzMode;
use thesis_portal::jwt::JwtConfig;
use thesis_portal::utils::{hash_password, utc_now};
use thesis_portal::{create_app_with_state, AppState};

pub const PASSWORD: &str = "password123";

pub struct TestEnv {
    // keeps the database file alive for the duration of the test
    _dir: TempDir,
    pub pool: SqlitePool,
    pub app: Router,
    pub jwt: JwtConfig,
}

pub async fn setup(mode: AuthzMode) -> Result<TestEnv> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("test.db");

    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator =
        sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
    migrator.run(&pool).await?;

    let jwt = JwtConfig::with_secrets("test-access-secret", "test-refresh-secret");
    let app = create_app_with_state(AppState::new(pool.clone(), jwt.clone(), mode));

    Ok(TestEnv {
        _dir: dir,
        pool,
        app,
        jwt,
    })
}

impl TestEnv {
    pub async fn call(&self, req: Request<Body>) -> Result<(StatusCode, Value)> {
        let resp = self.app.clone().oneshot(req).await?;
        let status = resp.status();
        let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, value))
    }

    pub async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };
        self.call(req).await
    }

    pub async fn login(&self, email: &str, user_type: &str) -> Result<(StatusCode, Value)> {
        let body = serde_json::json!({ "email": email, "password": PASSWORD, "userType": user_type });
        self.send("POST", "/auth/login", None, Some(body)).await
    }

    /// Logs in and returns the access token, failing the test otherwise.
    pub async fn token(&self, email: &str, user_type: &str) -> Result<String> {
        let (status, body) = self.login(email, user_type).await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed for {}: {} {}", email, status, body);
        body["accessToken"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("no accessToken in {}", body))
    }
}

pub async fn insert_student(pool: &SqlitePool, email: &str, status: &str) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = utc_now();
    sqlx::query(
        "INSERT INTO students (id, student_code, full_name, email, password_hash, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(format!("S-{}", &id.to_string()[..8]))
    .bind("Test Student")
    .bind(email)
    .bind(hash_password(PASSWORD)?)
    .bind(status)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(id)
}

/// Inserts a faculty member with basic roles and one membership row per
/// entry in `division_roles`.
pub async fn insert_faculty(pool: &SqlitePool, email: &str, roles: &[&str], division_roles: &[&str]) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = utc_now();
    sqlx::query(
        "INSERT INTO faculty_members (id, faculty_code, full_name, email, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(format!("F-{}", &id.to_string()[..8]))
    .bind("Test Lecturer")
    .bind(email)
    .bind(hash_password(PASSWORD)?)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    for role in roles {
        sqlx::query("INSERT INTO faculty_member_roles (faculty_member_id, role) VALUES (?, ?)")
            .bind(id.to_string())
            .bind(*role)
            .execute(pool)
            .await?;
    }

    for division_role in division_roles {
        let division_id = Uuid::new_v4();
        sqlx::query("INSERT INTO divisions (id, name, created_at) VALUES (?, ?, ?)")
            .bind(division_id.to_string())
            .bind(format!("Division {}", &division_id.to_string()[..8]))
            .bind(now)
            .execute(pool)
            .await?;
        sqlx::query("INSERT INTO division_memberships (division_id, faculty_member_id, role) VALUES (?, ?, ?)")
            .bind(division_id.to_string())
            .bind(id.to_string())
            .bind(*division_role)
            .execute(pool)
            .await?;
    }

    Ok(id)
}

pub async fn insert_project(pool: &SqlitePool, status: &str) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = utc_now();
    sqlx::query("INSERT INTO projects (id, title, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?)")
        .bind(id.to_string())
        .bind("Consensus in sensor networks")
        .bind(status)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(id)
}

pub async fn add_student_member(pool: &SqlitePool, project_id: Uuid, student_id: Uuid) -> Result<()> {
    sqlx::query("INSERT INTO project_members (id, project_id, student_id, role) VALUES (?, ?, ?, 'AUTHOR')")
        .bind(Uuid::new_v4().to_string())
        .bind(project_id.to_string())
        .bind(student_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn add_faculty_member(pool: &SqlitePool, project_id: Uuid, faculty_id: Uuid) -> Result<()> {
    sqlx::query("INSERT INTO project_members (id, project_id, faculty_member_id, role) VALUES (?, ?, ?, 'ADVISOR')")
        .bind(Uuid::new_v4().to_string())
        .bind(project_id.to_string())
        .bind(faculty_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn insert_defense_committee(pool: &SqlitePool, name: &str, status: &str) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = utc_now();
    sqlx::query("INSERT INTO defense_committees (id, name, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?)")
        .bind(id.to_string())
        .bind(name)
        .bind(status)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(id)
}

pub async fn insert_proposal(pool: &SqlitePool, student_id: Uuid, advisor_id: Option<Uuid>) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = utc_now();
    sqlx::query(
        "INSERT INTO proposed_projects (id, student_id, advisor_id, title, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(student_id.to_string())
    .bind(advisor_id.map(|a| a.to_string()))
    .bind("Federated thesis scheduling")
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn insert_field_pool(pool: &SqlitePool, name: &str, status: &str) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = utc_now();
    sqlx::query("INSERT INTO field_pools (id, name, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?)")
        .bind(id.to_string())
        .bind(name)
        .bind(status)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(id)
}

pub async fn stored_status(pool: &SqlitePool, table: &str, id: Uuid) -> Result<String> {
    let status: String = sqlx::query_scalar(&format!("SELECT status FROM {} WHERE id = ?", table))
        .bind(id.to_string())
        .fetch_one(pool)
        .await?;
    Ok(status)
}
