use anyhow::Result;
use serde_json::Value;
use thesis_portal::authz::{AuthzMode, UserType};
use thesis_portal::client::{ApiClient, ClientError, Session};

mod common;
use common::{insert_student, setup, TestEnv, PASSWORD};

async fn serve(env: &TestEnv) -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = env.app.clone();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{}", addr))
}

#[tokio::test]
async fn expired_access_token_is_refreshed_before_sending() -> Result<()> {
    let env = setup(AuthzMode::Strict).await?;
    let student_id = insert_student(&env.pool, "stu@university.edu", "ACTIVE").await?;
    let base_url = serve(&env).await?;

    let client = ApiClient::new(&base_url)?;
    let session = client.login("stu@university.edu", PASSWORD, UserType::Student).await?;

    let mut expired_jwt = env.jwt.clone();
    expired_jwt.access_exp_hours = -1;
    let expired = expired_jwt.encode_access(student_id, UserType::Student)?;
    client
        .set_session(Some(Session {
            access_token: expired.clone(),
            refresh_token: session.refresh_token.clone(),
        }))
        .await;

    let me: Value = client.get("/auth/me").await?;
    assert_eq!(me["id"], student_id.to_string());

    let rotated = client.session().await.expect("session kept");
    assert_ne!(rotated.access_token, expired);
    assert_ne!(rotated.refresh_token, session.refresh_token);

    Ok(())
}

#[tokio::test]
async fn unauthorized_response_triggers_one_refresh_and_retry() -> Result<()> {
    let env = setup(AuthzMode::Strict).await?;
    insert_student(&env.pool, "stu@university.edu", "ACTIVE").await?;
    let base_url = serve(&env).await?;

    let client = ApiClient::new(&base_url)?;
    let session = client.login("stu@university.edu", PASSWORD, UserType::Student).await?;

    // unexpired but signed with the wrong secret, so the server answers 401
    let foreign = thesis_portal::jwt::JwtConfig::with_secrets("other", "other-refresh");
    let bogus = foreign.encode_access(uuid::Uuid::new_v4(), UserType::Student)?;
    client
        .set_session(Some(Session {
            access_token: bogus,
            refresh_token: session.refresh_token,
        }))
        .await;

    let me: Value = client.get("/auth/me").await?;
    assert_eq!(me["userType"], "STUDENT");

    Ok(())
}

#[tokio::test]
async fn rejected_refresh_clears_the_session() -> Result<()> {
    let env = setup(AuthzMode::Strict).await?;
    let student_id = insert_student(&env.pool, "stu@university.edu", "ACTIVE").await?;
    let base_url = serve(&env).await?;

    let client = ApiClient::new(&base_url)?;
    let session = client.login("stu@university.edu", PASSWORD, UserType::Student).await?;

    // deactivated accounts fail both the request and the refresh
    sqlx::query("UPDATE students SET status = 'INACTIVE' WHERE id = ?")
        .bind(student_id.to_string())
        .execute(&env.pool)
        .await?;

    let err = client.get::<Value>("/auth/me").await.unwrap_err();
    assert!(matches!(err, ClientError::SessionExpired), "unexpected error: {}", err);
    assert!(client.session().await.is_none());

    // explicit session from elsewhere can be installed again
    let client = ApiClient::new(&base_url)?.with_session(session);
    assert!(client.session().await.is_some());

    Ok(())
}

#[tokio::test]
async fn api_errors_carry_status_and_body() -> Result<()> {
    let env = setup(AuthzMode::Strict).await?;
    insert_student(&env.pool, "stu@university.edu", "ACTIVE").await?;
    let base_url = serve(&env).await?;

    let client = ApiClient::new(&base_url)?;
    client.login("stu@university.edu", PASSWORD, UserType::Student).await?;

    let err = client.get::<Value>("/defense-committees").await.unwrap_err();
    assert_eq!(err.status(), Some(reqwest::StatusCode::FORBIDDEN));

    let err = ApiClient::new(&base_url)?
        .login("stu@university.edu", "wrong-password", UserType::Student)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(reqwest::StatusCode::UNAUTHORIZED));

    client.logout().await?;
    assert!(client.session().await.is_none());

    Ok(())
}

#[tokio::test]
async fn second_unauthorized_after_refresh_forces_logout() -> Result<()> {
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    // refresh always succeeds, the resource always answers 401
    let refreshes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&refreshes);
    let app = Router::new()
        .route(
            "/auth/refresh",
            post(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    Json(serde_json::json!({
                        "accessToken": format!("access-{}", n),
                        "refreshToken": format!("refresh-{}", n),
                    }))
                }
            }),
        )
        .route("/reports", get(|| async { StatusCode::UNAUTHORIZED }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let client = ApiClient::new(&base_url)?.with_session(Session {
        access_token: "opaque".to_string(),
        refresh_token: "refresh-initial".to_string(),
    });

    let err = client.get::<Value>("/reports").await.unwrap_err();
    assert!(matches!(err, ClientError::SessionExpired), "unexpected error: {}", err);
    assert!(client.session().await.is_none());
    assert_eq!(refreshes.load(Ordering::SeqCst), 1, "exactly one refresh attempt");

    Ok(())
}
