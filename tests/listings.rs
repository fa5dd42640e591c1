use anyhow::Result;
use axum::http::StatusCode;
use serde_json::Value;
use thesis_portal::authz::AuthzMode;

mod common;
use common::{insert_defense_committee, insert_faculty, insert_field_pool, insert_student, setup};

fn names(page: &Value) -> Vec<String> {
    page["data"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn defense_committees_are_paginated() -> Result<()> {
    let env = setup(AuthzMode::Strict).await?;
    insert_faculty(&env.pool, "lec@university.edu", &["LECTURER"], &[]).await?;
    for i in 0..5 {
        insert_defense_committee(&env.pool, &format!("Committee {}", i), "PREPARING").await?;
    }
    let token = env.token("lec@university.edu", "FACULTY").await?;

    let (status, page) = env.send("GET", "/defense-committees?page=2&limit=2", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK, "{}", page);
    assert_eq!(page["page"], 2);
    assert_eq!(page["limit"], 2);
    assert_eq!(page["total"], 5);
    assert_eq!(page["totalPages"], 3);
    assert_eq!(names(&page).len(), 2);

    let (_, last) = env.send("GET", "/defense-committees?page=3&limit=2", Some(&token), None).await?;
    assert_eq!(names(&last).len(), 1);

    // defaults and clamping
    let (_, page) = env.send("GET", "/defense-committees?limit=1000", Some(&token), None).await?;
    assert_eq!(page["page"], 1);
    assert_eq!(page["limit"], 100);
    assert_eq!(names(&page).len(), 5);

    Ok(())
}

#[tokio::test]
async fn students_cannot_list_committees_in_strict_mode() -> Result<()> {
    let env = setup(AuthzMode::Strict).await?;
    insert_student(&env.pool, "stu@university.edu", "ACTIVE").await?;
    let token = env.token("stu@university.edu", "STUDENT").await?;

    let (status, _) = env.send("GET", "/defense-committees", Some(&token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn hidden_field_pools_only_for_managers() -> Result<()> {
    let env = setup(AuthzMode::Strict).await?;
    insert_student(&env.pool, "stu@university.edu", "ACTIVE").await?;
    insert_faculty(&env.pool, "dean@university.edu", &["DEAN"], &[]).await?;
    insert_field_pool(&env.pool, "Open pool", "OPEN").await?;
    insert_field_pool(&env.pool, "Closed pool", "CLOSED").await?;
    insert_field_pool(&env.pool, "Hidden pool", "HIDDEN").await?;

    let student = env.token("stu@university.edu", "STUDENT").await?;
    let dean = env.token("dean@university.edu", "FACULTY").await?;

    let (status, page) = env.send("GET", "/field-pool", Some(&student), None).await?;
    assert_eq!(status, StatusCode::OK, "{}", page);
    assert_eq!(page["total"], 2);
    assert!(!names(&page).contains(&"Hidden pool".to_string()));

    let (_, page) = env.send("GET", "/field-pool?status=HIDDEN", Some(&student), None).await?;
    assert_eq!(page["total"], 0);

    let (_, page) = env.send("GET", "/field-pool", Some(&dean), None).await?;
    assert_eq!(page["total"], 3);

    let (_, page) = env.send("GET", "/field-pool?status=OPEN", Some(&dean), None).await?;
    assert_eq!(names(&page), vec!["Open pool".to_string()]);

    let (status, _) = env.send("GET", "/field-pool?status=ARCHIVED", Some(&dean), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}
