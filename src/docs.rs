use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::authz::{Identity, Role, UserType};
use crate::models;
use crate::routes;
use crate::status::{
    DefenseCommitteeStatus, FieldPoolStatus, LecturerSelectionStatus, ProjectStatus, ProposedProjectStatus,
    StudentSelectionStatus,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::auth::login,
        routes::auth::refresh,
        routes::auth::me,
        routes::auth::logout,
        routes::auth::access,
        routes::comments::list_comments,
        routes::comments::create_comment,
        routes::status::update_project_status,
        routes::status::update_proposed_project_status,
        routes::status::update_lecturer_selection_status,
        routes::status::update_student_selection_status,
        routes::status::update_defense_committee_status,
        routes::status::update_field_pool_status,
        routes::defense::list_defense_committees,
        routes::field_pools::list_field_pools,
        routes::health::health
    ),
    components(
        schemas(
            Identity,
            Role,
            UserType,
            models::user::LoginRequest,
            models::user::RefreshRequest,
            models::user::AuthResponse,
            models::user::AccessRequest,
            models::user::MessageResponse,
            models::comment::Comment,
            models::comment::CommentCreateRequest,
            models::project::Project,
            models::project::ProjectMember,
            models::field_pool::FieldPool,
            models::defense::DefenseCommittee,
            models::status::StatusUpdateRequest,
            models::status::StatusChange,
            routes::health::HealthResponse,
            ProjectStatus,
            ProposedProjectStatus,
            LecturerSelectionStatus,
            StudentSelectionStatus,
            DefenseCommitteeStatus,
            FieldPoolStatus
        )
    ),
    tags(
        (name = "Auth", description = "Login, token refresh and session identity"),
        (name = "Comments", description = "Project comment threads"),
        (name = "Status", description = "Workflow status transitions"),
        (name = "Defense committees", description = "Defense committee listings"),
        (name = "Field pools", description = "Research field pools"),
        (name = "Health", description = "Service health")
    )
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
    let mut doc = serde_json::to_value(&ApiDoc::openapi())?;

    let root = doc
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("OpenAPI root must be an object"))?;

    ensure_security_components(root)?;
    root.entry("openapi")
        .or_insert_with(|| Value::String("3.0.3".to_string()));
    add_examples(root);
    ensure_servers(root, port);

    Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
    let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
        .try_it_out_enabled(true)
        .persist_authorization(true);

    let doc_json = Arc::new(serde_json::to_value(&doc)?);

    let json_route = get(move || {
        let doc_json = Arc::clone(&doc_json);
        async move { Json((*doc_json).clone()) }
    });

    Ok(Router::new()
        .route("/api-docs/openapi.json", json_route)
        .merge(SwaggerUi::new("/docs").config(swagger_config)))
}

fn ensure_security_components(root: &mut Map<String, Value>) -> anyhow::Result<()> {
    let schemes = root
        .entry("components")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .and_then(|components| {
            components
                .entry("securitySchemes")
                .or_insert_with(|| Value::Object(Map::new()))
                .as_object_mut()
        })
        .ok_or_else(|| anyhow::anyhow!("components.securitySchemes must be an object"))?;

    schemes.insert(
        "bearerAuth".to_string(),
        json!({
            "type": "http",
            "scheme": "bearer",
            "bearerFormat": "JWT"
        }),
    );
    Ok(())
}

fn add_examples(root: &mut Map<String, Value>) {
    let Some(paths) = root.get_mut("paths").and_then(Value::as_object_mut) else { return; };

    for item in paths.values_mut() {
        let Some(operations) = item.as_object_mut() else { continue; };
        for operation in operations.values_mut() {
            apply_parameter_examples(operation);
            apply_request_examples(operation);
        }
    }
}

fn apply_parameter_examples(operation: &mut Value) {
    let Some(parameters) = operation.get_mut("parameters").and_then(Value::as_array_mut) else { return; };

    for parameter in parameters.iter_mut() {
        let example = match parameter.get("name").and_then(Value::as_str) {
            Some("id") => json!("00000000-0000-0000-0000-000000000000"),
            Some("page") => json!(1),
            Some("limit") => json!(10),
            _ => continue,
        };
        if let Some(obj) = parameter.as_object_mut() {
            obj.entry("example").or_insert(example);
        }
    }
}

fn apply_request_examples(operation: &mut Value) {
    let Some(app_json) = operation
        .get_mut("requestBody")
        .and_then(|body| body.get_mut("content"))
        .and_then(|content| content.get_mut("application/json"))
        .and_then(Value::as_object_mut)
    else {
        return;
    };
    let Some(reference) = app_json
        .get("schema")
        .and_then(|schema| schema.get("$ref"))
        .and_then(Value::as_str)
    else {
        return;
    };

    let example = match reference {
        "#/components/schemas/LoginRequest" => json!({
            "email": "lan.nguyen@university.edu",
            "password": "S3cureP@ssw0rd",
            "userType": "FACULTY"
        }),
        "#/components/schemas/RefreshRequest" => json!({
            "refreshToken": "eyJhbGciOiJIUzI1Ni..."
        }),
        "#/components/schemas/AccessRequest" => json!({
            "roles": ["DEAN", "DEPARTMENT_HEAD"]
        }),
        "#/components/schemas/CommentCreateRequest" => json!({
            "content": "Please expand the related-work section before the next review."
        }),
        "#/components/schemas/StatusUpdateRequest" => json!({
            "status": "PENDING_HEAD"
        }),
        _ => return,
    };

    app_json.insert("example".to_string(), example);
}

fn ensure_servers(root: &mut Map<String, Value>, port: u16) {
    let server_url = format!("http://localhost:{}", port);

    match root.get_mut("servers") {
        Some(Value::Array(arr)) => {
            let has = arr
                .iter()
                .any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
            if !has {
                arr.push(json!({ "url": server_url }));
            }
        }
        _ => {
            root.insert("servers".to_string(), json!([{ "url": server_url }]));
        }
    }
}
