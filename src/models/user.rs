use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::authz::{Identity, UserType};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "lan.nguyen@university.edu")]
    pub email: String,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
    pub user_type: UserType,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: Identity,
}

/// Role requirement posted by a front-end before rendering a protected view.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AccessRequest {
    /// A role name or a list of role names
    #[schema(value_type = Object, example = json!(["DEAN", "DEPARTMENT_HEAD"]))]
    pub roles: crate::authz::RoleRequirement,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
