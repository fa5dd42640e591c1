use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::roles::{permissions_for, Role};
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    Student,
    Faculty,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Student => "STUDENT",
            UserType::Faculty => "FACULTY",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STUDENT" => Ok(UserType::Student),
            "FACULTY" => Ok(UserType::Faculty),
            other => Err(AppError::bad_request(format!("unknown user type: {other}"))),
        }
    }
}

/// Request-scoped identity derived from a validated token. Never persisted.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: Uuid,
    pub user_type: UserType,
    pub roles: Vec<Role>,
    #[schema(value_type = Vec<String>)]
    pub permissions: BTreeSet<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faculty_id: Option<Uuid>,
}

impl Identity {
    pub fn student(id: Uuid, faculty_id: Option<Uuid>) -> Self {
        let roles = vec![Role::Student];
        Self {
            id,
            user_type: UserType::Student,
            permissions: permissions_for(&roles),
            roles,
            faculty_id,
        }
    }

    pub fn faculty(id: Uuid, roles: Vec<Role>, faculty_id: Option<Uuid>) -> Self {
        Self {
            id,
            user_type: UserType::Faculty,
            permissions: permissions_for(&roles),
            roles,
            faculty_id,
        }
    }

    pub fn is_student(&self) -> bool {
        self.user_type == UserType::Student
    }

    pub fn is_faculty(&self) -> bool {
        self.user_type == UserType::Faculty
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.has_role(*role))
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}
