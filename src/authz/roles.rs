use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::permissions::*;
use crate::errors::AppError;

/// Role name carried by an identity. `Head` is derived from division
/// membership and is not expected in the basic role join table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Dean,
    DepartmentHead,
    Secretary,
    Lecturer,
    Student,
    Head,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Admin,
        Role::Dean,
        Role::DepartmentHead,
        Role::Secretary,
        Role::Lecturer,
        Role::Student,
        Role::Head,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Dean => "DEAN",
            Role::DepartmentHead => "DEPARTMENT_HEAD",
            Role::Secretary => "SECRETARY",
            Role::Lecturer => "LECTURER",
            Role::Student => "STUDENT",
            Role::Head => "HEAD",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AppError::bad_request(format!("unknown role: {s}")))
    }
}

/// Division membership role that promotes a faculty member to `HEAD`.
pub const DIVISION_HEAD: &str = "HEAD";

/// Static role -> permission table.
pub fn role_permissions(role: Role) -> &'static [&'static str] {
    match role {
        Role::Admin => ALL_PERMISSIONS,
        Role::Dean => &[
            PROJECT_VIEW,
            PROJECT_MANAGE,
            PROJECT_COMMENT,
            FIELD_POOL_VIEW,
            FIELD_POOL_MANAGE,
            DEFENSE_COMMITTEE_VIEW,
            DEFENSE_COMMITTEE_MANAGE,
            FACULTY_VIEW,
            STUDENT_VIEW,
        ],
        Role::DepartmentHead => &[
            PROJECT_VIEW,
            PROJECT_MANAGE,
            PROJECT_COMMENT,
            PROPOSAL_REVIEW_HEAD,
            FIELD_POOL_VIEW,
            FIELD_POOL_MANAGE,
            LECTURER_SELECTION_REVIEW,
            STUDENT_SELECTION_REVIEW,
            DEFENSE_COMMITTEE_VIEW,
            DEFENSE_COMMITTEE_MANAGE,
            FACULTY_VIEW,
            STUDENT_VIEW,
        ],
        Role::Head => &[
            PROJECT_VIEW,
            PROJECT_COMMENT,
            PROPOSAL_REVIEW_HEAD,
            LECTURER_SELECTION_REVIEW,
            STUDENT_SELECTION_REVIEW,
            DEFENSE_COMMITTEE_VIEW,
        ],
        Role::Secretary => &[
            FIELD_POOL_VIEW,
            DEFENSE_COMMITTEE_VIEW,
            DEFENSE_COMMITTEE_MANAGE,
            FACULTY_VIEW,
            STUDENT_VIEW,
        ],
        Role::Lecturer => &[
            PROJECT_VIEW,
            PROJECT_COMMENT,
            PROPOSAL_REVIEW_ADVISOR,
            FIELD_POOL_VIEW,
            LECTURER_SELECTION_CREATE,
            STUDENT_SELECTION_REVIEW,
            DEFENSE_COMMITTEE_VIEW,
            DEFENSE_EVALUATE,
        ],
        Role::Student => &[
            PROJECT_VIEW,
            PROJECT_COMMENT,
            PROPOSAL_SUBMIT,
            FIELD_POOL_VIEW,
            STUDENT_SELECTION_CREATE,
        ],
    }
}

/// Union of the permissions of every role, deduplicated.
pub fn permissions_for<'a>(roles: impl IntoIterator<Item = &'a Role>) -> BTreeSet<&'static str> {
    roles
        .into_iter()
        .flat_map(|role| role_permissions(*role).iter().copied())
        .collect()
}

/// Basic roles in first-seen order without duplicates, plus `HEAD` once if
/// any division membership carries the head role.
pub fn derive_faculty_roles<'a>(
    basic: impl IntoIterator<Item = Role>,
    division_roles: impl IntoIterator<Item = &'a str>,
) -> Vec<Role> {
    let mut roles: Vec<Role> = Vec::new();
    for role in basic {
        if !roles.contains(&role) {
            roles.push(role);
        }
    }

    let heads_division = division_roles.into_iter().any(|r| r == DIVISION_HEAD);
    if heads_division && !roles.contains(&Role::Head) {
        roles.push(Role::Head);
    }

    roles
}
