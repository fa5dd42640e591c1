//! Authorization: roles, permissions, identities and guards
//!
//! This module implements:
//! - the static role -> permission table
//! - identity derivation helpers (HEAD inferred from division membership)
//! - role guards and permission gates
//! - configurable enforcement modes (off/advisory/strict)

mod evaluator;
pub mod guard;
mod identity;
pub mod roles;

pub use evaluator::{ensure_permission, DefaultPolicyEvaluator, PolicyEvaluator};
pub use guard::{require_roles, GuardDecision, RoleRequirement};
pub use identity::{Identity, UserType};
pub use roles::{derive_faculty_roles, permissions_for, role_permissions, Role, DIVISION_HEAD};

/// Authorization enforcement mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthzMode {
    /// Historical behaviour: role guards render, the comment special-role
    /// escape always passes, permission gates are open
    Off,
    /// Log denials but allow requests
    Advisory,
    /// Enforce 403 / redirect on denied requests
    #[default]
    Strict,
}

impl AuthzMode {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("AUTHZ_MODE").unwrap_or_default())
    }

    /// Unknown or empty values fall back to `Strict`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "off" => AuthzMode::Off,
            "advisory" => AuthzMode::Advisory,
            _ => AuthzMode::Strict,
        }
    }
}

/// Well-known permission names
pub mod permissions {
    // Project
    pub const PROJECT_VIEW: &str = "project.view";
    pub const PROJECT_MANAGE: &str = "project.manage";
    pub const PROJECT_COMMENT: &str = "project.comment";

    // Proposed project
    pub const PROPOSAL_SUBMIT: &str = "proposal.submit";
    pub const PROPOSAL_REVIEW_ADVISOR: &str = "proposal.review_advisor";
    pub const PROPOSAL_REVIEW_HEAD: &str = "proposal.review_head";

    // Field pool
    pub const FIELD_POOL_VIEW: &str = "field_pool.view";
    pub const FIELD_POOL_MANAGE: &str = "field_pool.manage";

    // Selections
    pub const LECTURER_SELECTION_CREATE: &str = "lecturer_selection.create";
    pub const LECTURER_SELECTION_REVIEW: &str = "lecturer_selection.review";
    pub const STUDENT_SELECTION_CREATE: &str = "student_selection.create";
    pub const STUDENT_SELECTION_REVIEW: &str = "student_selection.review";

    // Defense
    pub const DEFENSE_COMMITTEE_VIEW: &str = "defense_committee.view";
    pub const DEFENSE_COMMITTEE_MANAGE: &str = "defense_committee.manage";
    pub const DEFENSE_EVALUATE: &str = "defense.evaluate";

    // Accounts
    pub const FACULTY_VIEW: &str = "faculty.view";
    pub const STUDENT_VIEW: &str = "student.view";
    pub const USER_MANAGE: &str = "user.manage";

    pub const ALL_PERMISSIONS: &[&str] = &[
        PROJECT_VIEW,
        PROJECT_MANAGE,
        PROJECT_COMMENT,
        PROPOSAL_SUBMIT,
        PROPOSAL_REVIEW_ADVISOR,
        PROPOSAL_REVIEW_HEAD,
        FIELD_POOL_VIEW,
        FIELD_POOL_MANAGE,
        LECTURER_SELECTION_CREATE,
        LECTURER_SELECTION_REVIEW,
        STUDENT_SELECTION_CREATE,
        STUDENT_SELECTION_REVIEW,
        DEFENSE_COMMITTEE_VIEW,
        DEFENSE_COMMITTEE_MANAGE,
        DEFENSE_EVALUATE,
        FACULTY_VIEW,
        STUDENT_VIEW,
        USER_MANAGE,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_defaults_to_strict() {
        assert_eq!(AuthzMode::parse(""), AuthzMode::Strict);
        assert_eq!(AuthzMode::parse("bogus"), AuthzMode::Strict);
        assert_eq!(AuthzMode::default(), AuthzMode::Strict);
    }

    #[test]
    fn mode_parses_known_values() {
        assert_eq!(AuthzMode::parse("OFF"), AuthzMode::Off);
        assert_eq!(AuthzMode::parse(" advisory "), AuthzMode::Advisory);
        assert_eq!(AuthzMode::parse("strict"), AuthzMode::Strict);
    }
}
