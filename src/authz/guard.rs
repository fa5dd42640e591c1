//! Route protection
//!
//! Two layers: an edge middleware that only checks a token is present, and a
//! role guard that decides whether a page/route may be shown to an identity.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use super::{AuthzMode, Identity, Role};
use crate::errors::{AppError, AppResult};
use crate::jwt::token_from_headers;

pub const LOGIN_ROUTE: &str = "/login";
pub const ACCESS_DENIED_ROUTE: &str = "/access-denied";

/// Role requirement of a view: one role or a list of acceptable roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleRequirement {
    One(Role),
    AnyOf(Vec<Role>),
}

impl RoleRequirement {
    pub fn roles(&self) -> &[Role] {
        match self {
            RoleRequirement::One(role) => std::slice::from_ref(role),
            RoleRequirement::AnyOf(roles) => roles,
        }
    }

    /// An empty list admits any authenticated identity.
    pub fn is_met_by(&self, identity: &Identity) -> bool {
        let roles = self.roles();
        roles.is_empty() || identity.has_any_role(roles)
    }
}

impl From<Role> for RoleRequirement {
    fn from(role: Role) -> Self {
        RoleRequirement::One(role)
    }
}

impl From<Vec<Role>> for RoleRequirement {
    fn from(roles: Vec<Role>) -> Self {
        RoleRequirement::AnyOf(roles)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "to", rename_all = "lowercase")]
pub enum GuardDecision {
    Render,
    Redirect(String),
}

/// Decides what a role-protected view does for the current identity.
pub fn evaluate(identity: Option<&Identity>, requirement: &RoleRequirement, mode: AuthzMode) -> GuardDecision {
    let Some(identity) = identity else {
        return GuardDecision::Redirect(LOGIN_ROUTE.to_string());
    };

    if requirement.is_met_by(identity) {
        return GuardDecision::Render;
    }

    match mode {
        AuthzMode::Strict => {
            tracing::debug!(user_id = %identity.id, required = ?requirement.roles(), "role guard redirect");
            GuardDecision::Redirect(ACCESS_DENIED_ROUTE.to_string())
        }
        AuthzMode::Advisory => {
            tracing::warn!(user_id = %identity.id, required = ?requirement.roles(), "advisory mode: role guard bypassed");
            GuardDecision::Render
        }
        AuthzMode::Off => GuardDecision::Render,
    }
}

/// Server-side role check: Forbidden where the view guard would redirect.
pub fn require_roles(identity: &Identity, requirement: &RoleRequirement, mode: AuthzMode) -> AppResult<()> {
    match evaluate(Some(identity), requirement, mode) {
        GuardDecision::Render => Ok(()),
        GuardDecision::Redirect(_) => Err(AppError::forbidden(format!(
            "requires one of {:?}",
            requirement.roles()
        ))),
    }
}

/// Edge check: a bearer token or `accessToken` cookie must be present.
/// The token itself is validated later by the `Identity` extractor.
pub async fn require_session(request: Request, next: Next) -> Response {
    if token_from_headers(request.headers()).is_none() {
        return AppError::unauthorized("Authorization header missing").into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn lecturer() -> Identity {
        Identity::faculty(Uuid::new_v4(), vec![Role::Lecturer], None)
    }

    #[test]
    fn missing_identity_redirects_to_login() {
        let decision = evaluate(None, &Role::Admin.into(), AuthzMode::Off);
        assert_eq!(decision, GuardDecision::Redirect(LOGIN_ROUTE.to_string()));
    }

    #[test]
    fn matching_role_renders() {
        let req: RoleRequirement = vec![Role::Dean, Role::Lecturer].into();
        assert_eq!(evaluate(Some(&lecturer()), &req, AuthzMode::Strict), GuardDecision::Render);
    }

    #[test]
    fn strict_mode_redirects_without_intersection() {
        let req: RoleRequirement = Role::Admin.into();
        assert_eq!(
            evaluate(Some(&lecturer()), &req, AuthzMode::Strict),
            GuardDecision::Redirect(ACCESS_DENIED_ROUTE.to_string())
        );
        assert!(matches!(
            require_roles(&lecturer(), &req, AuthzMode::Strict),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn off_and_advisory_modes_render_anyway() {
        let req: RoleRequirement = Role::Admin.into();
        assert_eq!(evaluate(Some(&lecturer()), &req, AuthzMode::Off), GuardDecision::Render);
        assert_eq!(evaluate(Some(&lecturer()), &req, AuthzMode::Advisory), GuardDecision::Render);
    }

    #[test]
    fn empty_requirement_admits_any_identity() {
        let req = RoleRequirement::AnyOf(Vec::new());
        assert_eq!(evaluate(Some(&lecturer()), &req, AuthzMode::Strict), GuardDecision::Render);
    }

    #[test]
    fn requirement_accepts_single_role_or_list() {
        let one: RoleRequirement = serde_json::from_str("\"ADMIN\"").unwrap();
        let many: RoleRequirement = serde_json::from_str("[\"DEAN\",\"HEAD\"]").unwrap();
        assert_eq!(one, RoleRequirement::One(Role::Admin));
        assert_eq!(many, RoleRequirement::AnyOf(vec![Role::Dean, Role::Head]));
    }

    #[test]
    fn decision_serializes_with_target() {
        let v = serde_json::to_value(GuardDecision::Redirect("/access-denied".into())).unwrap();
        assert_eq!(v, serde_json::json!({"decision": "redirect", "to": "/access-denied"}));
        let v = serde_json::to_value(GuardDecision::Render).unwrap();
        assert_eq!(v, serde_json::json!({"decision": "render"}));
    }
}
