use async_trait::async_trait;

use super::{AuthzMode, Identity};
use crate::errors::{AppError, AppResult};

/// Policy evaluator trait for pluggable authorization logic
#[async_trait]
pub trait PolicyEvaluator: Send + Sync {
    /// Check if the identity holds a permission
    async fn can(&self, identity: &Identity, permission: &str) -> bool;
}

/// Default evaluator: a permission is granted when the identity's derived
/// permission set contains it. There are no per-user grants and no scopes.
#[derive(Debug, Clone, Default)]
pub struct DefaultPolicyEvaluator;

impl DefaultPolicyEvaluator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PolicyEvaluator for DefaultPolicyEvaluator {
    async fn can(&self, identity: &Identity, permission: &str) -> bool {
        if identity.has_permission(permission) {
            tracing::debug!(
                user_id = %identity.id,
                permission = %permission,
                "permission match"
            );
            return true;
        }

        tracing::debug!(
            user_id = %identity.id,
            permission = %permission,
            "permission denied"
        );
        false
    }
}

/// Permission gate used by handlers.
pub async fn ensure_permission(
    evaluator: &dyn PolicyEvaluator,
    mode: AuthzMode,
    identity: &Identity,
    permission: &str,
) -> AppResult<()> {
    if mode == AuthzMode::Off {
        return Ok(());
    }

    if evaluator.can(identity, permission).await {
        return Ok(());
    }

    match mode {
        AuthzMode::Advisory => {
            tracing::warn!(
                user_id = %identity.id,
                permission = %permission,
                "advisory mode: permission denial ignored"
            );
            Ok(())
        }
        _ => Err(AppError::forbidden(format!("missing permission {permission}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::{permissions, Role};
    use uuid::Uuid;

    #[tokio::test]
    async fn derived_permission_allows() {
        let evaluator = DefaultPolicyEvaluator::new();
        let identity = Identity::faculty(Uuid::new_v4(), vec![Role::Lecturer], None);

        assert!(evaluator.can(&identity, permissions::PROPOSAL_REVIEW_ADVISOR).await);
        assert!(!evaluator.can(&identity, permissions::PROPOSAL_REVIEW_HEAD).await);
    }

    #[tokio::test]
    async fn strict_mode_forbids_missing_permission() {
        let evaluator = DefaultPolicyEvaluator::new();
        let identity = Identity::student(Uuid::new_v4(), None);

        let result = ensure_permission(
            &evaluator,
            AuthzMode::Strict,
            &identity,
            permissions::DEFENSE_COMMITTEE_MANAGE,
        )
        .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn advisory_and_off_modes_allow() {
        let evaluator = DefaultPolicyEvaluator::new();
        let identity = Identity::student(Uuid::new_v4(), None);

        for mode in [AuthzMode::Advisory, AuthzMode::Off] {
            let result = ensure_permission(
                &evaluator,
                mode,
                &identity,
                permissions::DEFENSE_COMMITTEE_MANAGE,
            )
            .await;
            assert!(result.is_ok(), "mode {mode:?}");
        }
    }
}
