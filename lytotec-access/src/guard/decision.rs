//! Pure access decision

use serde::{Deserialize, Serialize};
use shared::models::PermissionKey;

use super::shell::{GuardPhase, Redirect};
use crate::identity::Identity;
use crate::permissions::MatchPolicy;
use crate::resolver::UserPermissions;

/// What a guard requires before rendering its children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Requirement {
    /// A signed-in user
    Authenticated,
    /// An approved user (`can_access_dashboard`)
    Dashboard,
    /// Permission keys combined under `policy`
    Permissions {
        keys: Vec<PermissionKey>,
        #[serde(default)]
        policy: MatchPolicy,
    },
}

impl Requirement {
    pub fn permission(key: PermissionKey) -> Self {
        Self::Permissions {
            keys: vec![key],
            policy: MatchPolicy::Any,
        }
    }

    pub fn any(keys: impl IntoIterator<Item = PermissionKey>) -> Self {
        Self::Permissions {
            keys: keys.into_iter().collect(),
            policy: MatchPolicy::Any,
        }
    }

    pub fn all(keys: impl IntoIterator<Item = PermissionKey>) -> Self {
        Self::Permissions {
            keys: keys.into_iter().collect(),
            policy: MatchPolicy::All,
        }
    }

    /// Whether evaluating this requirement needs resolved permissions
    pub fn needs_permissions(&self) -> bool {
        !matches!(self, Self::Authenticated)
    }
}

/// Outcome of one guard evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    /// Identity or permissions still loading
    Resolving,
    Allow,
    /// No session; goes to the login route
    DenyUnauthenticated,
    /// Signed in without the required access; goes to the waiting-approval route
    DenyUnauthorized,
}

impl AccessDecision {
    pub fn can_access(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Resolving)
    }

    pub fn redirect(&self) -> Option<Redirect> {
        match self {
            Self::DenyUnauthenticated => Some(Redirect::Login),
            Self::DenyUnauthorized => Some(Redirect::WaitingApproval),
            Self::Resolving | Self::Allow => None,
        }
    }

    pub fn phase(&self) -> GuardPhase {
        match self {
            Self::Resolving => GuardPhase::Resolving,
            Self::Allow => GuardPhase::Rendering,
            Self::DenyUnauthenticated | Self::DenyUnauthorized => GuardPhase::Redirecting,
        }
    }
}

/// Decide access for `identity` against `requirement`
///
/// `permissions` is `None` until the first resolution completes. Permissions
/// that belong to another user than `identity` count as not yet resolved.
pub fn decide(
    identity: &Identity,
    permissions: Option<&UserPermissions>,
    requirement: &Requirement,
) -> AccessDecision {
    if identity.is_loading {
        return AccessDecision::Resolving;
    }
    if !identity.is_authenticated {
        return AccessDecision::DenyUnauthenticated;
    }
    if !requirement.needs_permissions() {
        return AccessDecision::Allow;
    }

    let permissions = match permissions {
        Some(p) if !p.is_loading && p.user_id == identity.user_id => p,
        _ => return AccessDecision::Resolving,
    };

    if permissions.is_super_admin {
        return AccessDecision::Allow;
    }

    let granted = match requirement {
        Requirement::Authenticated => true,
        Requirement::Dashboard => permissions.can_access_dashboard,
        Requirement::Permissions { keys, .. } if keys.is_empty() => {
            permissions.can_access_dashboard
        }
        Requirement::Permissions { keys, policy } => permissions.satisfies(keys, *policy),
    };

    if granted {
        AccessDecision::Allow
    } else {
        AccessDecision::DenyUnauthorized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::PermissionSet;
    use PermissionKey::*;

    fn user(roles_perms: &[PermissionKey]) -> UserPermissions {
        UserPermissions {
            user_id: Some("u-1".into()),
            user_role: Some("Apontador".into()),
            roles: vec!["Apontador".into()],
            is_super_admin: false,
            permissions: roles_perms.iter().copied().collect(),
            can_access_dashboard: true,
            is_loading: false,
        }
    }

    fn super_admin() -> UserPermissions {
        UserPermissions {
            is_super_admin: true,
            permissions: PermissionSet::new(),
            ..user(&[])
        }
    }

    #[test]
    fn test_loading_identity_resolves() {
        let decision = decide(&Identity::loading(), Some(&super_admin()), &Requirement::Dashboard);
        assert_eq!(decision, AccessDecision::Resolving);
        assert_eq!(decision.redirect(), None);
    }

    #[test]
    fn test_unauthenticated_always_goes_to_login() {
        let anon = Identity::anonymous();
        for requirement in [
            Requirement::Authenticated,
            Requirement::Dashboard,
            Requirement::permission(AdminPermissoesView),
        ] {
            for perms in [None, Some(super_admin()), Some(UserPermissions::loading())] {
                let decision = decide(&anon, perms.as_ref(), &requirement);
                assert_eq!(decision, AccessDecision::DenyUnauthenticated);
                assert_eq!(decision.redirect(), Some(Redirect::Login));
            }
        }
    }

    #[test]
    fn test_identity_only_guard_ignores_permissions() {
        let identity = Identity::authenticated("u-1");
        assert_eq!(
            decide(&identity, None, &Requirement::Authenticated),
            AccessDecision::Allow
        );
    }

    #[test]
    fn test_missing_or_loading_permissions_resolve() {
        let identity = Identity::authenticated("u-1");
        let requirement = Requirement::Dashboard;
        assert_eq!(decide(&identity, None, &requirement), AccessDecision::Resolving);
        assert_eq!(
            decide(&identity, Some(&UserPermissions::loading()), &requirement),
            AccessDecision::Resolving
        );
    }

    #[test]
    fn test_permissions_of_another_user_resolve() {
        let identity = Identity::authenticated("u-2");
        assert_eq!(
            decide(&identity, Some(&user(&[DashboardView])), &Requirement::Dashboard),
            AccessDecision::Resolving
        );
    }

    #[test]
    fn test_apontador_cannot_open_permission_admin() {
        let identity = Identity::authenticated("u-1");
        let perms = user(&[DashboardView, RequisicoesApontamentoEquipeView]);
        let decision = decide(
            &identity,
            Some(&perms),
            &Requirement::permission(AdminPermissoesView),
        );
        assert_eq!(decision, AccessDecision::DenyUnauthorized);
        assert!(!decision.can_access());
        assert_eq!(decision.redirect(), Some(Redirect::WaitingApproval));
    }

    #[test]
    fn test_super_admin_with_empty_permissions_is_allowed() {
        let identity = Identity::authenticated("u-1");
        for requirement in [
            Requirement::Dashboard,
            Requirement::permission(AdminPermissoesView),
            Requirement::all(PermissionKey::ALL.iter().copied()),
        ] {
            assert_eq!(
                decide(&identity, Some(&super_admin()), &requirement),
                AccessDecision::Allow
            );
        }
    }

    #[test]
    fn test_any_and_all_policies() {
        let identity = Identity::authenticated("u-1");
        let perms = user(&[DashboardView, GestaoRhEquipesView]);

        let any = Requirement::any([GestaoRhEquipesView, AdminPermissoesView]);
        let all = Requirement::all([GestaoRhEquipesView, AdminPermissoesView]);
        assert_eq!(decide(&identity, Some(&perms), &any), AccessDecision::Allow);
        assert_eq!(
            decide(&identity, Some(&perms), &all),
            AccessDecision::DenyUnauthorized
        );
    }

    #[test]
    fn test_pending_user_is_unauthorized() {
        let identity = Identity::authenticated("u-1");
        let pending = UserPermissions::denied(Some("u-1".into()));
        assert_eq!(
            decide(&identity, Some(&pending), &Requirement::Dashboard),
            AccessDecision::DenyUnauthorized
        );
        assert_eq!(
            decide(&identity, Some(&pending), &Requirement::any(Vec::<PermissionKey>::new())),
            AccessDecision::DenyUnauthorized
        );
        assert_eq!(
            decide(&identity, Some(&user(&[])), &Requirement::any(Vec::<PermissionKey>::new())),
            AccessDecision::Allow
        );
    }

    #[test]
    fn test_requirement_serialization() {
        let json = serde_json::to_value(Requirement::all([DashboardView])).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "permissions", "keys": ["dashboard_view"], "policy": "all" })
        );
    }
}
