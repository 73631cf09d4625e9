//! Permission Resolver
//!
//! Turns a user id into [`UserPermissions`]:
//! 1. Profile without roles → pending approval (no dashboard)
//! 2. `SuperAdm` → every permission known to the backend
//! 3. Otherwise → union of every role's permissions plus `dashboard_view`
//!
//! Backend failures never propagate: the result degrades to "no access".

use std::sync::Arc;

use serde::Serialize;
use shared::models::{PermissionKey, RoleName};

use crate::backend::PermissionBackend;
use crate::error::AccessResult;
use crate::identity::Identity;
use crate::permissions::{MatchPolicy, PermissionSet};
use crate::security_log;

/// Permission granted to every approved user
pub const BASELINE_PERMISSION: PermissionKey = PermissionKey::DashboardView;

/// Resolved permissions of one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserPermissions {
    pub user_id: Option<String>,
    /// Primary role (`SuperAdm` for super-admins, else the first role)
    pub user_role: Option<RoleName>,
    pub roles: Vec<RoleName>,
    pub is_super_admin: bool,
    pub permissions: PermissionSet,
    pub can_access_dashboard: bool,
    pub is_loading: bool,
}

impl UserPermissions {
    /// Resolution in flight
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::denied(None)
        }
    }

    /// No access (anonymous, pending approval, or failed fetch)
    pub fn denied(user_id: Option<String>) -> Self {
        Self {
            user_id,
            user_role: None,
            roles: Vec::new(),
            is_super_admin: false,
            permissions: PermissionSet::new(),
            can_access_dashboard: false,
            is_loading: false,
        }
    }

    /// Settled user with no roles yet
    pub fn is_pending_approval(&self) -> bool {
        !self.is_loading && self.user_id.is_some() && self.roles.is_empty()
    }

    pub fn has_permission(&self, key: PermissionKey) -> bool {
        !self.is_loading && (self.is_super_admin || self.permissions.contains(key))
    }

    pub fn has_any_permission(&self, keys: &[PermissionKey]) -> bool {
        !self.is_loading && (self.is_super_admin || self.permissions.contains_any(keys))
    }

    pub fn has_all_permissions(&self, keys: &[PermissionKey]) -> bool {
        !self.is_loading && (self.is_super_admin || self.permissions.contains_all(keys))
    }

    /// Check `keys` under `policy` with the super-admin override
    pub fn satisfies(&self, keys: &[PermissionKey], policy: MatchPolicy) -> bool {
        !self.is_loading && (self.is_super_admin || self.permissions.satisfies(keys, policy))
    }
}

impl Default for UserPermissions {
    fn default() -> Self {
        Self::loading()
    }
}

/// Resolves user permissions against a [`PermissionBackend`]
#[derive(Clone)]
pub struct PermissionResolver {
    backend: Arc<dyn PermissionBackend>,
}

impl PermissionResolver {
    pub fn new(backend: Arc<dyn PermissionBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn PermissionBackend> {
        &self.backend
    }

    /// Resolve permissions, failing closed on backend errors
    pub async fn resolve(&self, user_id: &str) -> UserPermissions {
        match self.try_resolve(user_id).await {
            Ok(permissions) => permissions,
            Err(e) => {
                security_log!(
                    WARN,
                    "permission_fetch_failed",
                    user_id = %user_id,
                    error = %e
                );
                UserPermissions::denied(Some(user_id.to_string()))
            }
        }
    }

    /// Resolve permissions for an identity snapshot
    ///
    /// Loading identities stay loading; anonymous ones resolve to no access
    /// without touching the backend.
    pub async fn resolve_identity(&self, identity: &Identity) -> UserPermissions {
        if identity.is_loading {
            return UserPermissions::loading();
        }
        match identity.settled_user_id() {
            Some(user_id) => self.resolve(user_id).await,
            None => UserPermissions::denied(None),
        }
    }

    /// Resolve permissions, surfacing backend errors
    pub async fn try_resolve(&self, user_id: &str) -> AccessResult<UserPermissions> {
        let profile = match self.backend.fetch_profile(user_id).await? {
            Some(profile) if !profile.is_pending_approval() => profile,
            _ => {
                tracing::info!(user_id = %user_id, "User has no roles, awaiting approval");
                return Ok(UserPermissions::denied(Some(user_id.to_string())));
            }
        };

        let roles = profile.roles();
        let is_super_admin = roles.iter().any(RoleName::is_super_admin);

        let (user_role, permissions) = if is_super_admin {
            (Some(RoleName::super_admin()), self.all_permissions(user_id).await?)
        } else {
            (roles.first().cloned(), self.role_permissions(user_id, &roles).await?)
        };

        tracing::debug!(
            user_id = %user_id,
            role = ?user_role,
            super_admin = is_super_admin,
            count = permissions.len(),
            "Resolved user permissions"
        );

        Ok(UserPermissions {
            user_id: Some(user_id.to_string()),
            user_role,
            roles,
            is_super_admin,
            permissions,
            can_access_dashboard: true,
            is_loading: false,
        })
    }

    /// Every permission known to the backend, or the full catalog when the
    /// backend lists none
    async fn all_permissions(&self, user_id: &str) -> AccessResult<PermissionSet> {
        let rows = self.backend.fetch_all_permissions().await?;
        let set = parse_names(user_id, rows.iter().map(|p| p.nome_permissao.as_str()));
        if set.is_empty() {
            return Ok(PermissionSet::full());
        }
        Ok(set)
    }

    async fn role_permissions(
        &self,
        user_id: &str,
        roles: &[RoleName],
    ) -> AccessResult<PermissionSet> {
        let mut set = PermissionSet::from([BASELINE_PERMISSION]);

        for role in roles {
            let Some(row) = self.backend.fetch_role(role.as_str()).await? else {
                tracing::debug!(role = %role, "Role has no permission mapping");
                continue;
            };
            if row.permissoes.is_empty() {
                continue;
            }

            let rows = self.backend.fetch_permissions_by_ids(&row.permissoes).await?;
            set.extend(&parse_names(
                user_id,
                rows.iter().map(|p| p.nome_permissao.as_str()),
            ));
        }

        Ok(set)
    }
}

/// Parse backend permission names, logging and dropping unknown ones
fn parse_names<'a>(user_id: &str, names: impl Iterator<Item = &'a str>) -> PermissionSet {
    let (set, unknown) = PermissionSet::from_names(names);
    for name in unknown {
        tracing::warn!(user_id = %user_id, permission = %name, "Dropping unknown permission key");
    }
    set
}
