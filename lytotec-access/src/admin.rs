//! Role administration
//!
//! Writes role assignments and role permission sets, then invalidates the
//! shared cache and refetches the acting user's permissions. Every operation
//! requires `admin_permissoes_view` (or `SuperAdm`).

use shared::error::{AppError, ErrorCode};
use shared::models::{FuncaoPermissao, PermissionKey};

use crate::context::AccessContext;
use crate::error::AccessResult;
use crate::security_log;
use crate::validation::{clean_role_list, validate_role_assignment, validate_role_removal};

/// Permission required to administer roles
pub const ADMIN_PERMISSION: PermissionKey = PermissionKey::AdminPermissoesView;

pub struct RoleAdminService {
    context: AccessContext,
}

impl RoleAdminService {
    pub fn new(context: AccessContext) -> Self {
        Self { context }
    }

    /// Role rows, through the cache
    pub async fn roles(&self) -> AccessResult<Vec<FuncaoPermissao>> {
        self.authorize().await?;
        self.context.cache().roles(self.context.backend().as_ref()).await
    }

    /// Distinct role names, through the cache
    pub async fn available_functions(&self) -> AccessResult<Vec<String>> {
        self.authorize().await?;
        self.context
            .cache()
            .available_functions(self.context.backend().as_ref())
            .await
    }

    /// Roles stored for `user_id`, through the cache
    pub async fn user_roles(&self, user_id: &str) -> AccessResult<Vec<String>> {
        self.authorize().await?;
        let profile = self
            .context
            .cache()
            .profile(user_id, self.context.backend().as_ref())
            .await?
            .ok_or_else(|| profile_not_found(user_id))?;
        Ok(profile.funcoes.unwrap_or_default())
    }

    /// Add `role` to a user; returns the stored role list
    pub async fn assign_role(&self, user_id: &str, role: &str) -> AccessResult<Vec<String>> {
        let admin_id = self.authorize().await?;
        let current = self.current_roles(user_id).await?;
        validate_role_assignment(&current, role)?;

        let role = role.trim();
        if self.context.backend().fetch_role(role).await?.is_none() {
            tracing::warn!(role = %role, "Assigning role without a permission mapping");
        }

        let roles = clean_role_list(current.iter().map(String::as_str).chain([role]));
        self.context
            .backend()
            .update_profile_roles(user_id, &roles)
            .await?;

        security_log!(
            INFO,
            "role_assigned",
            admin_id = %admin_id,
            user_id = %user_id,
            role = %role
        );
        self.after_write().await;
        Ok(roles)
    }

    /// Remove `role` from a user; returns the stored role list
    pub async fn remove_role(&self, user_id: &str, role: &str) -> AccessResult<Vec<String>> {
        let admin_id = self.authorize().await?;
        let current = self.current_roles(user_id).await?;
        validate_role_removal(&current, role)?;

        let role = role.trim();
        let roles = clean_role_list(current.iter().filter(|r| r.as_str() != role));
        self.context
            .backend()
            .update_profile_roles(user_id, &roles)
            .await?;

        security_log!(
            INFO,
            "role_removed",
            admin_id = %admin_id,
            user_id = %user_id,
            role = %role
        );
        self.after_write().await;
        Ok(roles)
    }

    /// Replace the permission set of a role
    pub async fn set_role_permissions(
        &self,
        role_name: &str,
        keys: &[PermissionKey],
    ) -> AccessResult<()> {
        let admin_id = self.authorize().await?;
        let backend = self.context.backend();

        let role = backend
            .fetch_role(role_name)
            .await?
            .ok_or_else(|| AppError::role_not_found(role_name))?;

        let catalog = backend.fetch_all_permissions().await?;
        let mut ids = Vec::with_capacity(keys.len());
        for key in keys {
            let row = catalog
                .iter()
                .find(|p| p.nome_permissao == key.as_str())
                .ok_or_else(|| {
                    AppError::with_message(
                        ErrorCode::UnknownPermission,
                        format!("Permission '{}' does not exist in the backend", key),
                    )
                })?;
            if !ids.contains(&row.id) {
                ids.push(row.id.clone());
            }
        }

        backend.update_role_permissions(&role.id, &ids).await?;

        security_log!(
            INFO,
            "role_permissions_updated",
            admin_id = %admin_id,
            role = %role_name,
            count = ids.len()
        );
        self.after_write().await;
        Ok(())
    }

    /// Require a signed-in administrator; returns their user id
    async fn authorize(&self) -> AccessResult<String> {
        let identity = self.context.current_identity().await;
        let Some(user_id) = identity.settled_user_id() else {
            return Err(AppError::not_authenticated().into());
        };

        let permissions = self.context.permissions_for(&identity).await;
        if !permissions.has_permission(ADMIN_PERMISSION) {
            security_log!(
                WARN,
                "admin_access_denied",
                user_id = %user_id,
                required = %ADMIN_PERMISSION
            );
            return Err(AppError::new(ErrorCode::AdminRequired).into());
        }
        Ok(user_id.to_string())
    }

    async fn current_roles(&self, user_id: &str) -> AccessResult<Vec<String>> {
        let profile = self
            .context
            .backend()
            .fetch_profile(user_id)
            .await?
            .ok_or_else(|| profile_not_found(user_id))?;
        Ok(profile.funcoes.unwrap_or_default())
    }

    async fn after_write(&self) {
        let invalidation = self.context.invalidation();
        invalidation.invalidate_permission_cache().await;
        invalidation.refetch_user_permissions().await;
    }
}

fn profile_not_found(user_id: &str) -> AppError {
    AppError::with_message(
        ErrorCode::ProfileNotFound,
        format!("Profile {} not found", user_id),
    )
    .with_detail("user_id", user_id)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::cache::PermissionCache;
    use crate::error::AccessError;
    use crate::identity::{SessionUser, StaticIdentity};

    fn setup(actor: &str) -> (Arc<InMemoryBackend>, AccessContext) {
        let backend = Arc::new(InMemoryBackend::with_catalog());
        backend.insert_role("Gestor", &[ADMIN_PERMISSION]);
        backend.insert_role("Apontador", &[PermissionKey::RequisicoesApontamentoEquipeView]);
        backend.insert_role("Encarregado", &[PermissionKey::GestaoRhEquipesView]);
        backend.insert_user("admin", &["Gestor"]);
        backend.insert_user("root", &["SuperAdm"]);
        backend.insert_user("u-1", &["Apontador"]);
        backend.insert_user("new", &[]);
        let ctx = AccessContext::new(
            Arc::new(StaticIdentity::signed_in(SessionUser::new(actor))),
            backend.clone(),
            PermissionCache::default(),
        );
        (backend, ctx)
    }

    fn code(err: AccessError) -> ErrorCode {
        err.code()
    }

    #[tokio::test]
    async fn test_non_admin_is_rejected() {
        let (backend, ctx) = setup("u-1");
        let err = ctx.admin().assign_role("new", "Apontador").await.unwrap_err();
        assert_eq!(code(err), ErrorCode::AdminRequired);
        assert_eq!(backend.profile_roles("new"), Some(vec![]));
    }

    #[tokio::test]
    async fn test_assign_and_remove_roles() {
        let (backend, ctx) = setup("admin");
        let admin = ctx.admin();

        let roles = admin.assign_role("new", "Apontador").await.unwrap();
        assert_eq!(roles, vec!["Apontador".to_string()]);

        let roles = admin.assign_role("new", "Encarregado").await.unwrap();
        assert_eq!(roles, vec!["Apontador".to_string(), "Encarregado".to_string()]);

        let roles = admin.remove_role("new", "Apontador").await.unwrap();
        assert_eq!(roles, vec!["Encarregado".to_string()]);
        assert_eq!(backend.profile_roles("new"), Some(roles));

        let err = admin.remove_role("new", "Encarregado").await.unwrap_err();
        assert_eq!(code(err), ErrorCode::LastRoleRemoval);
    }

    #[tokio::test]
    async fn test_role_names_are_trimmed_on_both_writes() {
        let (backend, ctx) = setup("admin");
        let admin = ctx.admin();

        admin.assign_role("u-1", "  Encarregado ").await.unwrap();
        let roles = admin.remove_role("u-1", " Apontador").await.unwrap();
        assert_eq!(roles, vec!["Encarregado".to_string()]);
        assert_eq!(backend.profile_roles("u-1"), Some(roles));
    }

    #[tokio::test]
    async fn test_assignment_rules_are_enforced() {
        let (_, ctx) = setup("root");
        let admin = ctx.admin();

        let err = admin.assign_role("u-1", "Apontador").await.unwrap_err();
        assert_eq!(code(err), ErrorCode::RoleAlreadyAssigned);

        let err = admin.assign_role("u-1", "SuperAdm").await.unwrap_err();
        assert_eq!(code(err), ErrorCode::RoleConflict);

        let err = admin.assign_role("ghost", "Apontador").await.unwrap_err();
        assert_eq!(code(err), ErrorCode::ProfileNotFound);
    }

    #[tokio::test]
    async fn test_set_role_permissions_refreshes_sessions() {
        let (_, ctx) = setup("admin");
        let before = ctx.current_permissions().await;
        assert!(!before.has_permission(PermissionKey::DashboardRhView));

        ctx.admin()
            .set_role_permissions("Gestor", &[ADMIN_PERMISSION, PermissionKey::DashboardRhView])
            .await
            .unwrap();

        let cached = ctx.cache().peek_user_permissions("admin").await.unwrap();
        assert!(cached.has_permission(PermissionKey::DashboardRhView));
    }

    #[tokio::test]
    async fn test_set_role_permissions_unknown_role() {
        let (_, ctx) = setup("admin");
        let err = ctx
            .admin()
            .set_role_permissions("Fantasma", &[PermissionKey::DashboardView])
            .await
            .unwrap_err();
        assert_eq!(code(err), ErrorCode::RoleNotFound);
    }

    #[tokio::test]
    async fn test_role_listing() {
        let (_, ctx) = setup("admin");
        let admin = ctx.admin();
        assert_eq!(
            admin.available_functions().await.unwrap(),
            vec!["Apontador", "Encarregado", "Gestor"]
        );
        assert_eq!(admin.roles().await.unwrap().len(), 3);
        assert_eq!(admin.user_roles("u-1").await.unwrap(), vec!["Apontador"]);
    }
}
