//! In-memory permission backend

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::models::{FuncaoPermissao, Permissao, PermissionKey, Profile};

use super::PermissionBackend;
use crate::error::{AccessError, AccessResult};

#[derive(Debug, Default)]
struct Tables {
    profiles: HashMap<String, Profile>,
    /// Keyed by role name
    roles: HashMap<String, FuncaoPermissao>,
    /// Keyed by permission id
    permissions: HashMap<String, Permissao>,
}

/// In-memory backend
///
/// Counts profile fetches (one per permission resolution) and can be switched
/// into a failing mode to exercise the fail-closed paths.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    tables: RwLock<Tables>,
    profile_fetches: AtomicUsize,
    role_list_fetches: AtomicUsize,
    failing: RwLock<Option<String>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend seeded with one permission row per catalog key
    ///
    /// Permission ids equal the key names.
    pub fn with_catalog() -> Self {
        let backend = Self::new();
        {
            let mut tables = backend.tables.write();
            for key in PermissionKey::ALL {
                tables.permissions.insert(
                    key.as_str().to_string(),
                    Permissao {
                        id: key.as_str().to_string(),
                        nome_permissao: key.as_str().to_string(),
                        descricao: None,
                    },
                );
            }
        }
        backend
    }

    pub fn insert_profile(&self, profile: Profile) {
        self.tables
            .write()
            .profiles
            .insert(profile.id.clone(), profile);
    }

    /// Insert a user holding `roles`
    pub fn insert_user(&self, user_id: &str, roles: &[&str]) {
        self.insert_profile(Profile {
            id: user_id.to_string(),
            email: None,
            nome_completo: None,
            funcoes: Some(roles.iter().map(|r| r.to_string()).collect()),
        });
    }

    pub fn insert_permission(&self, permission: Permissao) {
        self.tables
            .write()
            .permissions
            .insert(permission.id.clone(), permission);
    }

    /// Insert a role whose permission ids are the names of `keys`
    ///
    /// Assumes the catalog seeding of [`InMemoryBackend::with_catalog`].
    pub fn insert_role(&self, role_name: &str, keys: &[PermissionKey]) {
        self.tables.write().roles.insert(
            role_name.to_string(),
            FuncaoPermissao {
                id: format!("role-{}", role_name),
                nome_funcao: role_name.to_string(),
                descricao: None,
                permissoes: keys.iter().map(|k| k.as_str().to_string()).collect(),
            },
        );
    }

    /// Make every call fail with a backend error until [`InMemoryBackend::recover`]
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failing.write() = Some(message.into());
    }

    pub fn recover(&self) {
        *self.failing.write() = None;
    }

    /// Number of profile fetches served so far
    pub fn profile_fetches(&self) -> usize {
        self.profile_fetches.load(Ordering::SeqCst)
    }

    /// Number of full role-list fetches served so far
    pub fn role_list_fetches(&self) -> usize {
        self.role_list_fetches.load(Ordering::SeqCst)
    }

    /// Roles currently stored for a user
    pub fn profile_roles(&self, user_id: &str) -> Option<Vec<String>> {
        self.tables
            .read()
            .profiles
            .get(user_id)
            .and_then(|p| p.funcoes.clone())
    }

    fn check_available(&self) -> AccessResult<()> {
        match self.failing.read().as_ref() {
            Some(message) => Err(AccessError::Backend(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PermissionBackend for InMemoryBackend {
    async fn fetch_profile(&self, user_id: &str) -> AccessResult<Option<Profile>> {
        self.profile_fetches.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.tables.read().profiles.get(user_id).cloned())
    }

    async fn fetch_role(&self, role_name: &str) -> AccessResult<Option<FuncaoPermissao>> {
        self.check_available()?;
        Ok(self.tables.read().roles.get(role_name).cloned())
    }

    async fn fetch_permissions_by_ids(&self, ids: &[String]) -> AccessResult<Vec<Permissao>> {
        self.check_available()?;
        let tables = self.tables.read();
        Ok(ids
            .iter()
            .filter_map(|id| tables.permissions.get(id).cloned())
            .collect())
    }

    async fn fetch_all_permissions(&self) -> AccessResult<Vec<Permissao>> {
        self.check_available()?;
        let mut rows: Vec<_> = self.tables.read().permissions.values().cloned().collect();
        rows.sort_by(|a, b| a.nome_permissao.cmp(&b.nome_permissao));
        Ok(rows)
    }

    async fn fetch_all_roles(&self) -> AccessResult<Vec<FuncaoPermissao>> {
        self.role_list_fetches.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let mut rows: Vec<_> = self.tables.read().roles.values().cloned().collect();
        rows.sort_by(|a, b| a.nome_funcao.cmp(&b.nome_funcao));
        Ok(rows)
    }

    async fn update_profile_roles(&self, user_id: &str, roles: &[String]) -> AccessResult<()> {
        self.check_available()?;
        let mut tables = self.tables.write();
        let profile = tables
            .profiles
            .get_mut(user_id)
            .ok_or_else(|| AccessError::NotFound(format!("profile {}", user_id)))?;
        profile.funcoes = Some(roles.to_vec());
        Ok(())
    }

    async fn update_role_permissions(
        &self,
        role_id: &str,
        permission_ids: &[String],
    ) -> AccessResult<()> {
        self.check_available()?;
        let mut tables = self.tables.write();
        let role = tables
            .roles
            .values_mut()
            .find(|r| r.id == role_id)
            .ok_or_else(|| AccessError::NotFound(format!("role {}", role_id)))?;
        role.permissoes = permission_ids.to_vec();
        Ok(())
    }
}
