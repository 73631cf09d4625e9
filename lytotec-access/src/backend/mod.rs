//! Permission backend boundary
//!
//! Role and permission rows live in the hosted backend:
//! - `profiles.funcoes` → role names per user
//! - `bd_funcoes_permissao` → permission ids per role
//! - `bd_permissoes` → permission names
//!
//! Implementations:
//! - [`RestBackend`] - PostgREST over HTTP
//! - [`InMemoryBackend`] - in-process tables for tests and offline shells

mod memory;
mod rest;

use async_trait::async_trait;
use shared::models::{FuncaoPermissao, Permissao, Profile};

use crate::error::AccessResult;

pub use memory::InMemoryBackend;
pub use rest::RestBackend;

/// Queries and admin writes against the role/permission tables
#[async_trait]
pub trait PermissionBackend: Send + Sync {
    /// Profile of a user, `None` when the row does not exist
    async fn fetch_profile(&self, user_id: &str) -> AccessResult<Option<Profile>>;

    /// Role row by name, `None` when the role has no mapping
    async fn fetch_role(&self, role_name: &str) -> AccessResult<Option<FuncaoPermissao>>;

    /// Permission rows for the given ids
    async fn fetch_permissions_by_ids(&self, ids: &[String]) -> AccessResult<Vec<Permissao>>;

    /// Every permission row
    async fn fetch_all_permissions(&self) -> AccessResult<Vec<Permissao>>;

    /// Every role row
    async fn fetch_all_roles(&self) -> AccessResult<Vec<FuncaoPermissao>>;

    /// Replace the role names of a user
    async fn update_profile_roles(&self, user_id: &str, roles: &[String]) -> AccessResult<()>;

    /// Replace the permission ids of a role
    async fn update_role_permissions(
        &self,
        role_id: &str,
        permission_ids: &[String],
    ) -> AccessResult<()>;
}
