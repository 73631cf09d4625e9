//! Cache Invalidation Helper
//!
//! Used by admin screens after a role or permission edit so already-open
//! sessions pick up the change without a reload.

use std::sync::Arc;

use crate::cache::PermissionCache;
use crate::identity::{IdentityProvider, resolve_identity};
use crate::resolver::PermissionResolver;

#[derive(Clone)]
pub struct PermissionCacheInvalidation {
    cache: PermissionCache,
    resolver: PermissionResolver,
    identity: Arc<dyn IdentityProvider>,
}

impl PermissionCacheInvalidation {
    pub fn new(
        cache: PermissionCache,
        resolver: PermissionResolver,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            cache,
            resolver,
            identity,
        }
    }

    /// Mark every permission-derived cache entry stale
    pub async fn invalidate_permission_cache(&self) {
        self.cache.invalidate_permissions().await;
    }

    /// Re-run the current user's permission fetch now
    ///
    /// No-op without a signed-in user.
    pub async fn refetch_user_permissions(&self) {
        let identity = resolve_identity(self.identity.as_ref()).await;
        let Some(user_id) = identity.settled_user_id() else {
            tracing::debug!("No signed-in user, skipping permission refetch");
            return;
        };

        let permissions = self
            .cache
            .refresh_user_permissions(user_id, &self.resolver)
            .await;
        tracing::info!(
            user_id = %user_id,
            count = permissions.permissions.len(),
            "Refetched user permissions"
        );
    }
}
