//! Access context
//!
//! Bundles the identity provider, the resolver and the shared cache so guards,
//! admin services and the invalidation helper all see the same state.

use std::sync::Arc;

use crate::admin::RoleAdminService;
use crate::backend::{PermissionBackend, RestBackend};
use crate::cache::PermissionCache;
use crate::config::AccessConfig;
use crate::error::AccessResult;
use crate::guard::{AccessDecision, GuardMount, Requirement, decide};
use crate::identity::{Identity, IdentityProvider, resolve_identity};
use crate::invalidation::PermissionCacheInvalidation;
use crate::resolver::{PermissionResolver, UserPermissions};

#[derive(Clone)]
pub struct AccessContext {
    identity: Arc<dyn IdentityProvider>,
    resolver: PermissionResolver,
    cache: PermissionCache,
}

impl AccessContext {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        backend: Arc<dyn PermissionBackend>,
        cache: PermissionCache,
    ) -> Self {
        Self {
            identity,
            resolver: PermissionResolver::new(backend),
            cache,
        }
    }

    /// Context over the hosted backend, which also serves the session
    pub fn from_config(config: &AccessConfig) -> AccessResult<Self> {
        let backend = Arc::new(RestBackend::new(config)?);
        tracing::info!(
            backend = %backend.base_url(),
            cache_ttl_secs = config.cache_ttl_secs,
            "Access context ready"
        );
        Ok(Self::new(
            backend.clone(),
            backend,
            PermissionCache::new(config.cache_ttl()),
        ))
    }

    pub fn identity_provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    pub fn backend(&self) -> &Arc<dyn PermissionBackend> {
        self.resolver.backend()
    }

    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    pub fn cache(&self) -> &PermissionCache {
        &self.cache
    }

    pub async fn current_identity(&self) -> Identity {
        resolve_identity(self.identity.as_ref()).await
    }

    /// Permissions of `identity`, through the cache
    pub async fn permissions_for(&self, identity: &Identity) -> UserPermissions {
        match identity.settled_user_id() {
            Some(user_id) => self.cache.user_permissions(user_id, &self.resolver).await,
            None => self.resolver.resolve_identity(identity).await,
        }
    }

    pub async fn current_permissions(&self) -> UserPermissions {
        let identity = self.current_identity().await;
        self.permissions_for(&identity).await
    }

    /// One-shot evaluation of `requirement` for the current session
    pub async fn evaluate(&self, requirement: &Requirement) -> AccessDecision {
        let identity = self.current_identity().await;
        if !requirement.needs_permissions() || identity.settled_user_id().is_none() {
            return decide(&identity, None, requirement);
        }

        let permissions = self.permissions_for(&identity).await;
        decide(&identity, Some(&permissions), requirement)
    }

    /// Start resolving `requirement` for a mounted guard
    ///
    /// Must be called from within a Tokio runtime; see [`AccessContext::mount_on`].
    pub fn mount(&self, requirement: Requirement) -> GuardMount {
        GuardMount::spawn(self.clone(), requirement)
    }

    /// Like [`AccessContext::mount`], spawning on an explicit runtime
    pub fn mount_on(&self, requirement: Requirement, runtime: &tokio::runtime::Handle) -> GuardMount {
        GuardMount::spawn_on(self.clone(), requirement, runtime)
    }

    pub fn invalidation(&self) -> PermissionCacheInvalidation {
        PermissionCacheInvalidation::new(
            self.cache.clone(),
            self.resolver.clone(),
            self.identity.clone(),
        )
    }

    pub fn admin(&self) -> RoleAdminService {
        RoleAdminService::new(self.clone())
    }

    /// Drop every cached entry
    pub async fn sign_out(&self) {
        self.cache.clear().await;
    }
}
