//! Shared permission cache
//!
//! One explicit cache object is shared (by cheap clone) between guards,
//! admin screens and the invalidation helper. Entries follow an
//! "invalidate on write, lazily refetch on read" lifecycle:
//! - a read returns the entry while it is fresh (younger than the TTL and
//!   not marked stale)
//! - otherwise the read fetches, stores and returns a new value
//!
//! Fetches are single-flight per entry: one async lock per user entry or
//! list, so a slow fetch for one user never blocks another. A reader that
//! waited on the lock re-checks freshness first, so concurrent readers of a
//! stale entry cause a single fetch.
//!
//! Every invalidation bumps the generation of its keys. A fetch that started
//! under an older generation still answers its caller but is stored stale,
//! so an invalidation racing an in-flight fetch is never lost.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use shared::models::{FuncaoPermissao, Profile};
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::backend::PermissionBackend;
use crate::error::AccessResult;
use crate::resolver::{PermissionResolver, UserPermissions};
use crate::security_log;

/// Default entry freshness
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Logical cache keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Resolved permissions per user
    UserPermissions,
    /// Profile rows (auth user → roles) per user
    AuthPermissions,
    /// Role rows with their permission ids
    FuncoesPermissao,
    /// Distinct role names offered by admin screens
    AvailableFunctions,
}

impl CacheKey {
    pub const ALL: [CacheKey; 4] = [
        CacheKey::UserPermissions,
        CacheKey::AuthPermissions,
        CacheKey::FuncoesPermissao,
        CacheKey::AvailableFunctions,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheKey::UserPermissions => "user-permissions",
            CacheKey::AuthPermissions => "auth-permissions",
            CacheKey::FuncoesPermissao => "funcoesPermissao",
            CacheKey::AvailableFunctions => "availableFunctions",
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    fetched_at: Instant,
    stale: bool,
}

impl<T: Clone> Entry<T> {
    fn stamped(value: T, current: bool) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
            stale: !current,
        }
    }

    fn fresh(&self, ttl: Duration) -> Option<T> {
        (!self.stale && self.fetched_at.elapsed() < ttl).then(|| self.value.clone())
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    user_permissions: HashMap<String, Entry<UserPermissions>>,
    profiles: HashMap<String, Entry<Option<Profile>>>,
    roles: Option<Entry<Vec<FuncaoPermissao>>>,
    available_functions: Option<Entry<Vec<String>>>,
    generations: HashMap<CacheKey, u64>,
}

impl CacheInner {
    fn generation(&self, key: CacheKey) -> u64 {
        self.generations.get(&key).copied().unwrap_or(0)
    }

    fn bump(&mut self, key: CacheKey) {
        *self.generations.entry(key).or_insert(0) += 1;
    }
}

/// Shared permission cache
#[derive(Debug, Clone)]
pub struct PermissionCache {
    inner: Arc<RwLock<CacheInner>>,
    flights: Arc<parking_lot::Mutex<HashMap<String, Arc<Mutex<()>>>>>,
    ttl: Duration,
}

impl PermissionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner::default())),
            flights: Arc::new(parking_lot::Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Single-flight lock of one entry
    fn flight(&self, key: CacheKey, id: &str) -> Arc<Mutex<()>> {
        self.flights
            .lock()
            .entry(format!("{}:{}", key, id))
            .or_default()
            .clone()
    }

    async fn generation(&self, key: CacheKey) -> u64 {
        self.inner.read().await.generation(key)
    }

    // ========== User permissions ==========

    /// Cached permissions of a user, resolving them when missing or stale
    ///
    /// Failed and pending-approval resolutions are returned but not stored.
    pub async fn user_permissions(
        &self,
        user_id: &str,
        resolver: &PermissionResolver,
    ) -> UserPermissions {
        if let Some(hit) = self.peek_user_permissions(user_id).await {
            return hit;
        }

        let flight = self.flight(CacheKey::UserPermissions, user_id);
        let _fetch = flight.lock().await;
        if let Some(hit) = self.peek_user_permissions(user_id).await {
            return hit;
        }
        self.fetch_user_permissions(user_id, resolver).await
    }

    /// Fresh cached permissions of a user, without fetching
    pub async fn peek_user_permissions(&self, user_id: &str) -> Option<UserPermissions> {
        let inner = self.inner.read().await;
        inner
            .user_permissions
            .get(user_id)
            .and_then(|e| e.fresh(self.ttl))
    }

    /// Re-fetch a user's permissions now, regardless of freshness
    pub async fn refresh_user_permissions(
        &self,
        user_id: &str,
        resolver: &PermissionResolver,
    ) -> UserPermissions {
        let flight = self.flight(CacheKey::UserPermissions, user_id);
        let _fetch = flight.lock().await;
        self.fetch_user_permissions(user_id, resolver).await
    }

    async fn fetch_user_permissions(
        &self,
        user_id: &str,
        resolver: &PermissionResolver,
    ) -> UserPermissions {
        let started = self.generation(CacheKey::UserPermissions).await;
        match resolver.try_resolve(user_id).await {
            Ok(permissions) => {
                let mut inner = self.inner.write().await;
                if permissions.is_pending_approval() {
                    inner.user_permissions.remove(user_id);
                } else {
                    let current = inner.generation(CacheKey::UserPermissions) == started;
                    inner.user_permissions.insert(
                        user_id.to_string(),
                        Entry::stamped(permissions.clone(), current),
                    );
                }
                permissions
            }
            Err(e) => {
                security_log!(
                    WARN,
                    "permission_fetch_failed",
                    user_id = %user_id,
                    error = %e
                );
                self.inner.write().await.user_permissions.remove(user_id);
                UserPermissions::denied(Some(user_id.to_string()))
            }
        }
    }

    // ========== Admin data ==========

    /// Cached profile row of a user
    pub async fn profile(
        &self,
        user_id: &str,
        backend: &dyn PermissionBackend,
    ) -> AccessResult<Option<Profile>> {
        if let Some(hit) = self.peek_profile(user_id).await {
            return Ok(hit);
        }

        let flight = self.flight(CacheKey::AuthPermissions, user_id);
        let _fetch = flight.lock().await;
        if let Some(hit) = self.peek_profile(user_id).await {
            return Ok(hit);
        }
        let started = self.generation(CacheKey::AuthPermissions).await;
        let profile = backend.fetch_profile(user_id).await?;
        let mut inner = self.inner.write().await;
        let current = inner.generation(CacheKey::AuthPermissions) == started;
        inner
            .profiles
            .insert(user_id.to_string(), Entry::stamped(profile.clone(), current));
        Ok(profile)
    }

    async fn peek_profile(&self, user_id: &str) -> Option<Option<Profile>> {
        let inner = self.inner.read().await;
        inner.profiles.get(user_id).and_then(|e| e.fresh(self.ttl))
    }

    /// Cached role rows
    pub async fn roles(&self, backend: &dyn PermissionBackend) -> AccessResult<Vec<FuncaoPermissao>> {
        if let Some(hit) = self.peek_roles().await {
            return Ok(hit);
        }

        let flight = self.flight(CacheKey::FuncoesPermissao, "");
        let _fetch = flight.lock().await;
        if let Some(hit) = self.peek_roles().await {
            return Ok(hit);
        }
        let started = self.generation(CacheKey::FuncoesPermissao).await;
        let roles = backend.fetch_all_roles().await?;
        let mut inner = self.inner.write().await;
        let current = inner.generation(CacheKey::FuncoesPermissao) == started;
        inner.roles = Some(Entry::stamped(roles.clone(), current));
        Ok(roles)
    }

    async fn peek_roles(&self) -> Option<Vec<FuncaoPermissao>> {
        let inner = self.inner.read().await;
        inner.roles.as_ref().and_then(|e| e.fresh(self.ttl))
    }

    /// Cached distinct role names, sorted
    pub async fn available_functions(
        &self,
        backend: &dyn PermissionBackend,
    ) -> AccessResult<Vec<String>> {
        if let Some(hit) = self.peek_available_functions().await {
            return Ok(hit);
        }

        let flight = self.flight(CacheKey::AvailableFunctions, "");
        let _fetch = flight.lock().await;
        if let Some(hit) = self.peek_available_functions().await {
            return Ok(hit);
        }
        let started = self.generation(CacheKey::AvailableFunctions).await;
        let mut names: Vec<String> = backend
            .fetch_all_roles()
            .await?
            .into_iter()
            .map(|r| r.nome_funcao.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        names.sort();
        names.dedup();
        let mut inner = self.inner.write().await;
        let current = inner.generation(CacheKey::AvailableFunctions) == started;
        inner.available_functions = Some(Entry::stamped(names.clone(), current));
        Ok(names)
    }

    async fn peek_available_functions(&self) -> Option<Vec<String>> {
        let inner = self.inner.read().await;
        inner
            .available_functions
            .as_ref()
            .and_then(|e| e.fresh(self.ttl))
    }

    // ========== Invalidation ==========

    /// Mark the entries under `keys` stale
    ///
    /// Idempotent: stale entries stay stale until the next read re-fetches them.
    /// Fetches already in flight under `keys` are stored stale.
    pub async fn invalidate(&self, keys: &[CacheKey]) {
        let mut inner = self.inner.write().await;
        for &key in keys {
            inner.bump(key);
            match key {
                CacheKey::UserPermissions => {
                    inner.user_permissions.values_mut().for_each(|e| e.stale = true);
                }
                CacheKey::AuthPermissions => {
                    inner.profiles.values_mut().for_each(|e| e.stale = true);
                }
                CacheKey::FuncoesPermissao => {
                    if let Some(e) = inner.roles.as_mut() {
                        e.stale = true;
                    }
                }
                CacheKey::AvailableFunctions => {
                    if let Some(e) = inner.available_functions.as_mut() {
                        e.stale = true;
                    }
                }
            }
        }
        tracing::debug!(keys = ?keys.iter().map(CacheKey::as_str).collect::<Vec<_>>(), "Invalidated permission cache");
    }

    /// Mark every permission-derived entry stale
    pub async fn invalidate_permissions(&self) {
        self.invalidate(&CacheKey::ALL).await;
    }

    /// Whether a read under `key` would re-fetch
    ///
    /// Keyed entries (`UserPermissions`, `AuthPermissions`) report stale when
    /// none is cached or any of them is stale.
    pub async fn is_stale(&self, key: CacheKey) -> bool {
        let inner = self.inner.read().await;
        let ttl = self.ttl;
        match key {
            CacheKey::UserPermissions => {
                inner.user_permissions.is_empty()
                    || inner.user_permissions.values().any(|e| e.fresh(ttl).is_none())
            }
            CacheKey::AuthPermissions => {
                inner.profiles.is_empty()
                    || inner.profiles.values().any(|e| e.fresh(ttl).is_none())
            }
            CacheKey::FuncoesPermissao => inner.roles.as_ref().is_none_or(|e| e.fresh(ttl).is_none()),
            CacheKey::AvailableFunctions => inner
                .available_functions
                .as_ref()
                .is_none_or(|e| e.fresh(ttl).is_none()),
        }
    }

    /// Drop every entry (sign-out)
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        let mut generations = std::mem::take(&mut inner.generations);
        for key in CacheKey::ALL {
            *generations.entry(key).or_insert(0) += 1;
        }
        *inner = CacheInner {
            generations,
            ..CacheInner::default()
        };
        tracing::debug!("Cleared permission cache");
    }
}

impl Default for PermissionCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
