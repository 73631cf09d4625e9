//! LYTOTEC access control
//!
//! Gates application routes on the signed-in user's roles and permissions.
//!
//! # Architecture
//!
//! ```text
//! IdentityProvider ──► Identity ─┐
//!                                ├─► decide() ──► AccessDecision ──► GuardShell ──► Navigator
//! PermissionBackend ─► Resolver ─┘        ▲
//!                         │               │
//!                   PermissionCache ◄── Invalidation ◄── RoleAdminService
//! ```
//!
//! # Example
//!
//! ```ignore
//! use lytotec_access::{AccessConfig, AccessContext, Requirement, PermissionKey};
//!
//! let config = AccessConfig::from_env();
//! lytotec_access::logger::init_from_config(&config)?;
//! let access = AccessContext::from_config(&config)?;
//!
//! let mut mount = access.mount(Requirement::permission(PermissionKey::AdminPermissoesView));
//! let decision = mount.settled().await;
//! ```

pub mod admin;
pub mod backend;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod guard;
pub mod identity;
pub mod invalidation;
pub mod logger;
pub mod permissions;
pub mod resolver;
pub mod routes;
pub mod validation;

// Re-exports
pub use admin::RoleAdminService;
pub use backend::{InMemoryBackend, PermissionBackend, RestBackend};
pub use cache::{CacheKey, PermissionCache};
pub use config::AccessConfig;
pub use context::AccessContext;
pub use error::{AccessError, AccessResult};
pub use guard::{
    AccessDecision, GuardMount, GuardPhase, GuardShell, GuardView, NavigationHistory, Navigator,
    Redirect, Requirement, decide,
};
pub use identity::{Identity, IdentityProvider, SessionUser, StaticIdentity, resolve_identity};
pub use invalidation::PermissionCacheInvalidation;
pub use permissions::{MatchPolicy, PermissionSet};
pub use resolver::{PermissionResolver, UserPermissions};
pub use shared::models::{PermissionKey, RoleName};
