//! Shared types for the LYTOTEC access layer
//!
//! Backend row models, the role/permission vocabulary and the unified
//! error system used across crates.

pub mod error;
pub mod models;

// Re-exports
pub use error::{AppError, AppResult, ErrorCode};
pub use models::{FuncaoPermissao, Permissao, PermissionKey, Profile, RoleName};
pub use serde::{Deserialize, Serialize};
