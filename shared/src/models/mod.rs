//! Data models
//!
//! Rows returned by the hosted backend for the access layer.
//! All IDs are `String` (UUID primary keys).

pub mod permission;
pub mod profile;
pub mod role;

// Re-exports
pub use permission::*;
pub use profile::*;
pub use role::*;
