//! Unified error system for the LYTOTEC access layer
//!
//! - [`ErrorCode`]: Standardized error codes, with the mapping from backend
//!   HTTP statuses
//! - [`AppError`]: Rich error type with codes, messages, and details
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::AdminRequired);
//! assert_eq!(err.code.code(), 2003);
//!
//! let err = AppError::validation("Role list is empty").with_detail("field", "funcoes");
//! assert!(err.details.is_some());
//! ```

mod codes;
mod http;
mod types;

pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult};
