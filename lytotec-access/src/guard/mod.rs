//! Guard components
//!
//! - [`decide`] - pure decision over identity, permissions and a requirement
//! - [`GuardShell`] - renders a decision and performs the redirect
//! - [`GuardMount`] - cancellable resolution tied to a mounted guard
//!
//! Redirect targets:
//! - no session → `/login`
//! - signed in without access → `/waiting-approval`

mod decision;
mod mount;
mod shell;

pub use decision::{AccessDecision, Requirement, decide};
pub use mount::GuardMount;
pub use shell::{GuardPhase, GuardShell, GuardView, NavigationHistory, Navigator, Redirect};
