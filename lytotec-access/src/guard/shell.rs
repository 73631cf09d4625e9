//! Rendering shell
//!
//! Consumes an [`AccessDecision`] and performs the navigation side effect.
//! Protected content is only built for [`AccessDecision::Allow`].

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::decision::{AccessDecision, Requirement, decide};
use crate::identity::Identity;
use crate::resolver::UserPermissions;
use crate::security_log;

/// Redirect targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Redirect {
    #[serde(rename = "/login")]
    Login,
    #[serde(rename = "/waiting-approval")]
    WaitingApproval,
}

impl Redirect {
    pub const fn path(&self) -> &'static str {
        match self {
            Redirect::Login => "/login",
            Redirect::WaitingApproval => "/waiting-approval",
        }
    }
}

impl std::fmt::Display for Redirect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Guard state for one render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardPhase {
    Resolving,
    Redirecting,
    Rendering,
}

impl GuardPhase {
    /// Redirecting and Rendering end the render pass
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GuardPhase::Resolving)
    }
}

/// Output of one render pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardView<T> {
    /// Loading placeholder
    Loading,
    Redirecting(Redirect),
    Rendering(T),
}

impl<T> GuardView<T> {
    pub fn phase(&self) -> GuardPhase {
        match self {
            GuardView::Loading => GuardPhase::Resolving,
            GuardView::Redirecting(_) => GuardPhase::Redirecting,
            GuardView::Rendering(_) => GuardPhase::Rendering,
        }
    }

    pub fn content(self) -> Option<T> {
        match self {
            GuardView::Rendering(content) => Some(content),
            _ => None,
        }
    }
}

/// Client-side navigation boundary
pub trait Navigator: Send + Sync {
    fn redirect(&self, to: Redirect);
}

/// Navigator that records redirects in order
#[derive(Debug, Default)]
pub struct NavigationHistory {
    redirects: Mutex<Vec<Redirect>>,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirects(&self) -> Vec<Redirect> {
        self.redirects.lock().clone()
    }

    pub fn last(&self) -> Option<Redirect> {
        self.redirects.lock().last().copied()
    }
}

impl Navigator for NavigationHistory {
    fn redirect(&self, to: Redirect) {
        self.redirects.lock().push(to);
    }
}

/// Guard bound to a requirement and a navigator
#[derive(Clone)]
pub struct GuardShell {
    requirement: Requirement,
    navigator: Arc<dyn Navigator>,
}

impl GuardShell {
    pub fn new(requirement: Requirement, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            requirement,
            navigator,
        }
    }

    /// Identity-only guard
    pub fn auth(navigator: Arc<dyn Navigator>) -> Self {
        Self::new(Requirement::Authenticated, navigator)
    }

    /// Approved-user guard
    pub fn dashboard(navigator: Arc<dyn Navigator>) -> Self {
        Self::new(Requirement::Dashboard, navigator)
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    /// Decide and render in one pass
    pub fn render<T>(
        &self,
        identity: &Identity,
        permissions: Option<&UserPermissions>,
        children: impl FnOnce() -> T,
    ) -> GuardView<T> {
        let decision = decide(identity, permissions, &self.requirement);
        if let Some(to) = decision.redirect() {
            security_log!(
                WARN,
                "access_denied",
                user_id = ?identity.user_id,
                requirement = ?self.requirement,
                redirect = %to
            );
        }
        self.apply(decision, children)
    }

    /// Render an already computed decision
    pub fn apply<T>(&self, decision: AccessDecision, children: impl FnOnce() -> T) -> GuardView<T> {
        match decision {
            AccessDecision::Resolving => GuardView::Loading,
            AccessDecision::Allow => GuardView::Rendering(children()),
            AccessDecision::DenyUnauthenticated | AccessDecision::DenyUnauthorized => {
                let to = decision.redirect().unwrap_or(Redirect::Login);
                self.navigator.redirect(to);
                GuardView::Redirecting(to)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::PermissionKey;

    fn approved(user_id: &str) -> UserPermissions {
        UserPermissions {
            can_access_dashboard: true,
            permissions: [PermissionKey::DashboardView].into(),
            ..UserPermissions::denied(Some(user_id.to_string()))
        }
    }

    #[test]
    fn test_loading_renders_placeholder_only() {
        let history = Arc::new(NavigationHistory::new());
        let shell = GuardShell::dashboard(history.clone());

        let mut built = false;
        let view = shell.render(&Identity::loading(), None, || built = true);
        assert_eq!(view, GuardView::Loading);
        assert!(!built);
        assert!(history.redirects().is_empty());

        let view = shell.render(&Identity::authenticated("u-1"), Some(&UserPermissions::loading()), || ());
        assert_eq!(view.phase(), GuardPhase::Resolving);
        assert!(history.redirects().is_empty());
    }

    #[test]
    fn test_denials_navigate() {
        let history = Arc::new(NavigationHistory::new());
        let shell = GuardShell::new(
            Requirement::permission(PermissionKey::AdminPermissoesView),
            history.clone(),
        );

        let view = shell.render(&Identity::anonymous(), None, || "page");
        assert_eq!(view, GuardView::Redirecting(Redirect::Login));

        let view = shell.render(&Identity::authenticated("u-1"), Some(&approved("u-1")), || "page");
        assert_eq!(view, GuardView::Redirecting(Redirect::WaitingApproval));

        assert_eq!(
            history.redirects(),
            vec![Redirect::Login, Redirect::WaitingApproval]
        );
    }

    #[test]
    fn test_allow_renders_children() {
        let history = Arc::new(NavigationHistory::new());
        let shell = GuardShell::auth(history.clone());

        let view = shell.render(&Identity::authenticated("u-1"), None, || "page");
        assert_eq!(view.content(), Some("page"));
        assert_eq!(history.last(), None);
    }

    #[test]
    fn test_redirect_paths() {
        assert_eq!(Redirect::Login.path(), "/login");
        assert_eq!(Redirect::WaitingApproval.to_string(), "/waiting-approval");
        assert_eq!(
            serde_json::to_string(&Redirect::WaitingApproval).unwrap(),
            r#""/waiting-approval""#
        );
        assert!(GuardPhase::Rendering.is_terminal());
        assert!(!GuardPhase::Resolving.is_terminal());
    }
}
