//! Identity Provider boundary
//!
//! The hosted auth service owns sessions. This module only reads the current
//! session and turns it into an [`Identity`] snapshot for the guards.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AccessResult;
use crate::security_log;

/// Signed-in user as reported by the auth service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl SessionUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Identity snapshot consumed by the guards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl Identity {
    /// Session resolution still in flight
    pub fn loading() -> Self {
        Self {
            user_id: None,
            email: None,
            is_authenticated: false,
            is_loading: true,
        }
    }

    /// No session
    pub fn anonymous() -> Self {
        Self {
            is_loading: false,
            ..Self::loading()
        }
    }

    pub fn authenticated(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            email: None,
            is_authenticated: true,
            is_loading: false,
        }
    }

    pub fn from_session(session: Option<SessionUser>) -> Self {
        match session {
            Some(user) => Self {
                user_id: Some(user.id),
                email: user.email,
                is_authenticated: true,
                is_loading: false,
            },
            None => Self::anonymous(),
        }
    }

    /// User id of an authenticated, settled identity
    pub fn settled_user_id(&self) -> Option<&str> {
        if self.is_loading || !self.is_authenticated {
            return None;
        }
        self.user_id.as_deref()
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::loading()
    }
}

/// Source of the current session
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current signed-in user, `None` without a session
    async fn current_user(&self) -> AccessResult<Option<SessionUser>>;
}

/// Resolve the current identity
///
/// Provider failures are treated as "unauthenticated".
pub async fn resolve_identity(provider: &dyn IdentityProvider) -> Identity {
    match provider.current_user().await {
        Ok(session) => Identity::from_session(session),
        Err(e) => {
            security_log!(
                WARN,
                "identity_resolution_failed",
                error = %e
            );
            Identity::anonymous()
        }
    }
}

/// Provider with a fixed session, set by the embedding shell
#[derive(Debug, Default)]
pub struct StaticIdentity {
    session: parking_lot::RwLock<Option<SessionUser>>,
}

impl StaticIdentity {
    pub fn new(session: Option<SessionUser>) -> Self {
        Self {
            session: parking_lot::RwLock::new(session),
        }
    }

    pub fn signed_in(user: SessionUser) -> Self {
        Self::new(Some(user))
    }

    pub fn signed_out() -> Self {
        Self::new(None)
    }

    /// Replace the session (sign-in / sign-out)
    pub fn set(&self, session: Option<SessionUser>) {
        *self.session.write() = session;
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user(&self) -> AccessResult<Option<SessionUser>> {
        Ok(self.session.read().clone())
    }
}
