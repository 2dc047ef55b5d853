// Session context: the bearer token and the logged-in user.
//
// Populated by a successful login, cleared by logout or by any 401 the
// client sees. Injected into `AclClient` so tests can supply their own.

use std::sync::{PoisonError, RwLock};

use secrecy::SecretString;

use crate::models::UserInfo;

/// Storage for the authenticated session.
pub trait SessionStore: Send + Sync {
    /// The current bearer token, if logged in.
    fn token(&self) -> Option<SecretString>;

    /// The user the token belongs to.
    fn user(&self) -> Option<UserInfo>;

    /// Replace the session after a successful login.
    fn set(&self, token: SecretString, user: UserInfo);

    /// Drop the session (logout, or a 401 from the backend).
    fn clear(&self);

    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    fn role(&self) -> Option<String> {
        self.user().and_then(|u| u.role)
    }

    fn has_role(&self, required: &str) -> bool {
        self.role().as_deref() == Some(required)
    }

    fn has_any_role(&self, roles: &[&str]) -> bool {
        self.role().is_some_and(|r| roles.contains(&r.as_str()))
    }
}

/// Process-local session store.
#[derive(Debug, Default)]
pub struct MemorySession {
    inner: RwLock<Option<(SecretString, UserInfo)>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that starts out logged in (used for pre-issued tokens).
    pub fn with_token(token: SecretString, user: UserInfo) -> Self {
        Self {
            inner: RwLock::new(Some((token, user))),
        }
    }
}

impl SessionStore for MemorySession {
    fn token(&self) -> Option<SecretString> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(|(token, _)| token.clone())
    }

    fn user(&self) -> Option<UserInfo> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(|(_, user)| user.clone())
    }

    fn set(&self, token: SecretString, user: UserInfo) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some((token, user));
    }

    fn clear(&self) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}
