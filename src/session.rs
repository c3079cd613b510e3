/// Session context: authentication state plus the persisted token pair.
///
/// One `Session` is created at startup and shared (behind an `Arc`) with the
/// `ApiClient` and every command. Reads are synchronous so guards can check
/// authentication without awaiting. Writes only happen from login, logout,
/// refresh and forced logout after a 401.
use anyhow::Result;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, RwLock};

use crate::error::ApiError;
use crate::models::auth::User;
use crate::secrets::TokenStore;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

pub struct Session {
    store: Mutex<TokenStore>,
    state: RwLock<AuthState>,
}

impl Session {
    /// Wrap a token store. Until `initialize` runs the state is "loading"
    /// when tokens are present and signed out otherwise.
    pub fn new(store: TokenStore) -> Self {
        let state = AuthState {
            user: None,
            is_authenticated: false,
            is_loading: store.has_tokens(),
        };
        Self {
            store: Mutex::new(store),
            state: RwLock::new(state),
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.store().access_token()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store().refresh_token()
    }

    pub fn has_persisted_tokens(&self) -> bool {
        self.store().has_tokens()
    }

    /// Where the token pair is persisted.
    pub fn store_path(&self) -> PathBuf {
        self.store().path().to_path_buf()
    }

    pub fn state(&self) -> AuthState {
        self.read_state().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_state().is_authenticated
    }

    pub fn user(&self) -> Option<User> {
        self.read_state().user.clone()
    }

    /// Guard for commands that need a signed-in user.
    pub fn require_authenticated(&self) -> Result<User, ApiError> {
        let state = self.read_state();
        match (&state.user, state.is_authenticated) {
            (Some(user), true) => Ok(user.clone()),
            _ => Err(ApiError::Unauthorized {
                message: "You are not logged in. Run 'intelink login' first.".to_string(),
            }),
        }
    }

    pub(crate) fn begin_loading(&self) {
        self.write_state(|s| s.is_loading = true);
    }

    pub(crate) fn end_loading(&self) {
        self.write_state(|s| s.is_loading = false);
    }

    /// Persist a fresh token pair and mark the session authenticated.
    pub(crate) fn establish(
        &self,
        access_token: String,
        refresh_token: Option<String>,
        user: Option<User>,
    ) -> Result<()> {
        self.store().store(access_token, refresh_token)?;
        self.write_state(|s| {
            if user.is_some() {
                s.user = user;
            }
            s.is_authenticated = true;
            s.is_loading = false;
        });
        Ok(())
    }

    pub(crate) fn set_user(&self, user: User) {
        self.write_state(|s| {
            s.user = Some(user);
            s.is_authenticated = true;
            s.is_loading = false;
        });
    }

    /// Forget the user and delete the persisted tokens.
    pub fn clear(&self) -> Result<()> {
        self.write_state(|s| *s = AuthState::default());
        self.store().clear()
    }

    fn store(&self) -> MutexGuard<'_, TokenStore> {
        // A poisoned lock still holds consistent token data
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, AuthState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self, f: impl FnOnce(&mut AuthState)) {
        let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            username: "alice".to_string(),
            email: None,
            role: None,
            total_short_urls: None,
            total_clicks: None,
            created_at: None,
        }
    }

    #[test]
    fn test_new_without_tokens_is_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(TokenStore::open(dir.path()));
        let state = session.state();
        assert!(!state.is_authenticated);
        assert!(!state.is_loading);
        assert!(session.require_authenticated().is_err());
    }

    #[test]
    fn test_establish_then_clear() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(TokenStore::open(dir.path()));

        session
            .establish("tok".to_string(), Some("ref".to_string()), Some(user()))
            .unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.access_token().as_deref(), Some("tok"));
        assert_eq!(session.require_authenticated().unwrap().username, "alice");

        // Tokens survive a restart
        let reopened = Session::new(TokenStore::open(dir.path()));
        assert!(reopened.has_persisted_tokens());
        assert!(reopened.state().is_loading);

        session.clear().unwrap();
        assert!(!session.is_authenticated());
        assert!(session.access_token().is_none());
        assert!(!TokenStore::open(dir.path()).has_tokens());
    }

    #[test]
    fn test_establish_keeps_known_user_on_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(TokenStore::open(dir.path()));
        session
            .establish("a".to_string(), None, Some(user()))
            .unwrap();
        session.establish("b".to_string(), None, None).unwrap();
        assert_eq!(session.user().unwrap().id, 7);
        assert_eq!(session.access_token().as_deref(), Some("b"));
    }
}
