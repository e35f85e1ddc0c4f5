use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::api::models::{AuthTokens, User};
use crate::core::credentials::{CredentialStore, StoredCredentials};

/// Snapshot of the authentication session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Session {
    /// True exactly when an access credential is held.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

/// Shared handle to the session, writing credentials through to durable
/// storage on every change.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<Mutex<Session>>,
    credentials: Arc<dyn CredentialStore>,
}

impl SessionStore {
    pub(crate) fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            state: Arc::new(Mutex::new(Session::default())),
            credentials,
        }
    }

    /// Rebuild the session from persisted credentials. The user profile is
    /// not persisted and must be fetched again.
    pub(crate) fn restore(&self) {
        let stored = match self.credentials.load() {
            Ok(stored) => stored,
            Err(err) => {
                warn!(error = %err, "could not read persisted credentials");
                StoredCredentials::default()
            }
        };
        let mut state = self.state.lock().unwrap();
        state.user = None;
        state.access_token = stored.access_token.filter(|token| !token.is_empty());
        state.refresh_token = stored.refresh_token.filter(|token| !token.is_empty());
        debug!(authenticated = state.is_authenticated(), "session restored");
    }

    pub fn snapshot(&self) -> Session {
        self.state.lock().unwrap().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.lock().unwrap().is_authenticated()
    }

    pub fn access_token(&self) -> Option<String> {
        self.state.lock().unwrap().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.state.lock().unwrap().refresh_token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.lock().unwrap().user.clone()
    }

    pub fn sign_in(&self, user: User, tokens: &AuthTokens) {
        {
            let mut state = self.state.lock().unwrap();
            state.user = Some(user);
            state.access_token = Some(tokens.access_token.clone());
            state.refresh_token = Some(tokens.refresh_token.clone());
        }
        self.persist(&StoredCredentials::from(tokens));
    }

    pub fn set_tokens(&self, tokens: &AuthTokens) {
        {
            let mut state = self.state.lock().unwrap();
            state.access_token = Some(tokens.access_token.clone());
            state.refresh_token = Some(tokens.refresh_token.clone());
        }
        self.persist(&StoredCredentials::from(tokens));
    }

    pub fn set_user(&self, user: User) {
        self.state.lock().unwrap().user = Some(user);
    }

    /// Drop the session and the persisted credentials.
    pub fn clear(&self) {
        *self.state.lock().unwrap() = Session::default();
        if let Err(err) = self.credentials.clear() {
            warn!(error = %err, "could not remove persisted credentials");
        }
    }

    /// Drop only the in-memory copy; persisted credentials stay for the next run.
    pub(crate) fn forget(&self) {
        *self.state.lock().unwrap() = Session::default();
    }

    fn persist(&self, credentials: &StoredCredentials) {
        if let Err(err) = self.credentials.store(credentials) {
            warn!(error = %err, "could not persist credentials");
        }
    }
}
