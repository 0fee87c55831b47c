//! Authentication session state
//!
//! `AuthSession` is the single owner of the credential pair. It is handed to
//! every component that issues authenticated requests through the `App`,
//! and its `clear` is the only way credentials are dropped.

use crate::services::token_store::TokenStore;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token pair issued by the login endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access: String,
    pub refresh: String,
}

/// Local rejection of a registration form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("Username and password required")]
    MissingFields,
    #[error("Passwords don't match")]
    PasswordMismatch,
}

/// Check a registration form before anything touches the network
pub fn validate_registration(
    username: &str,
    password: &str,
    confirm: &str,
) -> Result<(), RegistrationError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(RegistrationError::MissingFields);
    }
    if password != confirm {
        return Err(RegistrationError::PasswordMismatch);
    }
    Ok(())
}

/// Authentication state backed by durable token storage
pub struct AuthSession {
    store: TokenStore,
    authenticated: bool,
    /// Bumped on every transition into or out of the authenticated state
    epoch: u64,
}

impl AuthSession {
    /// Restore from storage; a stored access token is trusted until a request fails
    pub fn restore(store: TokenStore) -> Self {
        let authenticated = store.load().is_some();
        Self {
            store,
            authenticated,
            epoch: 0,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[cfg(test)]
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Persist a freshly issued token pair
    pub fn establish(&mut self, session: &Session) -> Result<()> {
        self.store.save(session)?;
        self.authenticated = true;
        self.epoch += 1;
        Ok(())
    }

    /// Forget both tokens. Returns false when already logged out.
    pub fn clear(&mut self) -> bool {
        if let Err(e) = self.store.clear() {
            tracing::warn!("failed to clear stored tokens: {:#}", e);
        }
        let was_authenticated = self.authenticated;
        self.authenticated = false;
        self.epoch += 1;
        was_authenticated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            access: "a".to_string(),
            refresh: "r".to_string(),
        }
    }

    #[test]
    fn test_validate_registration() {
        assert_eq!(validate_registration("bob", "pw", "pw"), Ok(()));
        assert_eq!(
            validate_registration("bob", "pw", "px"),
            Err(RegistrationError::PasswordMismatch)
        );
        assert_eq!(
            validate_registration("  ", "pw", "pw"),
            Err(RegistrationError::MissingFields)
        );
        assert_eq!(
            RegistrationError::PasswordMismatch.to_string(),
            "Passwords don't match"
        );
    }

    #[test]
    fn test_restore_without_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let auth = AuthSession::restore(TokenStore::at(dir.path().join("session.json")));
        assert!(!auth.is_authenticated());
    }

    #[test]
    fn test_establish_then_restore() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut auth = AuthSession::restore(TokenStore::at(path.clone()));
        auth.establish(&session()).unwrap();
        assert!(auth.is_authenticated());

        let restored = AuthSession::restore(TokenStore::at(path));
        assert!(restored.is_authenticated());
    }

    #[test]
    fn test_clear_bumps_epoch() {
        let dir = tempfile::tempdir().unwrap();
        let mut auth = AuthSession::restore(TokenStore::at(dir.path().join("session.json")));
        auth.establish(&session()).unwrap();
        let epoch = auth.epoch();

        assert!(auth.clear());
        assert!(!auth.is_authenticated());
        assert!(auth.epoch() > epoch);
        assert!(auth.store().load().is_none());
        assert!(!auth.clear());
    }
}
