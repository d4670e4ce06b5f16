//! Authentication Management
//!
//! Personal-access-token handling for the data source: a pluggable
//! credential store plus the manager that turns the stored token into an
//! `Authorization` header and discards it again on logout or when the
//! backend rejects it.

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::RwLock;
use thiserror::Error;

/// Errors raised by credential handling
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("token must be a single non-empty word")]
    InvalidToken,
    #[error("credential storage failed: {0}")]
    Storage(#[from] std::io::Error),
}

/// Where the token lives between runs
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, token: &str) -> Result<(), AuthError>;
    fn remove(&self) -> Result<(), AuthError>;
}

/// Volatile store for tests and for tokens passed on the command line
#[derive(Default)]
pub struct InMemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self { token: RwLock::new(Some(token.to_string())) }
    }
}

impl CredentialStore for InMemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn set(&self, token: &str) -> Result<(), AuthError> {
        *self.token.write() = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), AuthError> {
        *self.token.write() = None;
        Ok(())
    }
}

/// Token file on disk, created with owner-only permissions
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default location: `<config dir>/statshub/token`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("statshub").join("token"))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl CredentialStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let token = raw.trim();
        (!token.is_empty()).then(|| token.to_string())
    }

    fn set(&self, token: &str) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn remove(&self) -> Result<(), AuthError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Session-level credential manager.
///
/// The token is read from the store at startup and attached to every
/// outgoing request as `Bearer <token>`; it is removed on logout or when a
/// request fails authentication.
pub struct AuthManager {
    store: Arc<dyn CredentialStore>,
}

impl AuthManager {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Validate and persist a token
    pub fn login(&self, token: &str) -> Result<(), AuthError> {
        let token = token.trim();
        if token.is_empty() || token.contains(char::is_whitespace) {
            return Err(AuthError::InvalidToken);
        }
        self.store.set(token)?;
        debug!("Stored access token");
        Ok(())
    }

    pub fn logout(&self) -> Result<(), AuthError> {
        self.store.remove()?;
        debug!("Removed access token");
        Ok(())
    }

    pub fn is_logged_in(&self) -> bool {
        self.store.get().is_some()
    }

    /// `Authorization` header value for outgoing requests, if logged in
    pub fn authorization_header(&self) -> Option<String> {
        self.store.get().map(|token| format!("Bearer {token}"))
    }

    /// Discard credentials the backend has rejected
    pub fn handle_auth_failure(&self) {
        warn!("Authentication rejected by the backend, discarding stored token");
        if let Err(e) = self.store.remove() {
            warn!("Failed to remove rejected token: {e}");
        }
    }
}
