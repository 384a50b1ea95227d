//! Editor authentication.
//!
//! The server keeps the editor password as an Argon2 PHC string and hands out
//! UUID session tokens valid for 24 hours. Sessions live in a [`SessionStore`]
//! owned by the application state. The client keeps its token in a
//! [`SessionContext`] backed by a small file.

use crate::error::{DashboardError, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};

#[cfg(feature = "web")]
pub use server::*;

#[cfg(feature = "web")]
mod server {
    use super::*;
    use argon2::{
        Argon2,
        password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
    };
    use std::collections::HashMap;
    use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
    use std::time::{Duration, SystemTime};
    use uuid::Uuid;

    /// Lifetime of a session token
    pub const SESSION_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

    /// Hash a password with Argon2id and a random salt
    ///
    /// # Arguments
    /// * `password` - The plaintext password to hash
    ///
    /// # Returns
    /// * `Result<String>` - PHC string suitable for `DASHBOARD_EDITOR_HASH`
    pub fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DashboardError::BadRequest(format!("hash della password fallito: {}", e)))
    }

    /// Check a plaintext password against a PHC string
    ///
    /// # Returns
    /// * `Result<bool>` - `false` on mismatch, an error when the hash is malformed
    pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|_| DashboardError::BadRequest("formato hash della password non valido".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// The editor credential, if editing is enabled
    #[derive(Clone, Debug, Default)]
    pub struct EditorCredentials {
        hash: Option<String>,
    }

    impl EditorCredentials {
        /// Wrap a configured hash; a malformed PHC string is refused up front
        pub fn new(hash: Option<String>) -> Result<Self> {
            let hash = hash.filter(|h| !h.trim().is_empty());
            if let Some(h) = &hash {
                PasswordHash::new(h).map_err(|_| {
                    DashboardError::BadRequest(
                        "DASHBOARD_EDITOR_HASH non è una stringa PHC valida".to_string(),
                    )
                })?;
            } else {
                warn!("No editor password configured, homepage editing is disabled");
            }
            Ok(EditorCredentials { hash })
        }

        pub fn is_enabled(&self) -> bool {
            self.hash.is_some()
        }

        /// Verify the editor password
        pub fn check(&self, password: &str) -> Result<()> {
            let Some(hash) = &self.hash else {
                return Err(DashboardError::Forbidden(
                    "Modifica della homepage disabilitata".to_string(),
                ));
            };
            if verify_password(password, hash)? {
                Ok(())
            } else {
                Err(DashboardError::Forbidden("Password non valida".to_string()))
            }
        }
    }

    #[derive(Clone, Debug)]
    struct Session {
        expires_at: SystemTime,
    }

    /// Active editor sessions, keyed by token
    #[derive(Debug)]
    pub struct SessionStore {
        sessions: RwLock<HashMap<String, Session>>,
        ttl: Duration,
    }

    impl Default for SessionStore {
        fn default() -> Self {
            SessionStore::with_ttl(SESSION_DURATION)
        }
    }

    impl SessionStore {
        pub fn with_ttl(ttl: Duration) -> Self {
            SessionStore {
                sessions: RwLock::new(HashMap::new()),
                ttl,
            }
        }

        pub fn ttl(&self) -> Duration {
            self.ttl
        }

        fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Session>> {
            self.sessions.read().unwrap_or_else(|e| e.into_inner())
        }

        fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Session>> {
            self.sessions.write().unwrap_or_else(|e| e.into_inner())
        }

        /// Open a new session and return its token
        pub fn create(&self) -> String {
            let token = Uuid::new_v4().to_string();
            let session = Session {
                expires_at: SystemTime::now() + self.ttl,
            };
            self.write().insert(token.clone(), session);
            info!("Editor session opened");
            token
        }

        /// Whether the token names a live session
        pub fn validate(&self, token: &str) -> bool {
            self.read()
                .get(token)
                .is_some_and(|s| s.expires_at > SystemTime::now())
        }

        /// Like [`SessionStore::validate`], as a `Result`
        pub fn require(&self, token: Option<&str>) -> Result<()> {
            match token {
                Some(t) if self.validate(t) => Ok(()),
                _ => Err(DashboardError::Unauthorized),
            }
        }

        /// Drop a session; returns whether it existed
        pub fn revoke(&self, token: &str) -> bool {
            self.write().remove(token).is_some()
        }

        /// Remove expired sessions, returning how many were dropped
        pub fn purge_expired(&self) -> usize {
            let now = SystemTime::now();
            let mut sessions = self.write();
            let before = sessions.len();
            sessions.retain(|_, s| s.expires_at > now);
            before - sessions.len()
        }

        pub fn len(&self) -> usize {
            self.read().len()
        }

        pub fn is_empty(&self) -> bool {
            self.read().is_empty()
        }
    }
}

/// Client-side session: the token returned by `/api/login`, kept on disk
///
/// Created with [`SessionContext::init`] when the client starts, filled by
/// [`SessionContext::establish`] after a login and emptied by
/// [`SessionContext::teardown`] on logout.
#[derive(Clone, Debug)]
pub struct SessionContext {
    path: PathBuf,
    token: Option<String>,
}

impl SessionContext {
    /// Load the stored token, if any
    pub fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let token = match std::fs::read_to_string(&path) {
            Ok(contents) => Some(contents.trim().to_string()).filter(|t| !t.is_empty()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        Ok(SessionContext { path, token })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Store a freshly issued token
    pub fn establish(&mut self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, &token)?;
        self.token = Some(token);
        Ok(())
    }

    /// Forget the token and delete the file
    pub fn teardown(&mut self) -> Result<()> {
        self.token = None;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
