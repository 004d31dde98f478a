// src/session.rs
use std::sync::{Arc, Mutex};

use crate::app_log;
use crate::core::storage::{StorageBackend, StorageError};
use crate::types::{Session, User};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Persists the authenticated session under the `token` and `user` keys.
///
/// The token is stored raw, the user as JSON. Writes go through one mutex so
/// the store can be shared between tasks.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn StorageBackend>,
    write_lock: Arc<Mutex<()>>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn save(&self, session: &Session) -> Result<(), StorageError> {
        let user_json = serde_json::to_string(&session.user)?;

        let _guard = self.lock_writes();
        self.backend.set(TOKEN_KEY, &session.token)?;
        if let Err(e) = self.backend.set(USER_KEY, &user_json) {
            // A token without its user must not outlive the failed save.
            if let Err(rollback) = self.backend.remove(TOKEN_KEY) {
                app_log!(error, "Failed to roll back stored token: {}", rollback);
            }
            return Err(e);
        }

        app_log!(info, "Session saved for {}", session.user.email);
        Ok(())
    }

    /// The stored session, or `None` when missing, incomplete or malformed.
    pub fn load(&self) -> Option<Session> {
        let token = self.backend.get(TOKEN_KEY)?;
        if token.is_empty() {
            return None;
        }

        let user_json = self.backend.get(USER_KEY)?;
        match serde_json::from_str::<User>(&user_json) {
            Ok(user) => Some(Session { token, user }),
            Err(e) => {
                app_log!(warn, "Ignoring malformed stored user: {}", e);
                None
            }
        }
    }

    /// Raw token as stored, without checking the user record.
    pub fn token(&self) -> Option<String> {
        self.backend.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.lock_writes();
        self.backend.remove(TOKEN_KEY)?;
        self.backend.remove(USER_KEY)?;

        app_log!(info, "Session cleared");
        Ok(())
    }

    fn lock_writes(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
