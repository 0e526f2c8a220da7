use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{ProfileError, Result};

/// The one place the bearer token is read from and cleared.
///
/// Tokens are issued elsewhere; this side never writes one.
pub trait SessionStore: Send + Sync {
    fn read_token(&self) -> Result<Option<String>>;

    /// Forget the token, e.g. after the backend rejected it.
    fn clear(&self) -> Result<()>;
}

/// Token held in memory, for tests and for tokens passed on the command line
#[derive(Debug, Default)]
pub struct MemorySession {
    token: Mutex<Option<String>>,
}

impl MemorySession {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: Mutex::new(token.filter(|t| !t.trim().is_empty())),
        }
    }
}

impl SessionStore for MemorySession {
    fn read_token(&self) -> Result<Option<String>> {
        let guard = self
            .token
            .lock()
            .map_err(|_| ProfileError::Other("session lock poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .token
            .lock()
            .map_err(|_| ProfileError::Other("session lock poisoned".to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// Token stored in a file by whatever signed the user in
#[derive(Debug, Clone)]
pub struct FileSession {
    path: PathBuf,
}

impl FileSession {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStore for FileSession {
    fn read_token(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                log::info!("Cleared session token at {}", self.path.display());
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
