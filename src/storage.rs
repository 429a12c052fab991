//! Token storage backends.
//!
//! Storage is modeled as an opaque keyed store with get/set/remove
//! semantics. Backends never surface failures to callers; errors are
//! logged and swallowed, and a failed read reports "no token".

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use parking_lot::RwLock;
use tracing::warn;

/// Opaque storage for the session bearer token.
pub trait TokenStore: Send + Sync {
    /// Currently stored token, if any.
    fn get(&self) -> Option<String>;

    /// Store a token, replacing any previous one.
    fn set(&self, token: &str);

    /// Remove the stored token. Removing a missing token is a no-op.
    fn remove(&self);
}

/// In-memory token store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn set(&self, token: &str) {
        *self.token.write() = Some(token.to_string());
    }

    fn remove(&self) {
        *self.token.write() = None;
    }
}

/// File-backed token store holding one file named after the storage key.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store rooted at `dir`, keyed by `key`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, key: &str) -> Self {
        Self {
            path: dir.into().join(key),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim().to_string();
                if token.is_empty() { None } else { Some(token) }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read token file: {e}");
                None
            }
        }
    }

    fn set(&self, token: &str) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("Failed to create token directory: {e}");
                return;
            }
        }
        if let Err(e) = fs::write(&self.path, token) {
            warn!("Failed to write token file: {e}");
        }
    }

    fn remove(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove token file: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert!(store.get().is_none());

        store.set("abc.def.ghi");
        assert_eq!(store.get(), Some("abc.def.ghi".to_string()));

        store.set("new.token.value");
        assert_eq!(store.get(), Some("new.token.value".to_string()));

        store.remove();
        assert!(store.get().is_none());
    }

    #[test]
    fn test_memory_store_remove_is_idempotent() {
        let store = MemoryTokenStore::new();
        store.remove();
        store.remove();
        assert!(store.get().is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let Ok(dir) = tempfile::tempdir() else {
            return;
        };
        let store = FileTokenStore::new(dir.path(), "chatbot_jwt_token");

        assert!(store.get().is_none());
        store.set("stored.token.here");
        assert_eq!(store.get(), Some("stored.token.here".to_string()));

        store.remove();
        assert!(store.get().is_none());
        // Removing again must not log spuriously or fail.
        store.remove();
    }

    #[test]
    fn test_file_store_trims_whitespace() {
        let Ok(dir) = tempfile::tempdir() else {
            return;
        };
        let store = FileTokenStore::new(dir.path(), "key");
        store.set("token-with-newline");

        let path = dir.path().join("key");
        if fs::write(&path, "  token-with-newline\n").is_ok() {
            assert_eq!(store.get(), Some("token-with-newline".to_string()));
        }
    }
}
