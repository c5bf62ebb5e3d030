//! Session token storage.
//!
//! The token is opaque: nothing here inspects its shape or expiry. Holding a
//! token is only a hint that a session may exist; the identity service decides
//! whether it still resolves to a user.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use crate::constants::storage::TOKEN_KEY;

/// Durable holder of the session token.
///
/// Storage is assumed to be available. Adapters log failures and behave as
/// if no token were stored rather than surfacing them.
pub trait SessionStore: Send + Sync {
    fn save(&self, token: &str);

    fn read(&self) -> Option<String>;

    fn clear(&self);

    fn has_token(&self) -> bool {
        self.read().is_some()
    }
}

/// Key/value storage file shared with other client settings, the token being
/// kept under [`TOKEN_KEY`]. Survives restarts.
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> BTreeMap<String, String> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read session storage");
                return BTreeMap::new();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Session storage is corrupt, ignoring it");
            BTreeMap::new()
        })
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        write_private(&tmp, content.as_bytes())?;
        std::fs::rename(&tmp, &self.path)
    }
}

/// Writes `content` to a fresh file only the owner can read on unix.
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(content)?;
    file.sync_all()
}

impl SessionStore for FileSessionStore {
    fn save(&self, token: &str) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load();
        entries.insert(TOKEN_KEY.to_string(), token.to_string());

        match self.persist(&entries) {
            Ok(()) => debug!(path = %self.path.display(), "Session token stored"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to store session token"),
        }
    }

    fn read(&self) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.load().remove(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    fn clear(&self) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load();
        if entries.remove(TOKEN_KEY).is_none() {
            return;
        }

        match self.persist(&entries) {
            Ok(()) => debug!(path = %self.path.display(), "Session token cleared"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to clear session token"),
        }
    }
}

/// Process-local store, used by tests and one-off tools.
#[derive(Default)]
pub struct MemorySessionStore {
    token: Mutex<Option<String>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, token: &str) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
    }

    fn read(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn clear(&self) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_lifecycle() {
        let store = MemorySessionStore::new();
        assert!(!store.has_token());

        store.save("abc");
        assert_eq!(store.read().as_deref(), Some("abc"));
        assert!(store.has_token());

        store.clear();
        store.clear();
        assert_eq!(store.read(), None);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        FileSessionStore::new(&path).save("tok-1");

        let reopened = FileSessionStore::new(&path);
        assert_eq!(reopened.read().as_deref(), Some("tok-1"));

        reopened.clear();
        assert!(!FileSessionStore::new(&path).has_token());
    }

    #[test]
    fn test_file_store_keeps_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, r#"{"theme":"dark"}"#).unwrap();

        let store = FileSessionStore::new(&path);
        store.save("tok-2");
        store.clear();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("theme"));
        assert!(!content.contains(TOKEN_KEY));
    }

    #[test]
    fn test_corrupt_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileSessionStore::new(&path);
        assert_eq!(store.read(), None);

        store.save("tok-3");
        assert_eq!(store.read().as_deref(), Some("tok-3"));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_private_to_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{}").unwrap();

        let store = FileSessionStore::new(&path);
        store.save("tok-4");
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        store.save("tok-5");
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.read().as_deref(), Some("tok-5"));
    }
}
