//! Document store for hymnbook
//!
//! Preferences, usage counters, trial timestamps and remote-config documents
//! all live behind [`DocumentStore`]. Documents are addressed by a
//! `(collection, id)` pair and hold arbitrary JSON.
//!
//! # Error Handling
//!
//! Reads that feed the UI are best-effort. Callers typically map a
//! [`StoreError`] to a safe default (empty usage, `false` flags) and log it,
//! because a missing or unreadable document must never block the app.
//! Writes return the error so user-triggered actions can surface a notice.

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

const LOCK_FILE: &str = ".lock";
const STORE_LOCK_TIMEOUT_SECS: u64 = 5;
const STORE_LOCK_RETRY_MS: u64 = 50;

/// Errors surfaced by a [`DocumentStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("document is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("timed out waiting for store lock ({0}s)")]
    LockTimeout(u64),

    #[error("invalid document key: {0:?}")]
    InvalidKey(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Store handle shared by the tracker and controllers
pub type SharedStore = Arc<dyn DocumentStore>;

/// Key-value document persistence.
///
/// Implementations are expected to be eventually consistent at worst; the
/// callers in this crate never rely on read-your-writes across processes.
pub trait DocumentStore: Send + Sync {
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>>;

    fn put(&self, collection: &str, id: &str, value: Value) -> StoreResult<()>;

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Ids of every document in a collection, sorted.
    fn list(&self, collection: &str) -> StoreResult<Vec<String>>;
}

/// Read and deserialize a document
pub fn get_doc<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
) -> StoreResult<Option<T>> {
    match store.get(collection, id)? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Serialize and write a document
pub fn put_doc<T: Serialize>(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
    doc: &T,
) -> StoreResult<()> {
    store.put(collection, id, serde_json::to_value(doc)?)
}

/// Collection and id segments become path components, so keep them boring.
fn validate_key(key: &str) -> StoreResult<()> {
    let valid = !key.is_empty()
        && key != "."
        && !key.contains("..")
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  JSON FILE STORE
// ═══════════════════════════════════════════════════════════════════════════

/// One JSON file per document: `<root>/<collection>/<id>.json`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

struct StoreLock {
    file: std::fs::File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn doc_path(&self, collection: &str, id: &str) -> StoreResult<PathBuf> {
        validate_key(collection)?;
        validate_key(id)?;
        Ok(self.root.join(collection).join(format!("{}.json", id)))
    }

    fn lock(&self, exclusive: bool) -> StoreResult<StoreLock> {
        fs::create_dir_all(&self.root)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.root.join(LOCK_FILE))?;

        let start = Instant::now();
        loop {
            let result = if exclusive {
                FileExt::try_lock_exclusive(&file)
            } else {
                FileExt::try_lock_shared(&file)
            };
            match result {
                Ok(()) => break,
                Err(err) => {
                    if err.kind() != ErrorKind::WouldBlock {
                        return Err(err.into());
                    }
                    if start.elapsed() >= Duration::from_secs(STORE_LOCK_TIMEOUT_SECS) {
                        return Err(StoreError::LockTimeout(STORE_LOCK_TIMEOUT_SECS));
                    }
                    std::thread::sleep(Duration::from_millis(STORE_LOCK_RETRY_MS));
                }
            }
        }

        Ok(StoreLock { file })
    }
}

impl DocumentStore for JsonFileStore {
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        let path = self.doc_path(collection, id)?;
        if !path.exists() {
            return Ok(None);
        }

        let _lock = self.lock(false)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn put(&self, collection: &str, id: &str, value: Value) -> StoreResult<()> {
        let path = self.doc_path(collection, id)?;
        let _lock = self.lock(true)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&value)?;
        write_atomic(&path, &content)?;
        tracing::trace!(collection, id, "document written");
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let path = self.doc_path(collection, id)?;
        let _lock = self.lock(true)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn list(&self, collection: &str) -> StoreResult<Vec<String>> {
        validate_key(collection)?;
        let dir = self.root.join(collection);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let _lock = self.lock(false)?;
        let mut ids: Vec<String> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                name.strip_suffix(".json").map(str::to_string)
            })
            .collect();
        ids.sort();
        Ok(ids)
    }
}

pub(crate) fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let tmp_path = path.with_extension("tmp");
    // Private from creation; the bytes never sit in a wider-mode file
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let written = options
        .open(&tmp_path)
        .and_then(|mut file| file.write_all(content.as_bytes()));
    if let Err(err) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }

    #[cfg(unix)]
    {
        // mode() is ignored when a stale tmp file already exists
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
    }

    #[cfg(windows)]
    {
        // rename() does not replace an existing file on Windows
        if path.exists() {
            let _ = fs::remove_file(path);
        }
    }

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
//  MEMORY STORE
// ═══════════════════════════════════════════════════════════════════════════

/// In-process store. `set_unavailable(true)` makes every call fail, which is
/// how callers' fallback paths get exercised.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<(String, String), Value>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self, collection: &str, id: Option<&str>) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        validate_key(collection)?;
        if let Some(id) = id {
            validate_key(id)?;
        }
        Ok(())
    }

    fn docs(&self) -> StoreResult<std::sync::MutexGuard<'_, BTreeMap<(String, String), Value>>> {
        self.docs
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".to_string()))
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        self.check(collection, Some(id))?;
        Ok(self
            .docs()?
            .get(&(collection.to_string(), id.to_string()))
            .cloned())
    }

    fn put(&self, collection: &str, id: &str, value: Value) -> StoreResult<()> {
        self.check(collection, Some(id))?;
        self.docs()?
            .insert((collection.to_string(), id.to_string()), value);
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.check(collection, Some(id))?;
        self.docs()?
            .remove(&(collection.to_string(), id.to_string()));
        Ok(())
    }

    fn list(&self, collection: &str) -> StoreResult<Vec<String>> {
        self.check(collection, None)?;
        Ok(self
            .docs()?
            .keys()
            .filter(|(c, _)| c == collection)
            .map(|(_, id)| id.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Pref {
        dark: bool,
        color: String,
    }

    #[test]
    fn test_file_store_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        assert!(store.get("prefs", "theme").unwrap().is_none());

        store
            .put("prefs", "theme", json!({"dark": true, "color": "Teal"}))
            .unwrap();
        let pref: Pref = get_doc(&store, "prefs", "theme").unwrap().unwrap();
        assert_eq!(
            pref,
            Pref {
                dark: true,
                color: "Teal".to_string()
            }
        );
        assert!(dir.path().join("prefs").join("theme.json").exists());
        assert!(!dir.path().join("prefs").join("theme.tmp").exists());

        store.delete("prefs", "theme").unwrap();
        assert!(store.get("prefs", "theme").unwrap().is_none());
        // Deleting twice is fine
        store.delete("prefs", "theme").unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_documents_are_private_even_over_stale_tmp() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let collection = dir.path().join("auth");
        fs::create_dir_all(&collection).unwrap();
        let stale = collection.join("current.tmp");
        fs::write(&stale, "leftover").unwrap();
        fs::set_permissions(&stale, fs::Permissions::from_mode(0o644)).unwrap();

        store.put("auth", "current", json!({"uid": "u1"})).unwrap();

        let mode = fs::metadata(collection.join("current.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!stale.exists());
        assert_eq!(store.get("auth", "current").unwrap(), Some(json!({"uid": "u1"})));
    }

    #[test]
    fn test_file_store_list_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        for id in ["2026-10-03", "2026-10-01", "2026-10-02"] {
            store.put("usage_daily", id, json!({})).unwrap();
        }
        assert_eq!(
            store.list("usage_daily").unwrap(),
            vec!["2026-10-01", "2026-10-02", "2026-10-03"]
        );
        assert!(store.list("missing").unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        fs::create_dir_all(dir.path().join("prefs")).unwrap();
        fs::write(dir.path().join("prefs").join("theme.json"), "{not json").unwrap();
        assert!(matches!(
            store.get("prefs", "theme"),
            Err(StoreError::Serde(_))
        ));
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let store = MemoryStore::new();
        for key in ["", "..", "../etc", "a/b", "a b"] {
            assert!(matches!(
                store.put("prefs", key, json!(1)),
                Err(StoreError::InvalidKey(_))
            ));
        }
        let dir = tempfile::tempdir().unwrap();
        let file_store = JsonFileStore::new(dir.path());
        assert!(file_store.get("../outside", "x").is_err());
    }

    #[test]
    fn test_memory_store_unavailable() {
        let store = MemoryStore::new();
        put_doc(&store, "users", "u1", &json!({"premium": true})).unwrap();
        store.set_unavailable(true);
        assert!(matches!(
            store.get("users", "u1"),
            Err(StoreError::Unavailable(_))
        ));
        store.set_unavailable(false);
        assert!(store.get("users", "u1").unwrap().is_some());
        assert_eq!(store.list("users").unwrap(), vec!["u1"]);
    }
}
