//! Lock document persistence
//!
//! The lock file lives in the project (default `rolelock.lock.json`) and is
//! always replaced atomically.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::LockDocument;
use crate::error::ResolveError;

/// Lock file storage and persistence
#[derive(Debug, Clone)]
pub struct LockfileStore {
    path: PathBuf,
}

impl LockfileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and validate the lock document.
    ///
    /// Returns `None` if the file doesn't exist.
    pub fn load(&self) -> Result<Option<LockDocument>, ResolveError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path)?;
        let document: LockDocument = serde_json::from_slice(&bytes).map_err(|e| {
            ResolveError::LockFormat(format!("failed to parse {}: {}", self.path.display(), e))
        })?;
        document.validate()?;
        Ok(Some(document))
    }

    /// Save the lock document atomically (tmp + rename)
    pub fn save(&self, document: &LockDocument) -> Result<(), ResolveError> {
        document.validate()?;
        // Serialize first so a failure leaves the previous file untouched
        let json = document.to_json_pretty()?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "rolelock.lock.json".to_string());
        let tmp_path = dir.join(format!(".{}.{}.tmp", file_name, std::process::id()));

        if let Err(e) = write_synced(&tmp_path, json.as_bytes())
            .and_then(|()| fs::rename(&tmp_path, &self.path))
        {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        debug!("Wrote lock file {}", self.path.display());
        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat::InterpreterSpec;
    use crate::lockfile::types::{LockedCollection, LockedRole, LockedTool};
    use crate::lockfile::LOCK_FORMAT_VERSION;

    fn document() -> LockDocument {
        let mut document = LockDocument {
            format_version: LOCK_FORMAT_VERSION,
            generated_at: chrono::Utc::now(),
            content_hash: String::new(),
            integrity_hash: String::new(),
            python: InterpreterSpec {
                min: "3.11".to_string(),
                max: "3.12".to_string(),
                pinned: "3.12.8".to_string(),
                additional: Vec::new(),
            },
            tools: vec![LockedTool {
                name: "ansible".to_string(),
                constraint: ">=10.0.0".to_string(),
                resolved_version: "10.7.0".to_string(),
                source: "pypi".to_string(),
            }],
            collections: vec![LockedCollection {
                name: "community.general".to_string(),
                constraint: "latest".to_string(),
                resolved_version: "9.5.0".to_string(),
                source: "galaxy".to_string(),
                dependencies: [("ansible.utils".to_string(), "*".to_string())].into(),
            }],
            roles: Vec::new(),
        };
        document.seal();
        document
    }

    #[test]
    fn test_save_then_load() {
        let temp = tempfile::tempdir().unwrap();
        let store = LockfileStore::new(temp.path().join("locks").join("rolelock.lock.json"));
        assert!(store.load().unwrap().is_none());

        let original = document();
        store.save(&original).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, original);
        loaded.verify_integrity().unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(store.path().parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_failed_save_leaves_no_tmp_file() {
        let temp = tempfile::tempdir().unwrap();
        // A directory in place of the lock file makes the rename fail.
        let path = temp.path().join("rolelock.lock.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();

        let store = LockfileStore::new(path);
        assert!(matches!(store.save(&document()), Err(ResolveError::Io(_))));

        let leftovers: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_save_replaces_existing() {
        let temp = tempfile::tempdir().unwrap();
        let store = LockfileStore::new(temp.path().join("rolelock.lock.json"));
        store.save(&document()).unwrap();

        let mut updated = document();
        updated.tools[0].resolved_version = "10.8.0".to_string();
        store.save(&updated).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.tools[0].resolved_version, "10.8.0");
    }

    #[test]
    fn test_load_rejects_unknown_format_version() {
        let temp = tempfile::tempdir().unwrap();
        let store = LockfileStore::new(temp.path().join("rolelock.lock.json"));
        let mut doc = document();
        doc.format_version = 2;
        std::fs::write(store.path(), serde_json::to_string(&doc).unwrap()).unwrap();
        assert!(matches!(store.load(), Err(ResolveError::LockFormat(_))));
    }

    #[test]
    fn test_load_rejects_unsupported_interpreter() {
        let temp = tempfile::tempdir().unwrap();
        let store = LockfileStore::new(temp.path().join("rolelock.lock.json"));
        let mut doc = document();
        doc.python.pinned = "3.12.0".to_string();
        std::fs::write(store.path(), serde_json::to_string(&doc).unwrap()).unwrap();
        assert!(matches!(store.load(), Err(ResolveError::LockFormat(_))));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let temp = tempfile::tempdir().unwrap();
        let store = LockfileStore::new(temp.path().join("rolelock.lock.json"));
        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(store.load(), Err(ResolveError::LockFormat(_))));
    }

    #[test]
    fn test_persisted_field_names() {
        let temp = tempfile::tempdir().unwrap();
        let store = LockfileStore::new(temp.path().join("rolelock.lock.json"));
        let mut doc = document();
        doc.roles.push(LockedRole {
            name: "web".to_string(),
            constraint: "latest".to_string(),
            resolved_version: "v1.2.0".to_string(),
            source: "git".to_string(),
            src: Some("https://git.example.com/acme/web.git".to_string()),
            scm: Some("git".to_string()),
        });
        doc.seal();
        store.save(&doc).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"python_deps\""));
        assert!(raw.contains("\"src_url\""));
        assert!(!raw.contains("\"dependencies\""));
        assert!(raw.ends_with('\n'));
    }

    #[test]
    fn test_hand_edit_breaks_integrity() {
        let mut doc = document();
        doc.collections[0].constraint = "==9.0.0".to_string();
        assert!(doc.verify_integrity().is_err());
    }

    #[test]
    fn test_edited_resolution_breaks_integrity() {
        let mut doc = document();
        doc.verify_integrity().unwrap();
        doc.tools[0].resolved_version = "1.0.0-evil".to_string();
        doc.tools[0].source = "elsewhere".to_string();
        match doc.verify_integrity() {
            Err(ResolveError::LockFormat(msg)) => assert!(msg.contains("integrity hash")),
            other => panic!("expected integrity mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_edited_role_source_breaks_integrity() {
        let mut doc = document();
        doc.roles.push(LockedRole {
            name: "web".to_string(),
            constraint: "latest".to_string(),
            resolved_version: "v1.2.0".to_string(),
            source: "git".to_string(),
            src: Some("https://git.example.com/acme/web.git".to_string()),
            scm: Some("git".to_string()),
        });
        doc.seal();
        doc.verify_integrity().unwrap();

        let mut moved = doc.clone();
        moved.roles[0].src = Some("https://mirror.example.com/acme/web.git".to_string());
        assert!(moved.verify_integrity().is_err());

        let mut retagged = doc.clone();
        retagged.roles[0].resolved_version = "v9.9.9".to_string();
        assert!(retagged.verify_integrity().is_err());

        let mut deps = doc;
        deps.collections[0].dependencies.clear();
        assert!(deps.verify_integrity().is_err());
    }
}
