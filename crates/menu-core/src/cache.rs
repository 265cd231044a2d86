//! Local snapshot of the last known menu.
//!
//! One slot, keyed by the versioned record key. Loading purges every slot an older
//! schema version could have written; those documents are never read back.

use dashmap::DashMap;
use menu_proto::RecordKey;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::model::MenuTree;

/// Durable key-value slots.
pub trait SlotStorage: Send + Sync {
    fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>>;
    fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// One `<key>.json` file per slot under a directory.
#[derive(Debug, Clone)]
pub struct FsSlots {
    dir: PathBuf,
}

impl FsSlots {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SlotStorage for FsSlots {
    fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        // write-then-rename so a crash never leaves half a document
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, self.path(key))
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

#[derive(Debug, Default)]
pub struct MemorySlots {
    map: DashMap<String, Vec<u8>>,
}

impl MemorySlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl SlotStorage for MemorySlots {
    fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.map.get(key).map(|v| v.value().clone()))
    }

    fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        self.map.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.map.remove(key);
        Ok(())
    }
}

#[derive(Clone)]
pub struct LocalCache {
    storage: Arc<dyn SlotStorage>,
    key: RecordKey,
}

impl LocalCache {
    pub fn new(storage: Arc<dyn SlotStorage>, key: RecordKey) -> Self {
        Self { storage, key }
    }

    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    /// Last stored tree, or `None` when the slot is empty, unreadable or holds a
    /// document that no longer validates.
    pub fn load(&self) -> Option<MenuTree> {
        self.purge_prior_versions();

        let bytes = match self.storage.read(self.key.as_str()) {
            Ok(Some(b)) => b,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read menu cache {}: {}", self.key, e);
                return None;
            }
        };

        match MenuTree::from_json_slice(&bytes) {
            Ok(tree) => {
                debug!("Loaded {} sections from menu cache {}", tree.len(), self.key);
                Some(tree)
            }
            Err(e) => {
                warn!("Ignoring unusable menu cache {}: {}", self.key, e);
                None
            }
        }
    }

    /// Best effort: the remote is authoritative, so failures are only logged.
    pub fn store(&self, tree: &MenuTree) {
        let bytes = match tree.to_json_vec() {
            Ok(b) => b,
            Err(e) => {
                warn!("Failed to encode menu for cache: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.write(self.key.as_str(), &bytes) {
            warn!("Failed to write menu cache {}: {}", self.key, e);
        }
    }

    fn purge_prior_versions(&self) {
        for old in self.key.prior_keys() {
            if let Err(e) = self.storage.remove(&old) {
                warn!("Failed to purge old menu cache {}: {}", old, e);
            }
        }
    }
}
