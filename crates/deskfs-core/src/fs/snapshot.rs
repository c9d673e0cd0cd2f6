//! Versioned, serialisable image of the whole VFS and the load/save
//! boundary to a host key-value store.

use std::cell::RefCell;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{VfsError, VfsResult};
use crate::fs::node::{Node, NodeId};
use crate::fs::trash::TrashEntry;
use crate::nav::favorites::Favorites;

/// Format version written by this build.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to rebuild a [`Vfs`](crate::Vfs). The clipboard is
/// transient and not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeState {
    pub version: u32,
    /// Next id to hand out. Persisted so ids are never reissued.
    pub next_id: u64,
    pub root: NodeId,
    #[serde(default)]
    pub trash_anchor: Option<NodeId>,
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub trash: Vec<TrashEntry>,
    #[serde(default)]
    pub favorites: Favorites,
}

impl TreeState {
    /// Parses a JSON snapshot and checks its version.
    ///
    /// # Errors
    ///
    /// - [`VfsError::CorruptSnapshot`] if the JSON does not decode.
    /// - [`VfsError::UnsupportedSnapshotVersion`] for other versions.
    pub fn from_json(json: &str) -> VfsResult<Self> {
        let state: Self =
            serde_json::from_str(json).map_err(|e| VfsError::CorruptSnapshot(e.to_string()))?;
        state.check_version()?;
        Ok(state)
    }

    /// Encodes the snapshot as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// [`VfsError::Serialize`] if encoding fails.
    pub fn to_json(&self) -> VfsResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| VfsError::Serialize(e.to_string()))
    }

    pub(crate) fn check_version(&self) -> VfsResult<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(VfsError::UnsupportedSnapshotVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(())
    }
}

/// Host persistence collaborator. The host loads once at boot and saves
/// after each mutation.
pub trait SnapshotStore {
    /// Returns the stored snapshot, or `None` when nothing was saved yet.
    fn load(&self) -> VfsResult<Option<TreeState>>;

    /// Replaces the stored snapshot.
    fn save(&self, state: &TreeState) -> VfsResult<()>;

    /// Moves the stored snapshot out of the way so the next [`save`](Self::save)
    /// cannot overwrite it. Returns where it went, or `None` if nothing was
    /// stored.
    fn set_aside(&self) -> VfsResult<Option<String>>;
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for &T {
    fn load(&self) -> VfsResult<Option<TreeState>> {
        (**self).load()
    }

    fn save(&self, state: &TreeState) -> VfsResult<()> {
        (**self).save(state)
    }

    fn set_aside(&self) -> VfsResult<Option<String>> {
        (**self).set_aside()
    }
}

/// Stores the snapshot as a JSON file on the host disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where [`set_aside`](SnapshotStore::set_aside) moves the file: the
    /// snapshot path with `.corrupt` appended.
    pub fn set_aside_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".corrupt");
        PathBuf::from(name)
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> VfsResult<Option<TreeState>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(VfsError::Io(e)),
        };
        TreeState::from_json(&content).map(Some)
    }

    /// Writes to a sibling temp file and renames it over the target, so a
    /// crash mid-write never leaves a truncated snapshot.
    fn save(&self, state: &TreeState) -> VfsResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = state.to_json()?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn set_aside(&self) -> VfsResult<Option<String>> {
        let target = self.set_aside_path();
        match std::fs::rename(&self.path, &target) {
            Ok(()) => Ok(Some(target.display().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(VfsError::Io(e)),
        }
    }
}

/// In-process store holding the encoded snapshot, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: RefCell<Option<String>>,
    aside: RefCell<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw JSON last saved, if any.
    pub fn raw(&self) -> Option<String> {
        self.slot.borrow().clone()
    }

    /// Writes raw text into the slot, bypassing encoding.
    pub fn put_raw(&self, raw: impl Into<String>) {
        *self.slot.borrow_mut() = Some(raw.into());
    }

    /// The raw text last moved out of the slot by `set_aside`.
    pub fn set_aside_raw(&self) -> Option<String> {
        self.aside.borrow().clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> VfsResult<Option<TreeState>> {
        self.slot
            .borrow()
            .as_deref()
            .map(TreeState::from_json)
            .transpose()
    }

    fn save(&self, state: &TreeState) -> VfsResult<()> {
        let json = state.to_json()?;
        *self.slot.borrow_mut() = Some(json);
        Ok(())
    }

    fn set_aside(&self) -> VfsResult<Option<String>> {
        let Some(raw) = self.slot.borrow_mut().take() else {
            return Ok(None);
        };
        *self.aside.borrow_mut() = Some(raw);
        Ok(Some("memory".to_string()))
    }
}
