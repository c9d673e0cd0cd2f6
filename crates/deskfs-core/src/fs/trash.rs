//! Recycle-bin ledger of soft-deleted subtrees.
//!
//! A node is `Live` while it sits in the [`NodeStore`], `Trashed` while its
//! subtree is held by a [`TrashEntry`], and gone for good once that entry is
//! purged. Restoring moves a `Trashed` subtree back to `Live` with its
//! original ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{VfsError, VfsResult};
use crate::fs::node::{Node, NodeId};
use crate::fs::store::{DeletedSubtree, NodeStore};

/// One soft-deleted top-level node together with its subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashEntry {
    subtree: DeletedSubtree,
    original_parent: NodeId,
    deleted_at: DateTime<Utc>,
}

impl TrashEntry {
    /// The deleted top-level node.
    pub fn node(&self) -> &Node {
        self.subtree.top()
    }

    /// Every node removed with this entry, top node first.
    pub fn subtree(&self) -> &DeletedSubtree {
        &self.subtree
    }

    /// The folder the node is restored into.
    pub fn original_parent(&self) -> NodeId {
        self.original_parent
    }

    pub fn deleted_at(&self) -> DateTime<Utc> {
        self.deleted_at
    }
}

/// Ordered list of trash entries, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrashLedger {
    entries: Vec<TrashEntry>,
}

impl TrashLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: Vec<TrashEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[TrashEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&TrashEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry whose top-level node is `id`.
    pub fn position_of(&self, id: NodeId) -> Option<usize> {
        self.entries.iter().position(|e| e.node().id() == id)
    }

    /// Returns `true` if `id` is held anywhere inside the ledger.
    pub fn holds(&self, id: NodeId) -> bool {
        self.entries.iter().any(|e| e.subtree.contains(id))
    }

    /// Detaches `id` from the store and records it as the newest entry.
    /// Returns the new entry's index.
    ///
    /// # Errors
    ///
    /// - [`VfsError::NotFound`] if `id` is not live.
    /// - [`VfsError::SystemProtected`] if any node in the subtree is a system
    ///   node.
    pub fn soft_delete(&mut self, store: &mut NodeStore, id: NodeId) -> VfsResult<usize> {
        let subtree = store.delete(id)?;
        let original_parent = subtree.original_parent().unwrap_or_else(|| store.root());
        self.entries.push(TrashEntry {
            subtree,
            original_parent,
            deleted_at: Utc::now(),
        });
        tracing::debug!(%id, %original_parent, "moved to trash");
        Ok(self.entries.len() - 1)
    }

    /// Reattaches the entry at `index` under its original parent and removes
    /// it from the ledger. On failure the entry stays where it is.
    ///
    /// # Errors
    ///
    /// - [`VfsError::TrashIndexOutOfRange`] if there is no such entry.
    /// - [`VfsError::NameConflict`] if the original parent now holds a node
    ///   with the same name.
    /// - [`VfsError::ParentNotFound`] / [`VfsError::ParentIsFile`] if the
    ///   original parent is no longer a live folder.
    pub fn restore(&mut self, store: &mut NodeStore, index: usize) -> VfsResult<NodeId> {
        let entry = self
            .entries
            .get(index)
            .ok_or(VfsError::TrashIndexOutOfRange(index))?;
        let id = store.reattach(entry.subtree.clone(), entry.original_parent)?;
        self.entries.remove(index);
        tracing::debug!(%id, "restored from trash");
        Ok(id)
    }

    /// Permanently drops the entry at `index`. Its nodes are unrecoverable.
    ///
    /// # Errors
    ///
    /// [`VfsError::TrashIndexOutOfRange`] if there is no such entry.
    pub fn purge(&mut self, index: usize) -> VfsResult<TrashEntry> {
        if index >= self.entries.len() {
            return Err(VfsError::TrashIndexOutOfRange(index));
        }
        let entry = self.entries.remove(index);
        tracing::debug!(id = %entry.node().id(), "purged from trash");
        Ok(entry)
    }

    /// Purges every entry and returns how many were dropped.
    pub fn empty_all(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        tracing::debug!(count, "emptied trash");
        count
    }
}
