//! Single-slot clipboard driving copy/cut/paste.

use serde::{Deserialize, Serialize};

use crate::error::{VfsError, VfsResult};
use crate::fs::node::NodeId;
use crate::fs::path::PathResolver;
use crate::fs::store::NodeStore;

/// What a paste will do with the held node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardMode {
    /// Duplicate the subtree; the clipboard keeps holding the source.
    Copy,
    /// Move the subtree; a successful paste consumes the clipboard.
    Cut,
}

/// Observable clipboard contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClipboardState {
    #[default]
    Empty,
    Holding { source: NodeId, mode: ClipboardMode },
}

/// How paste handles a destination folder that already has a child with
/// the pasted node's name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Reject the paste with [`VfsError::NameConflict`].
    #[default]
    Fail,
    /// Pick the first free `name (n).ext`.
    Suffix,
}

/// Holds at most one pending copy or cut.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    state: ClipboardState,
    policy: ConflictPolicy,
}

impl Clipboard {
    pub fn new(policy: ConflictPolicy) -> Self {
        Self {
            state: ClipboardState::Empty,
            policy,
        }
    }

    pub fn state(&self) -> ClipboardState {
        self.state
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    pub fn is_empty(&self) -> bool {
        self.state == ClipboardState::Empty
    }

    pub fn clear(&mut self) {
        self.state = ClipboardState::Empty;
    }

    /// Holds `id` for copying, replacing anything held before.
    ///
    /// # Errors
    ///
    /// [`VfsError::NotFound`] if `id` is not live; the clipboard is unchanged.
    pub fn copy(&mut self, store: &NodeStore, id: NodeId) -> VfsResult<()> {
        self.hold(store, id, ClipboardMode::Copy)
    }

    /// Holds `id` for moving, replacing anything held before.
    ///
    /// # Errors
    ///
    /// [`VfsError::NotFound`] if `id` is not live; the clipboard is unchanged.
    pub fn cut(&mut self, store: &NodeStore, id: NodeId) -> VfsResult<()> {
        self.hold(store, id, ClipboardMode::Cut)
    }

    fn hold(&mut self, store: &NodeStore, id: NodeId, mode: ClipboardMode) -> VfsResult<()> {
        if !store.contains(id) {
            return Err(VfsError::NotFound(id));
        }
        self.state = ClipboardState::Holding { source: id, mode };
        Ok(())
    }

    /// Pastes the held node into `target` and returns the id of the node now
    /// living there: a fresh copy, or the moved source itself.
    ///
    /// # Errors
    ///
    /// - [`VfsError::ClipboardEmpty`] if nothing is held.
    /// - [`VfsError::NotFound`] if the held node is no longer live.
    /// - [`VfsError::ParentNotFound`] / [`VfsError::ParentIsFile`] if `target`
    ///   is not a live folder.
    /// - [`VfsError::WouldCycle`] if `target` is the source or inside it.
    /// - [`VfsError::NameConflict`] under [`ConflictPolicy::Fail`].
    /// - [`VfsError::SystemProtected`] when cutting a system node.
    ///
    /// A failed paste leaves both the tree and the clipboard unchanged.
    pub fn paste(&mut self, store: &mut NodeStore, target: NodeId) -> VfsResult<NodeId> {
        let ClipboardState::Holding { source, mode } = self.state else {
            return Err(VfsError::ClipboardEmpty);
        };
        let source_node = store.get(source).ok_or(VfsError::NotFound(source))?;
        let name = source_node.name().to_string();
        let target_node = store.get(target).ok_or(VfsError::ParentNotFound(target))?;
        if target == source || PathResolver::new(store).is_descendant_of(target, source) {
            return Err(VfsError::WouldCycle {
                node: source,
                target,
            });
        }
        if !target_node.is_folder() {
            return Err(VfsError::ParentIsFile(target));
        }

        match mode {
            ClipboardMode::Copy => {
                let name = self.destination_name(store, target, &name, None);
                let copy = store.duplicate(source, target, &name)?;
                tracing::debug!(%source, %copy, %target, "pasted copy");
                Ok(copy)
            }
            ClipboardMode::Cut => {
                let unique = self.destination_name(store, target, &name, Some(source));
                if unique == name {
                    store.move_node(source, target)?;
                } else {
                    store.move_renamed(source, target, &unique)?;
                }
                self.state = ClipboardState::Empty;
                tracing::debug!(%source, %target, "pasted cut");
                Ok(source)
            }
        }
    }

    fn destination_name(
        &self,
        store: &NodeStore,
        target: NodeId,
        name: &str,
        except: Option<NodeId>,
    ) -> String {
        match self.policy {
            ConflictPolicy::Fail => name.to_string(),
            ConflictPolicy::Suffix => {
                let mut candidate = name.to_string();
                let mut n = 1;
                while store.find_child_except(target, &candidate, except).is_some() {
                    candidate = suffixed_name(name, n);
                    n += 1;
                }
                candidate
            }
        }
    }
}

/// Inserts ` (n)` before the extension: `report.txt` becomes `report (2).txt`,
/// `notes` becomes `notes (2)`.
pub fn suffixed_name(name: &str, n: usize) -> String {
    match name.rfind('.') {
        Some(idx) if idx > 0 => format!("{} ({n}){}", &name[..idx], &name[idx..]),
        _ => format!("{name} ({n})"),
    }
}
