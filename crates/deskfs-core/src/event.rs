//! Command and event types for communication between a frontend and the VFS.
//!
//! A frontend translates user input into [`Command`]s, which
//! [`Vfs::execute`](crate::Vfs::execute) applies and answers with an
//! [`Event`]. This keeps every explorer front end on the same core logic.

use crate::fs::clipboard::ClipboardState;
use crate::fs::node::{NodeFlags, NodeId, NodeKind};

/// A mutation the frontend asks the VFS to perform.
///
/// Commands flow **frontend → core**. The core never creates commands itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a file or folder under `parent`.
    Create {
        kind: NodeKind,
        name: String,
        parent: NodeId,
        content: Option<String>,
    },
    /// Rename a node in place.
    Rename(NodeId, String),
    /// Replace a file's content.
    SetContent(NodeId, String),
    /// Update the `read_only` / `hidden` flags.
    SetFlags(NodeId, NodeFlags),
    /// Reparent a node.
    Move(NodeId, NodeId),
    /// Trash a live node, or purge a node that is already a trash entry.
    Delete(NodeId),
    /// Restore the trash entry at the given index.
    Restore(usize),
    /// Permanently drop the trash entry at the given index.
    Purge(usize),
    /// Permanently drop every trash entry.
    EmptyTrash,
    /// Hold a node for copying.
    Copy(NodeId),
    /// Hold a node for moving.
    Cut(NodeId),
    /// Paste the held node into the given folder.
    Paste(NodeId),
    /// Drop whatever the clipboard holds.
    ClearClipboard,
    /// Add a node to favorites.
    Favorite(NodeId),
    /// Remove a node from favorites.
    Unfavorite(NodeId),
}

impl Command {
    /// Short operation label used in [`Event::OperationFailed`].
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Rename(..) => "rename",
            Self::SetContent(..) => "write",
            Self::SetFlags(..) => "set flags",
            Self::Move(..) => "move",
            Self::Delete(_) => "delete",
            Self::Restore(_) => "restore",
            Self::Purge(_) => "purge",
            Self::EmptyTrash => "empty trash",
            Self::Copy(_) => "copy",
            Self::Cut(_) => "cut",
            Self::Paste(_) => "paste",
            Self::ClearClipboard => "clear clipboard",
            Self::Favorite(_) => "favorite",
            Self::Unfavorite(_) => "unfavorite",
        }
    }
}

/// A notification the core sends back to the frontend.
///
/// Events flow **core → frontend**. The frontend uses these to refresh its
/// view and decide whether to persist a new snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A node was created.
    Created(NodeId),
    /// A node's name, content, flags or parent changed.
    Changed(NodeId),
    /// A node moved to the trash ledger at `index`.
    Trashed { id: NodeId, index: usize },
    /// A trash entry was restored; its top node is live again.
    Restored(NodeId),
    /// A trash entry was dropped for good.
    Purged(NodeId),
    /// The whole trash ledger was emptied.
    TrashEmptied {
        /// Number of entries dropped.
        count: usize,
    },
    /// A paste placed this node in the target folder.
    Pasted(NodeId),
    /// The clipboard now holds something else.
    ClipboardChanged(ClipboardState),
    /// The favorite set changed.
    FavoritesChanged,
    /// The command was valid but had nothing to do.
    Unchanged,
    /// The command failed; the VFS is unchanged.
    OperationFailed {
        /// Human-readable description of the operation.
        operation: String,
        /// The error message.
        error: String,
    },
}

impl Event {
    /// Returns `true` if the event reflects a change that belongs in the
    /// persisted snapshot. Clipboard changes are transient.
    #[must_use]
    pub fn is_persistent_change(&self) -> bool {
        !matches!(
            self,
            Self::ClipboardChanged(_) | Self::Unchanged | Self::OperationFailed { .. }
        )
    }
}
