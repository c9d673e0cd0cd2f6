//! Error types for `deskfs-core`.
//!
//! All fallible operations in the core library return [`VfsResult<T>`],
//! which is an alias for `Result<T, VfsError>`. Every structural mutation
//! that returns an error has left the tree exactly as it found it.

use std::path::PathBuf;

use crate::fs::node::NodeId;

/// Unified error type for all VFS operations.
///
/// Each variant captures just enough context for the caller to display
/// a meaningful message or take corrective action.
#[derive(Debug, thiserror::Error)]
pub enum VfsError {
    /// No live node has this id.
    #[error("node not found: {0}")]
    NotFound(NodeId),

    /// A sibling with the same name already exists in the target folder.
    #[error("name already taken in folder: {name}")]
    NameConflict { name: String },

    /// The node (or a node inside its subtree) is flagged as a system node.
    #[error("system node cannot be changed: {0}")]
    SystemProtected(NodeId),

    /// The file is flagged read-only.
    #[error("file is read-only: {0}")]
    ReadOnly(NodeId),

    /// The requested parent folder does not exist.
    #[error("parent not found: {0}")]
    ParentNotFound(NodeId),

    /// The requested parent is a file, not a folder.
    #[error("parent is a file: {0}")]
    ParentIsFile(NodeId),

    /// A file operation was requested on a folder.
    #[error("node is a folder: {0}")]
    IsFolder(NodeId),

    /// A folder operation was requested on a file.
    #[error("not a folder: {0}")]
    NotAFolder(NodeId),

    /// The target lies inside the subtree being moved or pasted.
    #[error("cannot place {node} inside itself or its descendant {target}")]
    WouldCycle { node: NodeId, target: NodeId },

    /// Paste was requested with nothing on the clipboard.
    #[error("clipboard is empty")]
    ClipboardEmpty,

    /// A node name is invalid (empty, `.`/`..`, contains a separator or NUL).
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    /// No trash entry exists at the given ledger index.
    #[error("no trash entry at index {0}")]
    TrashIndexOutOfRange(usize),

    /// Every node id up to the counter's limit has been handed out.
    #[error("node id space exhausted")]
    IdsExhausted,

    /// A loaded snapshot violates a tree invariant.
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    /// A loaded snapshot was written by an incompatible format version.
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedSnapshotVersion { found: u32, expected: u32 },

    /// The configuration file does not exist.
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// Failed to parse a TOML configuration file.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Failed to encode a snapshot.
    #[error("serialization error: {0}")]
    Serialize(String),

    /// An I/O error raised by a persistence collaborator.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout `deskfs-core`.
pub type VfsResult<T> = Result<T, VfsError>;
