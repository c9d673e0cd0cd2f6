//! Node representation: files and folders of the virtual tree.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{VfsError, VfsResult};

/// Opaque, never-reused identifier of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Wraps a raw id. Only the store hands out ids for live nodes; this
    /// exists for snapshots and tests.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a node is a file or a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

/// Protection and visibility flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFlags {
    /// Cannot be deleted, renamed or moved.
    #[serde(default)]
    pub system: bool,
    /// Content cannot be changed.
    #[serde(default)]
    pub read_only: bool,
    /// Excluded from default listings and searches.
    #[serde(default)]
    pub hidden: bool,
}

impl NodeFlags {
    /// Flags for the seeded system folders.
    #[must_use]
    pub fn system() -> Self {
        Self {
            system: true,
            ..Self::default()
        }
    }
}

/// A single file or folder record.
///
/// Nodes reference each other only by [`NodeId`]: a node stores its parent id
/// and, for folders, the ordered ids of its children. Fields are private so the
/// [`NodeStore`](crate::fs::store::NodeStore) stays the only writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    name: String,
    kind: NodeKind,
    parent: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<NodeId>,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
    #[serde(default)]
    flags: NodeFlags,
}

impl Node {
    pub(crate) fn new_folder(
        id: NodeId,
        name: String,
        parent: Option<NodeId>,
        flags: NodeFlags,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            kind: NodeKind::Folder,
            parent,
            content: None,
            children: Vec::new(),
            created_at: now,
            modified_at: now,
            flags,
        }
    }

    pub(crate) fn new_file(
        id: NodeId,
        name: String,
        parent: NodeId,
        content: String,
        flags: NodeFlags,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            kind: NodeKind::File,
            parent: Some(parent),
            content: Some(content),
            children: Vec::new(),
            created_at: now,
            modified_at: now,
            flags,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// The containing folder, `None` only for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// File payload; `None` for folders.
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Child ids in insertion order. Always empty for files.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    pub fn is_system(&self) -> bool {
        self.flags.system
    }

    pub fn is_read_only(&self) -> bool {
        self.flags.read_only
    }

    pub fn is_hidden(&self) -> bool {
        self.flags.hidden
    }

    /// Content length in bytes for files, number of entries for folders.
    pub fn size(&self) -> u64 {
        match self.kind {
            NodeKind::File => self.content.as_ref().map_or(0, |c| c.len() as u64),
            NodeKind::Folder => self.children.len() as u64,
        }
    }

    /// Extension derived from the name (text after the last `.`).
    ///
    /// Folders, names without a dot, dot-files such as `.profile` and names
    /// ending in a dot have no extension.
    pub fn extension(&self) -> Option<&str> {
        if self.is_folder() {
            return None;
        }
        match self.name.rfind('.') {
            Some(idx) if idx > 0 && idx + 1 < self.name.len() => Some(&self.name[idx + 1..]),
            _ => None,
        }
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }

    pub(crate) fn set_name(&mut self, name: String, now: DateTime<Utc>) {
        self.name = name;
        self.modified_at = now;
    }

    pub(crate) fn set_parent(&mut self, parent: NodeId) {
        self.parent = Some(parent);
    }

    pub(crate) fn set_content(&mut self, content: String, now: DateTime<Utc>) {
        self.content = Some(content);
        self.modified_at = now;
    }

    pub(crate) fn set_flags(&mut self, flags: NodeFlags) {
        self.flags = flags;
    }

    pub(crate) fn set_children(&mut self, children: Vec<NodeId>) {
        self.children = children;
    }

    pub(crate) fn set_timestamps(&mut self, now: DateTime<Utc>) {
        self.created_at = now;
        self.modified_at = now;
    }

    pub(crate) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    pub(crate) fn remove_child(&mut self, child: NodeId) {
        self.children.retain(|c| *c != child);
    }
}

/// Normalises a raw name to NFC and checks that it can live in a folder.
///
/// A valid name is non-empty, not `.` or `..`, and contains neither the
/// path separator nor NUL.
pub fn normalize_name(raw: &str) -> VfsResult<String> {
    let name = crate::nfc_string(raw);
    if name.is_empty() || name == "." || name == ".." {
        return Err(VfsError::InvalidName(name));
    }
    if name.contains(crate::fs::path::SEPARATOR) || name.contains('\0') {
        return Err(VfsError::InvalidName(name));
    }
    Ok(name)
}
