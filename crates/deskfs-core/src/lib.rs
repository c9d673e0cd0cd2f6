//! DeskFS core library: the virtual file system of a simulated desktop.
//!
//! `deskfs-core` holds the whole VFS behind the desktop's File Explorer: a
//! hierarchical tree of text files and folders, a recycle-bin ledger,
//! clipboard-driven copy/cut/paste, favorites, and path/search resolution.
//! It never touches the host disk except through a [`SnapshotStore`], so
//! any frontend (the `deskfs-shell` REPL, a GUI) can drive it.
//!
//! # Modules
//!
//! - [`fs`]: the tree, [`Node`], [`NodeStore`], paths, trash, clipboard and snapshots.
//! - [`nav`]: search (substring and fuzzy), favorites, and listing sorts.
//! - [`vfs`]: the [`Vfs`] aggregate that owns every store.
//! - [`config`]: settings read from TOML.
//! - [`event`]: commands a frontend issues and the events it gets back.
//! - [`error`]: [`VfsError`] and the [`VfsResult`] alias.

pub mod config;
pub mod error;
pub mod event;
pub mod fs;
pub mod nav;
pub mod vfs;

pub use error::{VfsError, VfsResult};
pub use event::{Command, Event};
pub use fs::{
    suffixed_name, ClipboardMode, ClipboardState, ConflictPolicy, DeletedSubtree, JsonFileStore,
    MemoryStore, NameMatching, Node, NodeFlags, NodeId, NodeKind, NodeStore, PathResolver,
    SnapshotStore, TrashEntry, TreeState, SNAPSHOT_VERSION,
};
pub use nav::favorites::Favorites;
pub use nav::filter::{sort_nodes, SortDirection, SortField};
pub use nav::search::{FuzzyMatch, SearchOptions};
pub use vfs::{DeleteOutcome, Vfs, VfsOptions, SYSTEM_FOLDERS, TRASH_FOLDER};

pub use config::settings::Config;

/// Normalises a string to NFC (composed) form.
///
/// Names typed on macOS hosts arrive in NFD (decomposed), which makes Korean
/// Hangul render as individual Jamo and breaks sibling-name comparison. This
/// helper re-composes them.
pub fn nfc_string(s: &str) -> String {
    use unicode_normalization::UnicodeNormalization;
    s.nfc().collect()
}
