//! The virtual tree and its satellite stores.
//!
//! [`store::NodeStore`] owns every live [`node::Node`]; the
//! [`path::PathResolver`] reads it, while the [`trash::TrashLedger`] and
//! [`clipboard::Clipboard`] mutate it only through the store's own
//! operations. [`snapshot`] turns the whole state into a persistable value.

pub mod clipboard;
pub mod node;
pub mod path;
pub mod snapshot;
pub mod store;
pub mod trash;

pub use clipboard::{suffixed_name, Clipboard, ClipboardMode, ClipboardState, ConflictPolicy};
pub use node::{normalize_name, Node, NodeFlags, NodeId, NodeKind};
pub use path::{PathResolver, SEPARATOR};
pub use snapshot::{JsonFileStore, MemoryStore, SnapshotStore, TreeState, SNAPSHOT_VERSION};
pub use store::{DeletedSubtree, NameMatching, NodeStore, ROOT_NAME};
pub use trash::{TrashEntry, TrashLedger};
