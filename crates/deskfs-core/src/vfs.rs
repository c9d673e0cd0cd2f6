//! The VFS aggregate: one owned value holding the node store, trash ledger,
//! clipboard and favorites.
//!
//! Every mutation goes through `&mut self`, so a host that needs to share a
//! [`Vfs`] between callers wraps the whole value in a single lock. Nothing
//! here touches the host disk; persistence happens through
//! [`snapshot`](Vfs::snapshot) and a [`SnapshotStore`](crate::SnapshotStore).

use std::collections::HashSet;

use crate::error::{VfsError, VfsResult};
use crate::event::{Command, Event};
use crate::fs::clipboard::{Clipboard, ClipboardState, ConflictPolicy};
use crate::fs::node::{Node, NodeFlags, NodeId, NodeKind};
use crate::fs::path::PathResolver;
use crate::fs::snapshot::{TreeState, SNAPSHOT_VERSION};
use crate::fs::store::{NameMatching, NodeStore};
use crate::fs::trash::{TrashEntry, TrashLedger};
use crate::nav::favorites::Favorites;
use crate::nav::search::{self, FuzzyMatch, SearchOptions};

/// System folders seeded under the root on a fresh boot, in display order.
pub const SYSTEM_FOLDERS: [&str; 4] = ["Desktop", "Documents", "Downloads", "Pictures"];

/// Name of the seeded folder the explorer shows the trash ledger under.
pub const TRASH_FOLDER: &str = "Trash";

/// Behaviour switches fixed for the lifetime of a [`Vfs`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VfsOptions {
    /// How sibling names are compared for uniqueness.
    pub name_matching: NameMatching,
    /// What paste does when the target already has a same-named child.
    pub paste_conflict: ConflictPolicy,
}

/// Result of [`Vfs::delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// A live node went to the trash ledger at `index`.
    Trashed { index: usize },
    /// The id was the top node of a trash entry, which is now gone.
    Purged,
}

/// The whole virtual file system.
#[derive(Debug, Clone)]
pub struct Vfs {
    store: NodeStore,
    trash: TrashLedger,
    clipboard: Clipboard,
    favorites: Favorites,
    trash_anchor: Option<NodeId>,
    options: VfsOptions,
}

impl Vfs {
    /// Boots a fresh tree: the root, the [`SYSTEM_FOLDERS`] and the
    /// [`TRASH_FOLDER`] anchor, all flagged `system`. The anchor is sealed:
    /// nodes only reach the trash through [`delete`](Self::delete).
    pub fn new(options: VfsOptions) -> Self {
        let mut store = NodeStore::new(options.name_matching);
        for name in SYSTEM_FOLDERS {
            store.insert_system_folder(name);
        }
        let trash_anchor = store.insert_system_folder(TRASH_FOLDER);
        store.seal(trash_anchor);
        tracing::debug!(nodes = store.node_count(), "seeded fresh tree");
        Self {
            store,
            trash: TrashLedger::new(),
            clipboard: Clipboard::new(options.paste_conflict),
            favorites: Favorites::new(),
            trash_anchor: Some(trash_anchor),
            options,
        }
    }

    /// Rebuilds a VFS from a persisted snapshot. The clipboard starts empty.
    ///
    /// # Errors
    ///
    /// - [`VfsError::UnsupportedSnapshotVersion`] for foreign versions.
    /// - [`VfsError::CorruptSnapshot`] if the live tree breaks an invariant,
    ///   the trash anchor is not an empty live folder, a trash entry is not a
    ///   well-linked subtree, or a trashed id is live, repeated or not below
    ///   the id counter.
    pub fn from_snapshot(state: TreeState, options: VfsOptions) -> VfsResult<Self> {
        Self::assemble(state, options)
            .inspect_err(|e| tracing::warn!(error = %e, "rejected snapshot"))
    }

    fn assemble(state: TreeState, options: VfsOptions) -> VfsResult<Self> {
        state.check_version()?;
        let TreeState {
            next_id,
            root,
            trash_anchor,
            nodes,
            trash,
            favorites,
            ..
        } = state;

        let mut store = NodeStore::from_parts(nodes, root, next_id, options.name_matching)?;
        if let Some(anchor) = trash_anchor {
            if !store
                .get(anchor)
                .is_some_and(|n| n.is_folder() && n.children().is_empty())
            {
                return Err(VfsError::CorruptSnapshot(format!(
                    "trash anchor {anchor} is not an empty live folder"
                )));
            }
            store.seal(anchor);
        }

        let mut seen = HashSet::new();
        for entry in &trash {
            entry.subtree().validate(options.name_matching)?;
            for node in entry.subtree().nodes() {
                let id = node.id();
                if store.contains(id) || !seen.insert(id) || id.as_u64() >= next_id {
                    return Err(VfsError::CorruptSnapshot(format!(
                        "trashed node {id} is live, repeated or not below the id counter"
                    )));
                }
            }
        }

        tracing::debug!(
            nodes = store.node_count(),
            trash = trash.len(),
            favorites = favorites.len(),
            "loaded snapshot"
        );
        Ok(Self {
            store,
            trash: TrashLedger::from_entries(trash),
            clipboard: Clipboard::new(options.paste_conflict),
            favorites,
            trash_anchor,
            options,
        })
    }

    /// Captures everything except the clipboard.
    pub fn snapshot(&self) -> TreeState {
        TreeState {
            version: SNAPSHOT_VERSION,
            next_id: self.store.next_id(),
            root: self.store.root(),
            trash_anchor: self.trash_anchor,
            nodes: self.store.iter().cloned().collect(),
            trash: self.trash.entries().to_vec(),
            favorites: self.favorites.clone(),
        }
    }

    pub fn options(&self) -> VfsOptions {
        self.options
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn root(&self) -> NodeId {
        self.store.root()
    }

    /// The seeded folder standing in for the recycle bin, if the tree has one.
    pub fn trash_anchor(&self) -> Option<NodeId> {
        self.trash_anchor
    }

    // --- Node CRUD ---

    /// Creates a file or folder and returns a copy of the new node.
    ///
    /// # Errors
    ///
    /// See [`NodeStore::create`].
    pub fn create(
        &mut self,
        kind: NodeKind,
        name: &str,
        parent: NodeId,
        content: Option<String>,
    ) -> VfsResult<Node> {
        let id = self.store.create(kind, name, parent, content)?;
        self.cloned(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.store.get(id)
    }

    /// Children of a folder in insertion order.
    ///
    /// # Errors
    ///
    /// See [`NodeStore::children`].
    pub fn children(&self, parent: NodeId, include_hidden: bool) -> VfsResult<Vec<&Node>> {
        self.store.children(parent, include_hidden)
    }

    /// # Errors
    ///
    /// See [`NodeStore::rename`].
    pub fn rename(&mut self, id: NodeId, new_name: &str) -> VfsResult<()> {
        self.store.rename(id, new_name)
    }

    /// # Errors
    ///
    /// See [`NodeStore::set_content`].
    pub fn set_content(&mut self, id: NodeId, content: String) -> VfsResult<()> {
        self.store.set_content(id, content)
    }

    /// # Errors
    ///
    /// See [`NodeStore::set_flags`].
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) -> VfsResult<()> {
        self.store.set_flags(id, flags)
    }

    /// # Errors
    ///
    /// See [`NodeStore::move_node`].
    pub fn move_node(&mut self, id: NodeId, new_parent: NodeId) -> VfsResult<()> {
        self.store.move_node(id, new_parent)
    }

    /// Sends a live node to the trash. Deleting an id that is the top node
    /// of a trash entry purges that entry instead.
    ///
    /// # Errors
    ///
    /// - [`VfsError::SystemProtected`] if the subtree holds a system node.
    /// - [`VfsError::NotFound`] if `id` is neither live nor a trash entry.
    pub fn delete(&mut self, id: NodeId) -> VfsResult<DeleteOutcome> {
        if self.store.contains(id) {
            let index = self.trash.soft_delete(&mut self.store, id)?;
            return Ok(DeleteOutcome::Trashed { index });
        }
        match self.trash.position_of(id) {
            Some(index) => {
                self.trash.purge(index)?;
                Ok(DeleteOutcome::Purged)
            }
            None => Err(VfsError::NotFound(id)),
        }
    }

    // --- Paths ---

    /// # Errors
    ///
    /// [`VfsError::NotFound`] if `id` is not live.
    pub fn ancestors(&self, id: NodeId) -> VfsResult<Vec<&Node>> {
        PathResolver::new(&self.store).ancestors(id)
    }

    /// # Errors
    ///
    /// [`VfsError::NotFound`] if `id` is not live.
    pub fn path(&self, id: NodeId) -> VfsResult<String> {
        PathResolver::new(&self.store).path(id)
    }

    pub fn resolve(&self, path: &str) -> Option<NodeId> {
        PathResolver::new(&self.store).resolve(path)
    }

    pub fn resolve_from(&self, base: NodeId, path: &str) -> Option<NodeId> {
        PathResolver::new(&self.store).resolve_from(base, path)
    }

    pub fn is_descendant_of(&self, candidate: NodeId, ancestor: NodeId) -> bool {
        PathResolver::new(&self.store).is_descendant_of(candidate, ancestor)
    }

    /// # Errors
    ///
    /// [`VfsError::NotFound`] if `id` is not live.
    pub fn breadcrumbs(&self, id: NodeId) -> VfsResult<Vec<(NodeId, String)>> {
        PathResolver::new(&self.store).breadcrumbs(id)
    }

    // --- Trash ---

    /// Moves a live node and its subtree into the trash ledger.
    ///
    /// # Errors
    ///
    /// See [`TrashLedger::soft_delete`].
    pub fn soft_delete(&mut self, id: NodeId) -> VfsResult<usize> {
        self.trash.soft_delete(&mut self.store, id)
    }

    /// Trash entries, oldest first.
    pub fn list_trash(&self) -> &[TrashEntry] {
        self.trash.entries()
    }

    /// Restores the entry at `index` and returns a copy of its top node.
    ///
    /// # Errors
    ///
    /// See [`TrashLedger::restore`].
    pub fn restore(&mut self, index: usize) -> VfsResult<Node> {
        let id = self.trash.restore(&mut self.store, index)?;
        self.cloned(id)
    }

    /// # Errors
    ///
    /// See [`TrashLedger::purge`].
    pub fn purge(&mut self, index: usize) -> VfsResult<TrashEntry> {
        self.trash.purge(index)
    }

    /// Purges every trash entry and returns how many were dropped.
    pub fn empty_trash(&mut self) -> usize {
        self.trash.empty_all()
    }

    // --- Clipboard ---

    /// # Errors
    ///
    /// [`VfsError::NotFound`] if `id` is not live.
    pub fn copy(&mut self, id: NodeId) -> VfsResult<()> {
        self.clipboard.copy(&self.store, id)
    }

    /// # Errors
    ///
    /// [`VfsError::NotFound`] if `id` is not live.
    pub fn cut(&mut self, id: NodeId) -> VfsResult<()> {
        self.clipboard.cut(&self.store, id)
    }

    /// Pastes the held node into `target` and returns a copy of the node
    /// that now lives there.
    ///
    /// # Errors
    ///
    /// See [`Clipboard::paste`].
    pub fn paste(&mut self, target: NodeId) -> VfsResult<Node> {
        let id = self.clipboard.paste(&mut self.store, target)?;
        self.cloned(id)
    }

    pub fn clipboard_state(&self) -> ClipboardState {
        self.clipboard.state()
    }

    pub fn clear_clipboard(&mut self) {
        self.clipboard.clear();
    }

    // --- Search & favorites ---

    /// Substring search over the live tree, skipping the trash anchor.
    pub fn search(&self, query: &str, options: SearchOptions) -> Vec<&Node> {
        search::search(&self.store, query, options, &self.search_exclusions())
    }

    /// Fuzzy name search over the live tree, skipping the trash anchor.
    pub fn fuzzy_search(&self, query: &str, options: SearchOptions) -> Vec<FuzzyMatch<'_>> {
        search::fuzzy_search(&self.store, query, options, &self.search_exclusions())
    }

    fn search_exclusions(&self) -> Vec<NodeId> {
        self.trash_anchor.into_iter().collect()
    }

    /// Returns `true` if `id` was newly added.
    pub fn favorite(&mut self, id: NodeId) -> bool {
        self.favorites.favorite(id)
    }

    /// Returns `true` if `id` was a favorite.
    pub fn unfavorite(&mut self, id: NodeId) -> bool {
        self.favorites.unfavorite(id)
    }

    pub fn is_favorite(&self, id: NodeId) -> bool {
        self.favorites.is_favorite(id)
    }

    pub fn list_favorites(&self) -> &[NodeId] {
        self.favorites.ids()
    }

    /// Each favorite with its live node; `None` marks an orphan whose node
    /// is trashed or purged.
    pub fn favorite_nodes(&self) -> Vec<(NodeId, Option<&Node>)> {
        self.favorites
            .ids()
            .iter()
            .map(|id| (*id, self.store.get(*id)))
            .collect()
    }

    // --- Command dispatch ---

    /// Applies a frontend command. Failures come back as
    /// [`Event::OperationFailed`] and leave the VFS unchanged.
    pub fn execute(&mut self, command: Command) -> Event {
        let operation = command.name();
        match self.apply(command) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(operation, error = %e, "command failed");
                Event::OperationFailed {
                    operation: operation.to_string(),
                    error: e.to_string(),
                }
            }
        }
    }

    fn apply(&mut self, command: Command) -> VfsResult<Event> {
        let event = match command {
            Command::Create {
                kind,
                name,
                parent,
                content,
            } => Event::Created(self.create(kind, &name, parent, content)?.id()),
            Command::Rename(id, name) => {
                self.rename(id, &name)?;
                Event::Changed(id)
            }
            Command::SetContent(id, content) => {
                self.set_content(id, content)?;
                Event::Changed(id)
            }
            Command::SetFlags(id, flags) => {
                self.set_flags(id, flags)?;
                Event::Changed(id)
            }
            Command::Move(id, parent) => {
                self.move_node(id, parent)?;
                Event::Changed(id)
            }
            Command::Delete(id) => match self.delete(id)? {
                DeleteOutcome::Trashed { index } => Event::Trashed { id, index },
                DeleteOutcome::Purged => Event::Purged(id),
            },
            Command::Restore(index) => Event::Restored(self.restore(index)?.id()),
            Command::Purge(index) => Event::Purged(self.purge(index)?.node().id()),
            Command::EmptyTrash => match self.empty_trash() {
                0 => Event::Unchanged,
                count => Event::TrashEmptied { count },
            },
            Command::Copy(id) => {
                self.copy(id)?;
                Event::ClipboardChanged(self.clipboard_state())
            }
            Command::Cut(id) => {
                self.cut(id)?;
                Event::ClipboardChanged(self.clipboard_state())
            }
            Command::Paste(target) => Event::Pasted(self.paste(target)?.id()),
            Command::ClearClipboard => {
                self.clear_clipboard();
                Event::ClipboardChanged(ClipboardState::Empty)
            }
            Command::Favorite(id) => {
                if self.favorite(id) {
                    Event::FavoritesChanged
                } else {
                    Event::Unchanged
                }
            }
            Command::Unfavorite(id) => {
                if self.unfavorite(id) {
                    Event::FavoritesChanged
                } else {
                    Event::Unchanged
                }
            }
        };
        Ok(event)
    }

    fn cloned(&self, id: NodeId) -> VfsResult<Node> {
        self.store.get(id).cloned().ok_or(VfsError::NotFound(id))
    }
}

impl Default for Vfs {
    fn default() -> Self {
        Self::new(VfsOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::clipboard::ClipboardMode;

    fn vfs() -> Vfs {
        Vfs::new(VfsOptions::default())
    }

    fn folder(vfs: &mut Vfs, name: &str, parent: NodeId) -> NodeId {
        vfs.create(NodeKind::Folder, name, parent, None).unwrap().id()
    }

    fn file(vfs: &mut Vfs, name: &str, parent: NodeId, content: &str) -> NodeId {
        vfs.create(NodeKind::File, name, parent, Some(content.to_string()))
            .unwrap()
            .id()
    }

    fn names(vfs: &Vfs, parent: NodeId) -> Vec<String> {
        vfs.children(parent, true)
            .unwrap()
            .iter()
            .map(|n| n.name().to_string())
            .collect()
    }

    // --- seeding ---

    #[test]
    fn fresh_tree_has_seeded_system_folders() {
        let vfs = vfs();
        let root = vfs.root();
        assert_eq!(
            names(&vfs, root),
            vec!["Desktop", "Documents", "Downloads", "Pictures", "Trash"]
        );
        for child in vfs.children(root, true).unwrap() {
            assert!(child.is_system(), "{} should be system", child.name());
        }
        let anchor = vfs.trash_anchor().unwrap();
        assert_eq!(vfs.path(anchor).unwrap(), "/Trash");
        assert_eq!(vfs.clipboard_state(), ClipboardState::Empty);
    }

    #[test]
    fn seeded_folders_cannot_be_deleted() {
        let mut vfs = vfs();
        let desktop = vfs.resolve("/Desktop").unwrap();
        assert!(matches!(
            vfs.delete(desktop),
            Err(VfsError::SystemProtected(_))
        ));
        let root = vfs.root();
        assert!(matches!(vfs.delete(root), Err(VfsError::SystemProtected(_))));
    }

    // --- scenarios ---

    #[test]
    fn cut_paste_moves_file_to_root() {
        let mut vfs = vfs();
        let root = vfs.root();
        let docs = folder(&mut vfs, "Docs", root);
        let a = file(&mut vfs, "a.txt", docs, "hi");

        vfs.cut(a).unwrap();
        let pasted = vfs.paste(root).unwrap();

        assert_eq!(pasted.id(), a);
        assert_eq!(pasted.parent(), Some(root));
        assert!(names(&vfs, docs).is_empty());
        assert_eq!(vfs.clipboard_state(), ClipboardState::Empty);
    }

    #[test]
    fn delete_folder_then_restore_recreates_subtree() {
        let mut vfs = vfs();
        let root = vfs.root();
        let docs = folder(&mut vfs, "Docs", root);
        let a = file(&mut vfs, "a.txt", docs, "hi");

        assert_eq!(vfs.delete(docs).unwrap(), DeleteOutcome::Trashed { index: 0 });

        let trash = vfs.list_trash();
        assert_eq!(trash.len(), 1);
        assert!(trash[0].subtree().contains(docs));
        assert!(trash[0].subtree().contains(a));
        assert!(vfs.get(docs).is_none());

        let restored = vfs.restore(0).unwrap();

        assert_eq!(restored.id(), docs);
        assert_eq!(restored.parent(), Some(root));
        let file = vfs.get(a).unwrap();
        assert_eq!(file.name(), "a.txt");
        assert_eq!(file.content(), Some("hi"));
        assert_eq!(file.parent(), Some(docs));
        assert!(vfs.list_trash().is_empty());
    }

    #[test]
    fn duplicate_folder_name_conflicts() {
        let mut vfs = vfs();
        let root = vfs.root();
        folder(&mut vfs, "Docs", root);
        let err = vfs
            .create(NodeKind::Folder, "Docs", root, None)
            .unwrap_err();
        assert!(matches!(err, VfsError::NameConflict { .. }));
    }

    #[test]
    fn renaming_system_folder_is_protected() {
        let mut vfs = vfs();
        let desktop = vfs.resolve("/Desktop").unwrap();
        assert!(matches!(
            vfs.rename(desktop, "Workspace"),
            Err(VfsError::SystemProtected(_))
        ));
    }

    #[test]
    fn move_into_descendant_leaves_tree_unchanged() {
        let mut vfs = vfs();
        let root = vfs.root();
        let a = folder(&mut vfs, "a", root);
        let b = folder(&mut vfs, "b", a);
        let before = vfs.snapshot();

        assert!(matches!(
            vfs.move_node(a, b),
            Err(VfsError::WouldCycle { .. })
        ));
        assert_eq!(vfs.snapshot(), before);
    }

    #[test]
    fn copy_keeps_clipboard_holding() {
        let mut vfs = vfs();
        let root = vfs.root();
        let docs = vfs.resolve("/Documents").unwrap();
        let a = file(&mut vfs, "a.txt", root, "hi");

        vfs.copy(a).unwrap();
        let copy = vfs.paste(docs).unwrap();

        assert_ne!(copy.id(), a);
        assert_eq!(copy.content(), Some("hi"));
        assert_eq!(
            vfs.clipboard_state(),
            ClipboardState::Holding {
                source: a,
                mode: ClipboardMode::Copy
            }
        );
    }

    #[test]
    fn copying_system_folder_yields_ordinary_folder() {
        let mut vfs = vfs();
        let root = vfs.root();
        let pictures = vfs.resolve("/Pictures").unwrap();
        let backup = folder(&mut vfs, "Backup", root);
        vfs.copy(pictures).unwrap();
        let copy = vfs.paste(backup).unwrap();
        assert!(!copy.is_system());
        assert!(matches!(vfs.delete(copy.id()), Ok(DeleteOutcome::Trashed { .. })));
    }

    #[test]
    fn paste_suffix_policy() {
        let mut vfs = Vfs::new(VfsOptions {
            paste_conflict: ConflictPolicy::Suffix,
            ..VfsOptions::default()
        });
        let root = vfs.root();
        let a = file(&mut vfs, "a.txt", root, "");
        vfs.copy(a).unwrap();
        let copy = vfs.paste(root).unwrap();
        assert_eq!(copy.name(), "a (1).txt");
    }

    #[test]
    fn case_insensitive_names_option() {
        let mut vfs = Vfs::new(VfsOptions {
            name_matching: NameMatching::CaseInsensitive,
            ..VfsOptions::default()
        });
        let root = vfs.root();
        assert!(matches!(
            vfs.create(NodeKind::Folder, "documents", root, None),
            Err(VfsError::NameConflict { .. })
        ));
    }

    // --- delete / trash ---

    #[test]
    fn deleting_trash_entry_purges_it() {
        let mut vfs = vfs();
        let root = vfs.root();
        let a = file(&mut vfs, "a.txt", root, "");

        vfs.delete(a).unwrap();
        assert_eq!(vfs.delete(a).unwrap(), DeleteOutcome::Purged);

        assert!(vfs.list_trash().is_empty());
        assert!(matches!(vfs.delete(a), Err(VfsError::NotFound(_))));
    }

    #[test]
    fn deleting_nested_trashed_node_is_not_found() {
        let mut vfs = vfs();
        let root = vfs.root();
        let docs = folder(&mut vfs, "Docs", root);
        let a = file(&mut vfs, "a.txt", docs, "");
        vfs.delete(docs).unwrap();

        assert!(matches!(vfs.delete(a), Err(VfsError::NotFound(_))));
        assert_eq!(vfs.list_trash().len(), 1);
    }

    #[test]
    fn restore_conflict_keeps_entry() {
        let mut vfs = vfs();
        let root = vfs.root();
        let a = file(&mut vfs, "a.txt", root, "old");
        vfs.delete(a).unwrap();
        file(&mut vfs, "a.txt", root, "new");

        assert!(matches!(
            vfs.restore(0),
            Err(VfsError::NameConflict { .. })
        ));
        assert_eq!(vfs.list_trash().len(), 1);
    }

    #[test]
    fn empty_trash_counts_entries() {
        let mut vfs = vfs();
        let root = vfs.root();
        for name in ["a", "b", "c"] {
            let id = file(&mut vfs, name, root, "");
            vfs.soft_delete(id).unwrap();
        }
        assert_eq!(vfs.empty_trash(), 3);
        assert_eq!(vfs.empty_trash(), 0);
    }

    #[test]
    fn trash_anchor_accepts_no_live_nodes() {
        let mut vfs = vfs();
        let root = vfs.root();
        let anchor = vfs.trash_anchor().unwrap();
        let report = file(&mut vfs, "report.txt", root, "");
        let before = vfs.snapshot();

        assert!(matches!(
            vfs.create(NodeKind::File, "notes.txt", anchor, None),
            Err(VfsError::SystemProtected(id)) if id == anchor
        ));
        assert!(matches!(
            vfs.move_node(report, anchor),
            Err(VfsError::SystemProtected(_))
        ));
        vfs.copy(report).unwrap();
        assert!(matches!(vfs.paste(anchor), Err(VfsError::SystemProtected(_))));
        vfs.cut(report).unwrap();
        assert!(matches!(vfs.paste(anchor), Err(VfsError::SystemProtected(_))));

        assert_eq!(vfs.snapshot(), before);
        assert_eq!(vfs.path(report).unwrap(), "/report.txt");
    }

    #[test]
    fn trash_anchor_stays_sealed_after_reload() {
        let vfs = vfs();
        let anchor = vfs.trash_anchor().unwrap();
        let mut reloaded = Vfs::from_snapshot(vfs.snapshot(), VfsOptions::default()).unwrap();
        assert!(matches!(
            reloaded.create(NodeKind::Folder, "x", anchor, None),
            Err(VfsError::SystemProtected(_))
        ));
    }

    #[test]
    fn purged_ids_are_never_reissued() {
        let mut vfs = vfs();
        let root = vfs.root();
        let a = file(&mut vfs, "a", root, "");
        vfs.delete(a).unwrap();
        vfs.purge(0).unwrap();
        let b = file(&mut vfs, "a", root, "");
        assert!(b > a);
    }

    // --- search & favorites ---

    #[test]
    fn search_skips_trashed_nodes() {
        let mut vfs = vfs();
        let root = vfs.root();
        let gone = file(&mut vfs, "old-draft.txt", root, "");
        let kept = file(&mut vfs, "old-plan.txt", root, "");
        vfs.delete(gone).unwrap();

        let found: Vec<NodeId> = vfs
            .search("old", SearchOptions::default())
            .iter()
            .map(|n| n.id())
            .collect();
        assert_eq!(found, vec![kept]);
        assert_eq!(vfs.fuzzy_search("oldpl", SearchOptions::default()).len(), 1);
    }

    #[test]
    fn favorites_survive_delete_as_orphans() {
        let mut vfs = vfs();
        let root = vfs.root();
        let a = file(&mut vfs, "a.txt", root, "");
        assert!(vfs.favorite(a));
        assert!(!vfs.favorite(a));

        vfs.delete(a).unwrap();
        assert!(vfs.is_favorite(a));
        let favs = vfs.favorite_nodes();
        assert_eq!(favs.len(), 1);
        assert!(favs[0].1.is_none());

        vfs.restore(0).unwrap();
        assert!(vfs.favorite_nodes()[0].1.is_some());
        assert!(vfs.unfavorite(a));
        assert!(vfs.list_favorites().is_empty());
    }

    // --- snapshot ---

    #[test]
    fn snapshot_round_trip_preserves_everything_but_clipboard() {
        let mut vfs = vfs();
        let root = vfs.root();
        let docs = folder(&mut vfs, "Docs", root);
        let a = file(&mut vfs, "a.txt", docs, "hi");
        let b = file(&mut vfs, "b.txt", root, "bye");
        vfs.delete(b).unwrap();
        vfs.favorite(a);
        vfs.copy(a).unwrap();

        let state = vfs.snapshot();
        let json = state.to_json().unwrap();
        let mut reloaded =
            Vfs::from_snapshot(TreeState::from_json(&json).unwrap(), VfsOptions::default())
                .unwrap();

        assert_eq!(reloaded.snapshot(), state);
        assert_eq!(reloaded.clipboard_state(), ClipboardState::Empty);
        assert_eq!(reloaded.path(a).unwrap(), "/Docs/a.txt");
        assert!(reloaded.is_favorite(a));
        assert_eq!(reloaded.restore(0).unwrap().id(), b);

        let fresh = file(&mut reloaded, "c.txt", root, "");
        assert!(fresh > b);
    }

    #[test]
    fn from_snapshot_rejects_repeated_trash_ids() {
        let mut vfs = vfs();
        let root = vfs.root();
        let a = file(&mut vfs, "a", root, "");
        vfs.delete(a).unwrap();
        let mut state = vfs.snapshot();
        state.trash.push(state.trash[0].clone());

        assert!(matches!(
            Vfs::from_snapshot(state, VfsOptions::default()),
            Err(VfsError::CorruptSnapshot(_))
        ));
    }

    #[test]
    fn from_snapshot_rejects_trashed_id_that_is_live() {
        let mut vfs = vfs();
        let root = vfs.root();
        let a = file(&mut vfs, "a", root, "");
        let with_a = vfs.snapshot();
        vfs.delete(a).unwrap();
        let mut state = vfs.snapshot();
        state.nodes = with_a.nodes;

        assert!(matches!(
            Vfs::from_snapshot(state, VfsOptions::default()),
            Err(VfsError::CorruptSnapshot(_))
        ));
    }

    #[test]
    fn from_snapshot_rejects_dangling_trash_anchor() {
        let mut state = vfs().snapshot();
        state.trash_anchor = Some(NodeId::from_raw(999));
        assert!(matches!(
            Vfs::from_snapshot(state, VfsOptions::default()),
            Err(VfsError::CorruptSnapshot(_))
        ));
    }

    #[test]
    fn from_snapshot_rejects_trash_child_pointing_at_live_node() {
        let mut vfs = vfs();
        let root = vfs.root();
        let docs = folder(&mut vfs, "Docs", root);
        let live = file(&mut vfs, "live.txt", root, "");
        vfs.delete(docs).unwrap();

        let mut value = serde_json::to_value(vfs.snapshot()).unwrap();
        value["trash"][0]["subtree"]["nodes"][0]["children"] = serde_json::json!([live]);
        let state: TreeState = serde_json::from_value(value).unwrap();

        assert!(matches!(
            Vfs::from_snapshot(state, VfsOptions::default()),
            Err(VfsError::CorruptSnapshot(_))
        ));
    }

    #[test]
    fn from_snapshot_rejects_populated_trash_anchor() {
        let mut vfs = vfs();
        let docs = vfs.resolve("/Documents").unwrap();
        let a = file(&mut vfs, "a.txt", docs, "");
        let anchor = vfs.trash_anchor().unwrap();

        let mut value = serde_json::to_value(vfs.snapshot()).unwrap();
        for node in value["nodes"].as_array_mut().unwrap() {
            let id = node["id"].as_u64().unwrap();
            if id == docs.as_u64() {
                node["children"] = serde_json::json!([]);
            } else if id == anchor.as_u64() {
                node["children"] = serde_json::json!([a]);
            } else if id == a.as_u64() {
                node["parent"] = serde_json::json!(anchor);
            }
        }
        let state: TreeState = serde_json::from_value(value).unwrap();

        assert!(matches!(
            Vfs::from_snapshot(state, VfsOptions::default()),
            Err(VfsError::CorruptSnapshot(_))
        ));
    }

    #[test]
    fn from_snapshot_rejects_foreign_version() {
        let mut state = vfs().snapshot();
        state.version = 0;
        assert!(matches!(
            Vfs::from_snapshot(state, VfsOptions::default()),
            Err(VfsError::UnsupportedSnapshotVersion { found: 0, .. })
        ));
    }

    // --- execute ---

    #[test]
    fn execute_create_and_delete_twice() {
        let mut vfs = vfs();
        let root = vfs.root();

        let Event::Created(id) = vfs.execute(Command::Create {
            kind: NodeKind::File,
            name: "memo.txt".to_string(),
            parent: root,
            content: Some("x".to_string()),
        }) else {
            panic!("expected Created");
        };

        assert_eq!(
            vfs.execute(Command::Delete(id)),
            Event::Trashed { id, index: 0 }
        );
        assert_eq!(vfs.execute(Command::Delete(id)), Event::Purged(id));
    }

    #[test]
    fn execute_failure_reports_and_leaves_tree() {
        let mut vfs = vfs();
        let root = vfs.root();
        let before = vfs.snapshot();

        let event = vfs.execute(Command::Create {
            kind: NodeKind::Folder,
            name: "Desktop".to_string(),
            parent: root,
            content: None,
        });

        match event {
            Event::OperationFailed { operation, error } => {
                assert_eq!(operation, "create");
                assert!(error.contains("Desktop"));
            }
            other => panic!("expected OperationFailed, got {other:?}"),
        }
        assert_eq!(vfs.snapshot(), before);
    }

    #[test]
    fn execute_clipboard_round() {
        let mut vfs = vfs();
        let root = vfs.root();
        let docs = vfs.resolve("/Documents").unwrap();
        let a = file(&mut vfs, "a.txt", root, "");

        assert_eq!(
            vfs.execute(Command::Cut(a)),
            Event::ClipboardChanged(ClipboardState::Holding {
                source: a,
                mode: ClipboardMode::Cut
            })
        );
        assert_eq!(vfs.execute(Command::Paste(docs)), Event::Pasted(a));
        assert!(matches!(
            vfs.execute(Command::Paste(docs)),
            Event::OperationFailed { .. }
        ));
    }

    #[test]
    fn execute_favorites_and_empty_trash() {
        let mut vfs = vfs();
        let root = vfs.root();
        assert_eq!(vfs.execute(Command::Favorite(root)), Event::FavoritesChanged);
        assert_eq!(vfs.execute(Command::Favorite(root)), Event::Unchanged);
        assert_eq!(vfs.execute(Command::Unfavorite(root)), Event::FavoritesChanged);
        assert_eq!(vfs.execute(Command::EmptyTrash), Event::Unchanged);
    }

    // --- properties ---

    mod props {
        use super::*;
        use proptest::prelude::*;
        use proptest::test_runner::TestCaseError;

        const NAMES: [&str; 4] = ["a", "b", "c.txt", "A"];

        #[derive(Debug, Clone)]
        enum Op {
            Create { folder: bool, parent: usize, name: usize },
            Rename { node: usize, name: usize },
            Move { node: usize, target: usize },
            Delete { node: usize },
            Restore { index: usize },
            Paste { node: usize, target: usize, cut: bool },
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                3 => (any::<bool>(), any::<usize>(), 0..NAMES.len())
                    .prop_map(|(folder, parent, name)| Op::Create { folder, parent, name }),
                1 => (any::<usize>(), 0..NAMES.len())
                    .prop_map(|(node, name)| Op::Rename { node, name }),
                2 => (any::<usize>(), any::<usize>())
                    .prop_map(|(node, target)| Op::Move { node, target }),
                1 => any::<usize>().prop_map(|node| Op::Delete { node }),
                1 => any::<usize>().prop_map(|index| Op::Restore { index }),
                2 => (any::<usize>(), any::<usize>(), any::<bool>())
                    .prop_map(|(node, target, cut)| Op::Paste { node, target, cut }),
            ]
        }

        fn pick(vfs: &Vfs, index: usize) -> NodeId {
            let ids: Vec<NodeId> = vfs.store().iter().map(Node::id).collect();
            ids[index % ids.len()]
        }

        fn apply(vfs: &mut Vfs, op: Op) -> Result<(), TestCaseError> {
            match op {
                Op::Create { folder, parent, name } => {
                    let kind = if folder { NodeKind::Folder } else { NodeKind::File };
                    let parent = pick(vfs, parent);
                    let _ = vfs.create(kind, NAMES[name], parent, None);
                }
                Op::Rename { node, name } => {
                    let node = pick(vfs, node);
                    let _ = vfs.rename(node, NAMES[name]);
                }
                Op::Move { node, target } => {
                    let node = pick(vfs, node);
                    let target = pick(vfs, target);
                    if node == target || vfs.is_descendant_of(target, node) {
                        let before = vfs.snapshot();
                        let result = vfs.move_node(node, target);
                        prop_assert!(
                            matches!(result, Err(VfsError::WouldCycle { .. })),
                            "moving {} into {} gave {:?}",
                            node,
                            target,
                            result
                        );
                        prop_assert_eq!(vfs.snapshot(), before);
                    } else {
                        let _ = vfs.move_node(node, target);
                    }
                }
                Op::Delete { node } => {
                    let node = pick(vfs, node);
                    let _ = vfs.delete(node);
                }
                Op::Restore { index } => {
                    let len = vfs.list_trash().len();
                    if len > 0 {
                        let _ = vfs.restore(index % len);
                    }
                }
                Op::Paste { node, target, cut } => {
                    let node = pick(vfs, node);
                    let target = pick(vfs, target);
                    let held = if cut { vfs.cut(node) } else { vfs.copy(node) };
                    prop_assert!(held.is_ok());
                    let _ = vfs.paste(target);
                }
            }
            Ok(())
        }

        fn check_invariants(vfs: &Vfs) -> Result<(), TestCaseError> {
            for node in vfs.store().iter().filter(|n| n.is_folder()) {
                let mut seen = HashSet::new();
                for child in vfs.children(node.id(), true).unwrap() {
                    prop_assert!(
                        seen.insert(child.name().to_string()),
                        "duplicate name {:?} under {}",
                        child.name(),
                        node.id()
                    );
                }
            }
            let rebuilt = Vfs::from_snapshot(vfs.snapshot(), vfs.options());
            prop_assert!(rebuilt.is_ok(), "snapshot rejected: {:?}", rebuilt.err());
            Ok(())
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn random_sequences_keep_tree_valid(ops in prop::collection::vec(op_strategy(), 1..40)) {
                let mut vfs = Vfs::default();
                for op in ops {
                    apply(&mut vfs, op)?;
                    check_invariants(&vfs)?;
                }
            }

            #[test]
            fn soft_delete_then_restore_round_trips(depth in 1usize..5, content in "[a-z]{0,12}") {
                let mut vfs = Vfs::default();
                let mut parent = vfs.root();
                for level in 0..depth {
                    parent = folder(&mut vfs, &format!("level{level}"), parent);
                }
                let leaf = file(&mut vfs, "leaf.txt", parent, &content);
                let top = vfs.resolve("/level0").unwrap();

                vfs.soft_delete(top).unwrap();
                prop_assert!(vfs.get(leaf).is_none());
                vfs.restore(0).unwrap();

                let node = vfs.get(leaf).unwrap();
                prop_assert_eq!(node.content(), Some(content.as_str()));
                prop_assert_eq!(node.parent(), Some(parent));
                prop_assert_eq!(vfs.get(top).unwrap().parent(), Some(vfs.root()));
            }
        }
    }
}
