//! Node store: the arena that owns every node and the folder adjacency.
//!
//! Nodes live in a flat table keyed by [`NodeId`]. Each node stores one parent
//! id and each folder an ordered list of child ids; there are no other
//! references between nodes. Every mutation validates first and writes
//! second, so a returned error means the store is unchanged.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{VfsError, VfsResult};
use crate::fs::node::{normalize_name, Node, NodeFlags, NodeId, NodeKind};
use crate::fs::path::PathResolver;

/// Display name of the root folder. It never appears in paths.
pub const ROOT_NAME: &str = "root";

/// How sibling names are compared for uniqueness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatching {
    #[default]
    CaseSensitive,
    CaseInsensitive,
}

impl NameMatching {
    /// Returns `true` if the two names would collide inside one folder.
    pub fn same(self, a: &str, b: &str) -> bool {
        match self {
            Self::CaseSensitive => a == b,
            Self::CaseInsensitive => a.to_lowercase() == b.to_lowercase(),
        }
    }
}

/// A node and all of its descendants, detached from the live tree.
///
/// Nodes are kept in pre-order: the first node is the top of the subtree and
/// still carries the id of the folder it was removed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedSubtree {
    nodes: Vec<Node>,
}

impl DeletedSubtree {
    /// The top-level node that was deleted. Subtrees are never empty.
    pub fn top(&self) -> &Node {
        &self.nodes[0]
    }

    /// The folder the subtree was detached from.
    pub fn original_parent(&self) -> Option<NodeId> {
        self.top().parent()
    }

    /// All nodes of the subtree in pre-order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Checks the subtree's own links the way [`NodeStore::from_parts`]
    /// checks the live tree, with the top node standing in for the root.
    ///
    /// # Errors
    ///
    /// [`VfsError::CorruptSnapshot`] if the subtree is empty, repeats an id,
    /// links outside itself, has a cycle or holds colliding sibling names.
    pub fn validate(&self, matching: NameMatching) -> VfsResult<()> {
        let top = self
            .nodes
            .first()
            .ok_or_else(|| corrupt("empty subtree"))?
            .id();
        let mut map = BTreeMap::new();
        for node in &self.nodes {
            if map.insert(node.id(), node.clone()).is_some() {
                return Err(corrupt(format!("subtree repeats node {}", node.id())));
            }
        }
        check_links(&map, top, matching)
    }
}

/// Owner of every live node.
#[derive(Debug, Clone)]
pub struct NodeStore {
    nodes: BTreeMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
    matching: NameMatching,
    /// Folder that accepts no new children.
    sealed: Option<NodeId>,
}

impl NodeStore {
    /// Creates a store holding only the system-flagged root folder.
    pub fn new(matching: NameMatching) -> Self {
        let root = NodeId::from_raw(0);
        let node = Node::new_folder(
            root,
            ROOT_NAME.to_string(),
            None,
            NodeFlags::system(),
            Utc::now(),
        );
        let mut nodes = BTreeMap::new();
        nodes.insert(root, node);
        Self {
            nodes,
            root,
            next_id: 1,
            matching,
            sealed: None,
        }
    }

    /// Rebuilds a store from persisted nodes, checking every tree invariant.
    ///
    /// # Errors
    ///
    /// [`VfsError::CorruptSnapshot`] if ids repeat, references dangle, the
    /// tree has a cycle or a second root, sibling names collide under
    /// `matching`, or an id is not below `next_id`.
    pub fn from_parts(
        nodes: Vec<Node>,
        root: NodeId,
        next_id: u64,
        matching: NameMatching,
    ) -> VfsResult<Self> {
        let mut map = BTreeMap::new();
        for node in nodes {
            let id = node.id();
            if map.insert(id, node).is_some() {
                return Err(corrupt(format!("duplicate node id {id}")));
            }
        }

        let root_node = map
            .get(&root)
            .ok_or_else(|| corrupt(format!("root {root} is missing")))?;
        if root_node.parent().is_some() || !root_node.is_folder() {
            return Err(corrupt("root must be a folder without a parent"));
        }

        if let Some(node) = map.values().find(|n| n.id().as_u64() >= next_id) {
            return Err(corrupt(format!(
                "node {} is not below the id counter",
                node.id()
            )));
        }
        check_links(&map, root, matching)?;

        Ok(Self {
            nodes: map,
            root,
            next_id,
            matching,
            sealed: None,
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn matching(&self) -> NameMatching {
        self.matching
    }

    /// Closes `folder` to new children: create, move, copy and reattach all
    /// refuse it as a target.
    pub(crate) fn seal(&mut self, folder: NodeId) {
        self.sealed = Some(folder);
    }

    pub fn sealed(&self) -> Option<NodeId> {
        self.sealed
    }

    /// The id the next created node will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All live nodes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Children of `parent` in insertion order.
    ///
    /// # Errors
    ///
    /// - [`VfsError::NotFound`] if `parent` is not live.
    /// - [`VfsError::NotAFolder`] if `parent` is a file.
    pub fn children(&self, parent: NodeId, include_hidden: bool) -> VfsResult<Vec<&Node>> {
        let folder = self.nodes.get(&parent).ok_or(VfsError::NotFound(parent))?;
        if !folder.is_folder() {
            return Err(VfsError::NotAFolder(parent));
        }
        Ok(folder
            .children()
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .filter(|n| include_hidden || !n.is_hidden())
            .collect())
    }

    /// Looks up a direct child of `parent` by name under the store's
    /// [`NameMatching`] rule.
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.find_child_except(parent, name, None)
    }

    pub(crate) fn find_child_except(
        &self,
        parent: NodeId,
        name: &str,
        except: Option<NodeId>,
    ) -> Option<NodeId> {
        let folder = self.nodes.get(&parent)?;
        folder.children().iter().copied().find(|id| {
            Some(*id) != except
                && self
                    .nodes
                    .get(id)
                    .is_some_and(|n| self.matching.same(n.name(), name))
        })
    }

    /// Node ids of `id` and all its descendants in pre-order.
    ///
    /// Empty if `id` is not live.
    pub fn subtree_ids(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.nodes.contains_key(&id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.children().iter().rev().copied());
            }
        }
        out
    }

    /// Creates a file or folder under `parent`.
    ///
    /// Files start with `content` (empty when `None`); `content` is ignored
    /// for folders.
    ///
    /// # Errors
    ///
    /// - [`VfsError::ParentNotFound`] / [`VfsError::ParentIsFile`] if `parent`
    ///   is not a live folder.
    /// - [`VfsError::InvalidName`] if `name` is not a valid node name.
    /// - [`VfsError::NameConflict`] if a sibling already uses `name`.
    /// - [`VfsError::SystemProtected`] if `parent` is the sealed folder.
    /// - [`VfsError::IdsExhausted`] if no id is left to hand out.
    pub fn create(
        &mut self,
        kind: NodeKind,
        name: &str,
        parent: NodeId,
        content: Option<String>,
    ) -> VfsResult<NodeId> {
        self.check_parent(parent)?;
        let name = normalize_name(name)?;
        self.check_name_free(parent, &name, None)?;
        self.reserve_ids(1)?;

        let id = self.allocate_id();
        let now = Utc::now();
        let node = match kind {
            NodeKind::Folder => Node::new_folder(id, name, Some(parent), NodeFlags::default(), now),
            NodeKind::File => Node::new_file(
                id,
                name,
                parent,
                content.unwrap_or_default(),
                NodeFlags::default(),
                now,
            ),
        };
        tracing::debug!(%id, %parent, name = node.name(), "created node");
        self.nodes.insert(id, node);
        self.attach(parent, id);
        Ok(id)
    }

    /// Inserts a system folder directly under the root without validation.
    /// Used only while seeding a fresh tree.
    pub(crate) fn insert_system_folder(&mut self, name: &str) -> NodeId {
        let id = self.allocate_id();
        let node = Node::new_folder(
            id,
            name.to_string(),
            Some(self.root),
            NodeFlags::system(),
            Utc::now(),
        );
        self.nodes.insert(id, node);
        self.attach(self.root, id);
        id
    }

    /// Renames a node in place. Renaming to the current name is a no-op.
    ///
    /// # Errors
    ///
    /// - [`VfsError::NotFound`] if `id` is not live.
    /// - [`VfsError::SystemProtected`] if the node is a system node.
    /// - [`VfsError::InvalidName`] if `new_name` is not a valid node name.
    /// - [`VfsError::NameConflict`] if a sibling already uses `new_name`.
    pub fn rename(&mut self, id: NodeId, new_name: &str) -> VfsResult<()> {
        let node = self.nodes.get(&id).ok_or(VfsError::NotFound(id))?;
        if node.is_system() {
            return Err(VfsError::SystemProtected(id));
        }
        let name = normalize_name(new_name)?;
        if node.name() == name {
            return Ok(());
        }
        if let Some(parent) = node.parent() {
            self.check_name_free(parent, &name, Some(id))?;
        }

        if let Some(node) = self.nodes.get_mut(&id) {
            tracing::debug!(%id, from = node.name(), to = %name, "renamed node");
            node.set_name(name, Utc::now());
        }
        Ok(())
    }

    /// Replaces a file's content and bumps its modification time.
    ///
    /// # Errors
    ///
    /// - [`VfsError::NotFound`] if `id` is not live.
    /// - [`VfsError::IsFolder`] if `id` is a folder.
    /// - [`VfsError::ReadOnly`] if the file is read-only.
    pub fn set_content(&mut self, id: NodeId, content: String) -> VfsResult<()> {
        let node = self.nodes.get_mut(&id).ok_or(VfsError::NotFound(id))?;
        if node.is_folder() {
            return Err(VfsError::IsFolder(id));
        }
        if node.is_read_only() {
            return Err(VfsError::ReadOnly(id));
        }
        node.set_content(content, Utc::now());
        Ok(())
    }

    /// Updates the `read_only` and `hidden` flags. The `system` flag is
    /// fixed when a node is seeded and is never changed here.
    ///
    /// # Errors
    ///
    /// [`VfsError::NotFound`] if `id` is not live.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) -> VfsResult<()> {
        let node = self.nodes.get_mut(&id).ok_or(VfsError::NotFound(id))?;
        let flags = NodeFlags {
            system: node.is_system(),
            ..flags
        };
        node.set_flags(flags);
        Ok(())
    }

    /// Reparents `id` under `new_parent`, keeping its name.
    ///
    /// Moving a node into the folder it already lives in is a no-op.
    ///
    /// # Errors
    ///
    /// - [`VfsError::NotFound`] if `id` is not live.
    /// - [`VfsError::ParentNotFound`] if `new_parent` is not live.
    /// - [`VfsError::WouldCycle`] if `new_parent` is `id` or inside its subtree.
    /// - [`VfsError::ParentIsFile`] if `new_parent` is a file.
    /// - [`VfsError::SystemProtected`] if `id` is a system node or
    ///   `new_parent` is the sealed folder.
    /// - [`VfsError::NameConflict`] if `new_parent` already has a child with
    ///   the same name.
    pub fn move_node(&mut self, id: NodeId, new_parent: NodeId) -> VfsResult<()> {
        self.relocate(id, new_parent, None)
    }

    /// Like [`move_node`](Self::move_node) but gives the node a new name at
    /// its destination in the same step.
    pub fn move_renamed(&mut self, id: NodeId, new_parent: NodeId, name: &str) -> VfsResult<()> {
        self.relocate(id, new_parent, Some(name))
    }

    fn relocate(&mut self, id: NodeId, new_parent: NodeId, rename: Option<&str>) -> VfsResult<()> {
        let node = self.nodes.get(&id).ok_or(VfsError::NotFound(id))?;
        let target = self
            .nodes
            .get(&new_parent)
            .ok_or(VfsError::ParentNotFound(new_parent))?;
        if new_parent == id || PathResolver::new(self).is_descendant_of(new_parent, id) {
            return Err(VfsError::WouldCycle {
                node: id,
                target: new_parent,
            });
        }
        if !target.is_folder() {
            return Err(VfsError::ParentIsFile(new_parent));
        }
        self.check_unsealed(new_parent)?;
        if node.is_system() {
            return Err(VfsError::SystemProtected(id));
        }

        let name = match rename {
            Some(raw) => normalize_name(raw)?,
            None => node.name().to_string(),
        };
        let old_parent = node.parent();
        let renamed = name != node.name();
        if old_parent == Some(new_parent) && !renamed {
            return Ok(());
        }
        self.check_name_free(new_parent, &name, Some(id))?;

        if old_parent != Some(new_parent) {
            if let Some(old) = old_parent {
                if let Some(folder) = self.nodes.get_mut(&old) {
                    folder.remove_child(id);
                }
            }
            self.attach(new_parent, id);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.set_parent(new_parent);
            if renamed {
                node.set_name(name, Utc::now());
            }
        }
        tracing::debug!(%id, %new_parent, "moved node");
        Ok(())
    }

    /// Detaches `id` and its whole subtree from the tree.
    ///
    /// # Errors
    ///
    /// - [`VfsError::NotFound`] if `id` is not live.
    /// - [`VfsError::SystemProtected`] if any node in the subtree (the root
    ///   included) is a system node; the error names that node.
    pub fn delete(&mut self, id: NodeId) -> VfsResult<DeletedSubtree> {
        let node = self.nodes.get(&id).ok_or(VfsError::NotFound(id))?;
        let parent = node.parent();
        let ids = self.subtree_ids(id);
        if let Some(protected) = ids
            .iter()
            .find(|i| self.nodes.get(*i).is_some_and(Node::is_system))
        {
            return Err(VfsError::SystemProtected(*protected));
        }

        if let Some(parent) = parent {
            if let Some(folder) = self.nodes.get_mut(&parent) {
                folder.remove_child(id);
            }
        }
        let nodes: Vec<Node> = ids.iter().filter_map(|i| self.nodes.remove(i)).collect();
        tracing::debug!(%id, count = nodes.len(), "detached subtree");
        Ok(DeletedSubtree { nodes })
    }

    /// Puts a previously deleted subtree back under `parent`, keeping every id.
    ///
    /// # Errors
    ///
    /// - [`VfsError::ParentNotFound`] / [`VfsError::ParentIsFile`] if `parent`
    ///   is not a live folder.
    /// - [`VfsError::NameConflict`] if `parent` now has a child with the same
    ///   name as the subtree's top node.
    /// - [`VfsError::SystemProtected`] if `parent` is the sealed folder.
    /// - [`VfsError::CorruptSnapshot`] if the subtree fails
    ///   [`DeletedSubtree::validate`] or one of its ids is live again.
    pub fn reattach(&mut self, subtree: DeletedSubtree, parent: NodeId) -> VfsResult<NodeId> {
        subtree.validate(self.matching)?;
        if let Some(live) = subtree.nodes.iter().find(|n| self.nodes.contains_key(&n.id())) {
            return Err(corrupt(format!("node {} is already live", live.id())));
        }
        self.check_parent(parent)?;
        let top = subtree.top().id();
        self.check_name_free(parent, subtree.top().name(), None)?;

        for mut node in subtree.nodes {
            if node.id() == top {
                node.set_parent(parent);
            }
            self.next_id = self.next_id.max(node.id().as_u64().saturating_add(1));
            self.nodes.insert(node.id(), node);
        }
        self.attach(parent, top);
        tracing::debug!(id = %top, %parent, "reattached subtree");
        Ok(top)
    }

    /// Deep-copies the subtree at `source` under `target` as `name`.
    ///
    /// Every copied node gets a fresh id and fresh timestamps. Copies never
    /// inherit the `system` flag.
    ///
    /// # Errors
    ///
    /// - [`VfsError::NotFound`] if `source` is not live.
    /// - [`VfsError::ParentNotFound`] if `target` is not live.
    /// - [`VfsError::WouldCycle`] if `target` is `source` or inside it.
    /// - [`VfsError::ParentIsFile`] if `target` is a file.
    /// - [`VfsError::SystemProtected`] if `target` is the sealed folder.
    /// - [`VfsError::InvalidName`] / [`VfsError::NameConflict`] for `name`.
    /// - [`VfsError::IdsExhausted`] if the copy needs more ids than are left.
    pub fn duplicate(&mut self, source: NodeId, target: NodeId, name: &str) -> VfsResult<NodeId> {
        if !self.nodes.contains_key(&source) {
            return Err(VfsError::NotFound(source));
        }
        let target_node = self
            .nodes
            .get(&target)
            .ok_or(VfsError::ParentNotFound(target))?;
        if target == source || PathResolver::new(self).is_descendant_of(target, source) {
            return Err(VfsError::WouldCycle {
                node: source,
                target,
            });
        }
        if !target_node.is_folder() {
            return Err(VfsError::ParentIsFile(target));
        }
        self.check_unsealed(target)?;
        let name = normalize_name(name)?;
        self.check_name_free(target, &name, None)?;

        let ids = self.subtree_ids(source);
        self.reserve_ids(ids.len() as u64)?;
        let mut mapping = HashMap::with_capacity(ids.len());
        for old in &ids {
            let new = self.allocate_id();
            mapping.insert(*old, new);
        }
        let remap = |id: NodeId| mapping.get(&id).copied().unwrap_or(id);

        let now = Utc::now();
        let mut copies = Vec::with_capacity(ids.len());
        for old in &ids {
            let Some(original) = self.nodes.get(old) else {
                continue;
            };
            let mut copy = original.clone();
            copy.set_id(remap(*old));
            if *old == source {
                copy.set_parent(target);
                copy.set_name(name.clone(), now);
            } else if let Some(parent) = original.parent() {
                copy.set_parent(remap(parent));
            }
            copy.set_children(original.children().iter().map(|c| remap(*c)).collect());
            copy.set_flags(NodeFlags {
                system: false,
                ..original.flags()
            });
            copy.set_timestamps(now);
            copies.push(copy);
        }

        let top = remap(source);
        for copy in copies {
            self.nodes.insert(copy.id(), copy);
        }
        self.attach(target, top);
        tracing::debug!(%source, copy = %top, %target, count = ids.len(), "duplicated subtree");
        Ok(top)
    }

    /// Fails unless `count` more ids can be handed out.
    fn reserve_ids(&self, count: u64) -> VfsResult<()> {
        self.next_id
            .checked_add(count)
            .map(|_| ())
            .ok_or(VfsError::IdsExhausted)
    }

    /// Callers outside seeding must [`reserve_ids`](Self::reserve_ids) first.
    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId::from_raw(self.next_id);
        self.next_id += 1;
        id
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(folder) = self.nodes.get_mut(&parent) {
            folder.push_child(child);
        }
    }

    fn check_parent(&self, parent: NodeId) -> VfsResult<()> {
        let node = self
            .nodes
            .get(&parent)
            .ok_or(VfsError::ParentNotFound(parent))?;
        if !node.is_folder() {
            return Err(VfsError::ParentIsFile(parent));
        }
        self.check_unsealed(parent)
    }

    fn check_unsealed(&self, folder: NodeId) -> VfsResult<()> {
        if self.sealed == Some(folder) {
            return Err(VfsError::SystemProtected(folder));
        }
        Ok(())
    }

    fn check_name_free(&self, parent: NodeId, name: &str, except: Option<NodeId>) -> VfsResult<()> {
        if self.find_child_except(parent, name, except).is_some() {
            return Err(VfsError::NameConflict {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

fn corrupt(reason: impl Into<String>) -> VfsError {
    VfsError::CorruptSnapshot(reason.into())
}

/// Checks that the nodes in `map` form one well-linked tree hanging off
/// `top`: kinds agree with content, every parent lists its child and every
/// child points back, sibling names are unique under `matching`, and every
/// node is reachable from `top` exactly once. The parent of `top` itself is
/// not looked at.
fn check_links(
    map: &BTreeMap<NodeId, Node>,
    top: NodeId,
    matching: NameMatching,
) -> VfsResult<()> {
    for node in map.values() {
        let id = node.id();
        match node.kind() {
            NodeKind::File if node.content().is_none() || !node.children().is_empty() => {
                return Err(corrupt(format!("file {id} has no content or has children")));
            }
            NodeKind::Folder if node.content().is_some() => {
                return Err(corrupt(format!("folder {id} carries content")));
            }
            _ => {}
        }
        if id != top {
            let parent = node
                .parent()
                .ok_or_else(|| corrupt(format!("node {id} is a second root")))?;
            let parent_node = map
                .get(&parent)
                .ok_or_else(|| corrupt(format!("node {id} has dangling parent {parent}")))?;
            if !parent_node.children().contains(&id) {
                return Err(corrupt(format!("{parent} does not list child {id}")));
            }
        }
        let children = node.children();
        for (i, child) in children.iter().enumerate() {
            let child_node = map
                .get(child)
                .ok_or_else(|| corrupt(format!("{id} lists missing child {child}")))?;
            if child_node.parent() != Some(id) {
                return Err(corrupt(format!("{child} does not point back to {id}")));
            }
            for other in &children[i + 1..] {
                let other_node = map
                    .get(other)
                    .ok_or_else(|| corrupt(format!("{id} lists missing child {other}")))?;
                if child == other || matching.same(child_node.name(), other_node.name()) {
                    return Err(corrupt(format!(
                        "duplicate name {:?} in folder {id}",
                        child_node.name()
                    )));
                }
            }
        }
    }

    let mut seen = HashSet::new();
    let mut stack = vec![top];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            return Err(corrupt(format!("cycle through {id}")));
        }
        if let Some(node) = map.get(&id) {
            stack.extend(node.children().iter().copied());
        }
    }
    if seen.len() != map.len() {
        return Err(corrupt(format!("nodes unreachable from {top}")));
    }
    Ok(())
}
