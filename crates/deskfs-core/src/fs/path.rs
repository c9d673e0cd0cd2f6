//! Read-only path resolution over a [`NodeStore`].

use crate::error::{VfsError, VfsResult};
use crate::fs::node::{Node, NodeId};
use crate::fs::store::NodeStore;

/// Separator between path segments. The root's path is a lone separator.
pub const SEPARATOR: char = '/';

/// Computes ancestor chains, canonical paths and path lookups.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    store: &'a NodeStore,
}

impl<'a> PathResolver<'a> {
    pub fn new(store: &'a NodeStore) -> Self {
        Self { store }
    }

    /// Ancestors of `id` ordered from just below the root down to the node's
    /// parent. Empty for the root and for direct children of the root.
    ///
    /// # Errors
    ///
    /// [`VfsError::NotFound`] if `id` is not live.
    pub fn ancestors(&self, id: NodeId) -> VfsResult<Vec<&'a Node>> {
        let node = self.store.get(id).ok_or(VfsError::NotFound(id))?;
        let root = self.store.root();
        let mut chain = Vec::new();
        let mut current = node.parent();
        while let Some(parent_id) = current {
            if parent_id == root {
                break;
            }
            let Some(parent) = self.store.get(parent_id) else {
                break;
            };
            chain.push(parent);
            current = parent.parent();
        }
        chain.reverse();
        Ok(chain)
    }

    /// Canonical path of `id`, e.g. `/Documents/notes.txt`. The root is `/`.
    ///
    /// # Errors
    ///
    /// [`VfsError::NotFound`] if `id` is not live.
    pub fn path(&self, id: NodeId) -> VfsResult<String> {
        if id == self.store.root() {
            return Ok(SEPARATOR.to_string());
        }
        let node = self.store.get(id).ok_or(VfsError::NotFound(id))?;
        let mut path = String::new();
        for ancestor in self.ancestors(id)? {
            path.push(SEPARATOR);
            path.push_str(ancestor.name());
        }
        path.push(SEPARATOR);
        path.push_str(node.name());
        Ok(path)
    }

    /// Looks up an absolute path. Segments must match names exactly (case
    /// included); empty segments are ignored, so `/a//b/` equals `/a/b`.
    pub fn resolve(&self, path: &str) -> Option<NodeId> {
        self.walk(self.store.root(), path)
    }

    /// Looks up `path` relative to `base`. Paths starting with the separator
    /// are absolute; `.` stays put and `..` climbs to the parent (the root is
    /// its own parent).
    pub fn resolve_from(&self, base: NodeId, path: &str) -> Option<NodeId> {
        if path.starts_with(SEPARATOR) {
            return self.resolve(path);
        }
        self.store.get(base)?;
        self.walk(base, path)
    }

    fn walk(&self, start: NodeId, path: &str) -> Option<NodeId> {
        let mut current = start;
        for segment in path.split(SEPARATOR).filter(|s| !s.is_empty()) {
            current = match segment {
                "." => current,
                ".." => self.store.get(current)?.parent().unwrap_or(current),
                name => {
                    let name = crate::nfc_string(name);
                    let folder = self.store.get(current)?;
                    folder.children().iter().copied().find(|child| {
                        self.store
                            .get(*child)
                            .is_some_and(|n| n.name() == name)
                    })?
                }
            };
        }
        Some(current)
    }

    /// Returns `true` if `candidate` lies strictly below `ancestor`.
    pub fn is_descendant_of(&self, candidate: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.store.get(candidate).and_then(Node::parent);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.store.get(id).and_then(Node::parent);
        }
        false
    }

    /// `(id, name)` pairs from the root down to `id`, both included. The root
    /// is labelled with the separator.
    ///
    /// # Errors
    ///
    /// [`VfsError::NotFound`] if `id` is not live.
    pub fn breadcrumbs(&self, id: NodeId) -> VfsResult<Vec<(NodeId, String)>> {
        let node = self.store.get(id).ok_or(VfsError::NotFound(id))?;
        let root = self.store.root();
        let mut crumbs = vec![(root, SEPARATOR.to_string())];
        if id == root {
            return Ok(crumbs);
        }
        crumbs.extend(
            self.ancestors(id)?
                .into_iter()
                .map(|n| (n.id(), n.name().to_string())),
        );
        crumbs.push((id, node.name().to_string()));
        Ok(crumbs)
    }
}
