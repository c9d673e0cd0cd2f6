//! Favorites: an ordered set of node ids.
//!
//! Favorites never consult the node store. An id stays favorited after its
//! node is trashed or purged, and callers treat a failed lookup as an
//! orphaned favorite.

use serde::{Deserialize, Serialize};

use crate::fs::node::NodeId;

/// Ordered, duplicate-free list of favorite node ids. Serialised as a plain
/// id array; repeats in a loaded array are dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "Vec<NodeId>", into = "Vec<NodeId>")]
pub struct Favorites {
    ids: Vec<NodeId>,
}

impl From<Vec<NodeId>> for Favorites {
    fn from(ids: Vec<NodeId>) -> Self {
        Self::from_ids(ids)
    }
}

impl From<Favorites> for Vec<NodeId> {
    fn from(favorites: Favorites) -> Self {
        favorites.ids
    }
}

impl Favorites {
    /// Create an empty favorite set.
    #[must_use]
    pub fn new() -> Self {
        Self { ids: Vec::new() }
    }

    /// Build from persisted ids, dropping repeats but keeping first-seen order.
    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = NodeId>) -> Self {
        let mut favorites = Self::new();
        for id in ids {
            favorites.favorite(id);
        }
        favorites
    }

    /// Append `id`. Returns `false` if it was already a favorite.
    pub fn favorite(&mut self, id: NodeId) -> bool {
        if self.ids.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Remove `id`. Returns `false` if it was not a favorite.
    pub fn unfavorite(&mut self, id: NodeId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|f| *f != id);
        self.ids.len() != before
    }

    #[must_use]
    pub fn is_favorite(&self, id: NodeId) -> bool {
        self.ids.contains(&id)
    }

    /// Favorites in the order they were added.
    #[must_use]
    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
