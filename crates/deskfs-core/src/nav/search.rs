//! Name and content search over the live tree, plain and fuzzy.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};

use crate::fs::node::{Node, NodeId};
use crate::fs::store::NodeStore;

/// Knobs for [`search`] and [`fuzzy_search`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Descend into hidden nodes and report them.
    #[serde(default)]
    pub include_hidden: bool,
    /// Also match the query against file content.
    #[serde(default)]
    pub match_content: bool,
}

/// Candidate nodes in pre-order: the root itself, every id in `excluded`
/// with its subtree, and (unless requested) hidden subtrees are skipped.
fn candidates<'a>(
    store: &'a NodeStore,
    options: SearchOptions,
    excluded: &[NodeId],
) -> Vec<&'a Node> {
    let mut out = Vec::new();
    let Some(root) = store.get(store.root()) else {
        return out;
    };
    let mut stack: Vec<NodeId> = root.children().iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        if excluded.contains(&id) {
            continue;
        }
        let Some(node) = store.get(id) else {
            continue;
        };
        if node.is_hidden() && !options.include_hidden {
            continue;
        }
        out.push(node);
        stack.extend(node.children().iter().rev().copied());
    }
    out
}

/// Case-insensitive substring search on names (and content when
/// [`SearchOptions::match_content`] is set). Results come back in
/// pre-order. An empty query matches nothing.
pub fn search<'a>(
    store: &'a NodeStore,
    query: &str,
    options: SearchOptions,
    excluded: &[NodeId],
) -> Vec<&'a Node> {
    let needle = crate::nfc_string(query.trim()).to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    candidates(store, options, excluded)
        .into_iter()
        .filter(|node| {
            node.name().to_lowercase().contains(&needle)
                || (options.match_content
                    && node
                        .content()
                        .is_some_and(|c| c.to_lowercase().contains(&needle)))
        })
        .collect()
}

/// A node paired with its fuzzy match score and the character indices in
/// its name that matched the query.
#[derive(Debug, Clone)]
pub struct FuzzyMatch<'a> {
    node: &'a Node,
    score: i64,
    matched_indices: Vec<usize>,
}

impl<'a> FuzzyMatch<'a> {
    /// The matching node.
    #[must_use]
    pub fn node(&self) -> &'a Node {
        self.node
    }

    /// Match score. Higher is better.
    #[must_use]
    pub fn score(&self) -> i64 {
        self.score
    }

    /// Indices in the node name that matched the query.
    #[must_use]
    pub fn matched_indices(&self) -> &[usize] {
        &self.matched_indices
    }
}

/// Skim-style fuzzy matching of `query` against node names.
///
/// Returns matches sorted by score, highest first; equal scores keep
/// pre-order. An empty query matches nothing.
pub fn fuzzy_search<'a>(
    store: &'a NodeStore,
    query: &str,
    options: SearchOptions,
    excluded: &[NodeId],
) -> Vec<FuzzyMatch<'a>> {
    let query = crate::nfc_string(query.trim());
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default().ignore_case();
    let mut matches: Vec<FuzzyMatch<'a>> = candidates(store, options, excluded)
        .into_iter()
        .filter_map(|node| {
            matcher
                .fuzzy_indices(node.name(), &query)
                .map(|(score, indices)| FuzzyMatch {
                    node,
                    score,
                    matched_indices: indices,
                })
        })
        .collect();

    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::node::{NodeFlags, NodeKind};
    use crate::fs::store::NameMatching;

    struct Fixture {
        store: NodeStore,
        trash: NodeId,
        docs: NodeId,
        report: NodeId,
        notes: NodeId,
        secret: NodeId,
        buried: NodeId,
    }

    fn fixture() -> Fixture {
        let mut store = NodeStore::new(NameMatching::CaseSensitive);
        let root = store.root();
        let docs = store
            .create(NodeKind::Folder, "Documents", root, None)
            .unwrap();
        let report = store
            .create(
                NodeKind::File,
                "Report.txt",
                docs,
                Some("quarterly numbers".to_string()),
            )
            .unwrap();
        let notes = store
            .create(
                NodeKind::File,
                "notes.md",
                docs,
                Some("remember the REPORT".to_string()),
            )
            .unwrap();
        let secret = store
            .create(NodeKind::Folder, "secret", root, None)
            .unwrap();
        let buried = store
            .create(NodeKind::File, "report-draft.txt", secret, None)
            .unwrap();
        store
            .set_flags(
                secret,
                NodeFlags {
                    hidden: true,
                    ..NodeFlags::default()
                },
            )
            .unwrap();
        let trash = store.insert_system_folder("Trash");
        store
            .create(NodeKind::File, "report-old.txt", trash, None)
            .unwrap();
        Fixture {
            store,
            trash,
            docs,
            report,
            notes,
            secret,
            buried,
        }
    }

    fn ids(nodes: &[&Node]) -> Vec<NodeId> {
        nodes.iter().map(|n| n.id()).collect()
    }

    // --- search ---

    #[test]
    fn search_is_case_insensitive_on_names() {
        let f = fixture();
        let found = search(&f.store, "REPORT", SearchOptions::default(), &[f.trash]);
        assert_eq!(ids(&found), vec![f.report]);
    }

    #[test]
    fn search_content_when_requested() {
        let f = fixture();
        let options = SearchOptions {
            match_content: true,
            ..SearchOptions::default()
        };
        let found = search(&f.store, "report", options, &[f.trash]);
        assert_eq!(ids(&found), vec![f.report, f.notes]);
    }

    #[test]
    fn search_skips_hidden_subtrees_by_default() {
        let f = fixture();
        let options = SearchOptions {
            include_hidden: true,
            ..SearchOptions::default()
        };
        let found = search(&f.store, "report", options, &[f.trash]);
        assert_eq!(ids(&found), vec![f.report, f.buried]);

        let found = search(&f.store, "secret", SearchOptions::default(), &[f.trash]);
        assert!(found.is_empty());
        let found = search(&f.store, "secret", options, &[f.trash]);
        assert_eq!(ids(&found), vec![f.secret]);
    }

    #[test]
    fn search_excludes_given_subtrees() {
        let f = fixture();
        let found = search(&f.store, "old", SearchOptions::default(), &[f.trash]);
        assert!(found.is_empty());
        let found = search(&f.store, "old", SearchOptions::default(), &[]);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn search_never_returns_root() {
        let f = fixture();
        let found = search(&f.store, "root", SearchOptions::default(), &[]);
        assert!(found.is_empty());
    }

    #[test]
    fn empty_query_matches_nothing() {
        let f = fixture();
        assert!(search(&f.store, "", SearchOptions::default(), &[]).is_empty());
        assert!(search(&f.store, "   ", SearchOptions::default(), &[]).is_empty());
    }

    #[test]
    fn search_returns_folders_too() {
        let f = fixture();
        let found = search(&f.store, "docu", SearchOptions::default(), &[]);
        assert_eq!(ids(&found), vec![f.docs]);
    }

    // --- fuzzy_search ---

    #[test]
    fn fuzzy_matches_subsequence() {
        let f = fixture();
        let matches = fuzzy_search(&f.store, "rpt", SearchOptions::default(), &[f.trash]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].node().id(), f.report);
        assert!(matches[0].score() > 0);
        assert_eq!(matches[0].matched_indices().len(), 3);
    }

    #[test]
    fn fuzzy_sorted_by_score() {
        let f = fixture();
        let matches = fuzzy_search(&f.store, "notes", SearchOptions::default(), &[]);
        assert!(!matches.is_empty());
        assert_eq!(matches[0].node().id(), f.notes);
        for pair in matches.windows(2) {
            assert!(pair[0].score() >= pair[1].score());
        }
    }

    #[test]
    fn fuzzy_no_match() {
        let f = fixture();
        assert!(fuzzy_search(&f.store, "zzzz", SearchOptions::default(), &[]).is_empty());
    }

    #[test]
    fn fuzzy_empty_query_matches_nothing() {
        let f = fixture();
        assert!(fuzzy_search(&f.store, "", SearchOptions::default(), &[]).is_empty());
    }
}
