//! Text rendering of listings, trees and core events.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use deskfs_core::{ClipboardMode, ClipboardState, Event, FuzzyMatch, Node, TrashEntry, Vfs};

/// Prompt built from the breadcrumbs of the current folder.
pub fn prompt(vfs: &Vfs, cwd: deskfs_core::NodeId) -> String {
    let path = vfs.path(cwd).unwrap_or_else(|_| "/".to_string());
    format!("deskfs:{path}> ")
}

/// One flag column: `s` system, `r` read-only, `h` hidden.
fn flag_marks(node: &Node) -> String {
    let mut marks = String::with_capacity(3);
    marks.push(if node.is_system() { 's' } else { '-' });
    marks.push(if node.is_read_only() { 'r' } else { '-' });
    marks.push(if node.is_hidden() { 'h' } else { '-' });
    marks
}

/// Formats a timestamp, falling back to RFC 3339 when `date_format` is not
/// a pattern chrono can render.
fn stamp(at: DateTime<Utc>, date_format: &str) -> String {
    let mut out = String::new();
    match write!(out, "{}", at.format(date_format)) {
        Ok(()) => out,
        Err(_) => at.to_rfc3339(),
    }
}

fn display_name(node: &Node) -> String {
    if node.is_folder() {
        format!("{}/", node.name())
    } else {
        node.name().to_string()
    }
}

/// Long-format folder listing, one node per line.
pub fn listing(nodes: &[&Node], date_format: &str, favorite: impl Fn(&Node) -> bool) -> String {
    if nodes.is_empty() {
        return "(empty)".to_string();
    }
    nodes
        .iter()
        .copied()
        .map(|node| {
            let size = if node.is_folder() {
                format!("{} items", node.size())
            } else {
                format!("{} B", node.size())
            };
            let star = if favorite(node) { "*" } else { " " };
            format!(
                "{} {:>10}  {}  {}{}",
                flag_marks(node),
                size,
                stamp(node.modified_at(), date_format),
                star,
                display_name(node),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Indented drawing of the subtree below `id`.
pub fn tree(vfs: &Vfs, id: deskfs_core::NodeId, show_hidden: bool) -> String {
    let Some(node) = vfs.get(id) else {
        return String::new();
    };
    let mut lines = vec![display_name(node)];
    draw_children(vfs, id, show_hidden, "", &mut lines);
    lines.join("\n")
}

fn draw_children(
    vfs: &Vfs,
    id: deskfs_core::NodeId,
    show_hidden: bool,
    prefix: &str,
    lines: &mut Vec<String>,
) {
    let Ok(children) = vfs.children(id, show_hidden) else {
        return;
    };
    let count = children.len();
    for (i, child) in children.into_iter().enumerate() {
        let last = i + 1 == count;
        let branch = if last { "└── " } else { "├── " };
        lines.push(format!("{prefix}{branch}{}", display_name(child)));
        if child.is_folder() {
            let nested = format!("{prefix}{}", if last { "    " } else { "│   " });
            draw_children(vfs, child.id(), show_hidden, &nested, lines);
        }
    }
}

/// Details of a single node.
pub fn info(vfs: &Vfs, node: &Node, date_format: &str) -> String {
    let path = vfs.path(node.id()).unwrap_or_default();
    let kind = if node.is_folder() { "folder" } else { "file" };
    let mut lines = vec![
        format!("id:        {}", node.id()),
        format!("path:      {path}"),
        format!("kind:      {kind}"),
        format!("size:      {}", node.size()),
        format!("created:   {}", stamp(node.created_at(), date_format)),
        format!("modified:  {}", stamp(node.modified_at(), date_format)),
        format!("flags:     {}", flag_marks(node)),
    ];
    if let Some(ext) = node.extension() {
        lines.push(format!("extension: {ext}"));
    }
    if vfs.is_favorite(node.id()) {
        lines.push("favorite:  yes".to_string());
    }
    lines.join("\n")
}

/// The trash ledger with the indices `restore` and `purge` expect.
pub fn trash(entries: &[TrashEntry], vfs: &Vfs, date_format: &str) -> String {
    if entries.is_empty() {
        return "trash is empty".to_string();
    }
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let from = vfs
                .path(entry.original_parent())
                .unwrap_or_else(|_| format!("{} (gone)", entry.original_parent()));
            format!(
                "[{i}] {}  from {from}  at {}  ({} nodes)",
                display_name(entry.node()),
                stamp(entry.deleted_at(), date_format),
                entry.subtree().len(),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn clipboard(state: ClipboardState, vfs: &Vfs) -> String {
    match state {
        ClipboardState::Empty => "clipboard is empty".to_string(),
        ClipboardState::Holding { source, mode } => {
            let verb = match mode {
                ClipboardMode::Copy => "copy",
                ClipboardMode::Cut => "cut",
            };
            let what = vfs
                .path(source)
                .unwrap_or_else(|_| format!("{source} (no longer live)"));
            format!("holding {what} for {verb}")
        }
    }
}

/// Search hits as full paths, one per line.
pub fn search_results(vfs: &Vfs, nodes: &[&Node]) -> String {
    if nodes.is_empty() {
        return "no matches".to_string();
    }
    nodes
        .iter()
        .filter_map(|n| vfs.path(n.id()).ok())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fuzzy hits with their scores, best first.
pub fn fuzzy_results(vfs: &Vfs, matches: &[FuzzyMatch<'_>]) -> String {
    if matches.is_empty() {
        return "no matches".to_string();
    }
    matches
        .iter()
        .filter_map(|m| {
            vfs.path(m.node().id())
                .ok()
                .map(|path| format!("{:>5}  {path}", m.score()))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn favorites(vfs: &Vfs) -> String {
    let favorites = vfs.favorite_nodes();
    if favorites.is_empty() {
        return "no favorites".to_string();
    }
    favorites
        .into_iter()
        .map(|(id, node)| match node {
            Some(node) => vfs.path(node.id()).unwrap_or_else(|_| id.to_string()),
            None => format!("{id} (missing)"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line summary of a successful event.
pub fn event(vfs: &Vfs, event: &Event) -> String {
    let path_of = |id| vfs.path(id).unwrap_or_else(|_| format!("{id}"));
    match event {
        Event::Created(id) => format!("created {}", path_of(*id)),
        Event::Changed(id) => format!("updated {}", path_of(*id)),
        Event::Trashed { id, index } => format!("moved {id} to trash [{index}]"),
        Event::Restored(id) => format!("restored {}", path_of(*id)),
        Event::Purged(id) => format!("permanently deleted {id}"),
        Event::TrashEmptied { count } => format!("emptied trash ({count} entries)"),
        Event::Pasted(id) => format!("pasted {}", path_of(*id)),
        Event::ClipboardChanged(state) => clipboard(*state, vfs),
        Event::FavoritesChanged => "favorites updated".to_string(),
        Event::Unchanged => "nothing to do".to_string(),
        Event::OperationFailed { operation, error } => format!("{operation} failed: {error}"),
    }
}
