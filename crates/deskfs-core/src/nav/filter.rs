//! Sorting for folder listings.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::fs::node::Node;

/// The field by which nodes are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    /// Keep the folder's insertion order.
    #[default]
    Manual,
    /// Sort alphabetically by name (case-insensitive).
    Name,
    /// Sort by file size in bytes, or entry count for folders.
    Size,
    /// Sort by last-modified time.
    Date,
    /// Sort by extension (case-insensitive).
    Type,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "manual" | "none" => Ok(Self::Manual),
            "name" => Ok(Self::Name),
            "size" => Ok(Self::Size),
            "date" => Ok(Self::Date),
            "type" | "ext" => Ok(Self::Type),
            other => Err(format!("unknown sort field: {other}")),
        }
    }
}

/// Sort order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest / earliest / A-Z first.
    #[default]
    Ascending,
    /// Largest / latest / Z-A first.
    Descending,
}

/// Sorts a listing by the given field and direction.
///
/// When `folders_first` is `true`, folders always come before files
/// regardless of the sort field. The sort is stable, so ties keep
/// insertion order.
pub fn sort_nodes<'a>(
    nodes: &[&'a Node],
    field: SortField,
    direction: SortDirection,
    folders_first: bool,
) -> Vec<&'a Node> {
    let mut sorted = nodes.to_vec();

    sorted.sort_by(|a, b| {
        if folders_first {
            let kind_cmp = b.is_folder().cmp(&a.is_folder());
            if kind_cmp != Ordering::Equal {
                return kind_cmp;
            }
        }

        let ord = compare_by_field(a, b, field);

        match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });

    sorted
}

fn compare_by_field(a: &Node, b: &Node, field: SortField) -> Ordering {
    match field {
        SortField::Manual => Ordering::Equal,
        SortField::Name => a.name().to_lowercase().cmp(&b.name().to_lowercase()),
        SortField::Size => a.size().cmp(&b.size()),
        SortField::Date => a.modified_at().cmp(&b.modified_at()),
        SortField::Type => extension_lower(a).cmp(&extension_lower(b)),
    }
}

fn extension_lower(node: &Node) -> String {
    node.extension().map(str::to_lowercase).unwrap_or_default()
}
