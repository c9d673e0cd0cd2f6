//! Navigation helpers layered over the node store.
//!
//! This module contains substring and fuzzy [`search`], the
//! [`favorites::Favorites`] set and listing [`filter`]ing/sorting.

pub mod favorites;
pub mod filter;
pub mod search;
