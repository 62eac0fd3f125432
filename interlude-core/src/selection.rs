//! Content selection: sampling with and without replacement.
//!
//! Draws that must not repeat within a session are tracked by a composite
//! `"{tag}-{index}"` key, where `index` is the item's position in the list
//! it was drawn from.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Session-scoped record of which tagged items have been shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsedKeys(HashSet<String>);

impl UsedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// The key recorded for item `index` drawn under `tag`.
    pub fn key(tag: &str, index: usize) -> String {
        format!("{tag}-{index}")
    }

    pub fn contains(&self, tag: &str, index: usize) -> bool {
        self.0.contains(&Self::key(tag, index))
    }

    /// Record a draw. Returns false if it was already recorded.
    pub fn insert(&mut self, tag: &str, index: usize) -> bool {
        self.0.insert(Self::key(tag, index))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recorded draws under one tag.
    pub fn count_tag(&self, tag: &str) -> usize {
        let prefix = format!("{tag}-");
        self.0
            .iter()
            .filter(|k| {
                k.strip_prefix(&prefix)
                    .is_some_and(|rest| rest.parse::<usize>().is_ok())
            })
            .count()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// A successful draw: the item and its index in the source list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pick<'a, T> {
    pub index: usize,
    pub item: &'a T,
}

/// Draw an item not yet used under `tag`, uniformly among the remaining ones.
///
/// Returns `None` once every item in `list` has been drawn under `tag`. The
/// list itself is never modified.
pub fn pick_unused<'a, T, R>(
    list: &'a [T],
    tag: &str,
    used: &mut UsedKeys,
    rng: &mut R,
) -> Option<Pick<'a, T>>
where
    R: Rng + ?Sized,
{
    let candidates: Vec<usize> = (0..list.len())
        .filter(|&i| !used.contains(tag, i))
        .collect();

    if candidates.is_empty() {
        return None;
    }

    let index = candidates[rng.gen_range(0..candidates.len())];
    used.insert(tag, index);
    Some(Pick {
        index,
        item: &list[index],
    })
}

/// Draw any item uniformly, with replacement.
pub fn pick_random<'a, T, R>(list: &'a [T], rng: &mut R) -> Option<Pick<'a, T>>
where
    R: Rng + ?Sized,
{
    if list.is_empty() {
        return None;
    }
    let index = rng.gen_range(0..list.len());
    Some(Pick {
        index,
        item: &list[index],
    })
}
