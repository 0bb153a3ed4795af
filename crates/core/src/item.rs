//! Item interning
//!
//! Item tokens are stored once in a [`Vocabulary`] and referred to everywhere
//! else by a 4-byte [`ItemId`]. The candidate search compares and hashes ids,
//! never strings.

use std::collections::HashMap;

/// Interned item handle. Ids are dense and assigned in first-seen order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(u32);

impl ItemId {
    /// Position of the item in its vocabulary
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// String table backing [`ItemId`]s.
///
/// Tokens are trimmed and compared case-insensitively. The display name of an
/// item is the casing it was first seen with; the canonical key is the
/// trimmed, lowercased token and drives every lexicographic ordering.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    lookup: HashMap<String, ItemId>,
    names: Vec<String>,
    keys: Vec<String>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a raw token, returning `None` for tokens that are blank after trimming.
    pub fn intern(&mut self, token: &str) -> Option<ItemId> {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return None;
        }

        let key = canonical_key(trimmed);
        if let Some(&id) = self.lookup.get(&key) {
            return Some(id);
        }

        let id = ItemId(self.names.len() as u32);
        self.names.push(trimmed.to_string());
        self.keys.push(key.clone());
        self.lookup.insert(key, id);
        Some(id)
    }

    /// Look up an already interned token.
    pub fn get(&self, token: &str) -> Option<ItemId> {
        self.lookup.get(&canonical_key(token.trim())).copied()
    }

    /// Display name (first-seen casing).
    pub fn name(&self, id: ItemId) -> &str {
        &self.names[id.index()]
    }

    /// Canonical (lowercased) key.
    pub fn key(&self, id: ItemId) -> &str {
        &self.keys[id.index()]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        (0..self.names.len()).map(|index| ItemId(index as u32))
    }

    /// Canonical keys of `items`, sorted ascending. Used as the lexicographic
    /// tie-break for itemsets and rule sides.
    pub fn sorted_keys<'a>(&'a self, items: &[ItemId]) -> Vec<&'a str> {
        let mut keys: Vec<&str> = items.iter().map(|id| self.key(*id)).collect();
        keys.sort_unstable();
        keys
    }

    /// Display names of `items`, ordered by canonical key.
    pub fn sorted_names(&self, items: &[ItemId]) -> Vec<String> {
        let mut ids = items.to_vec();
        ids.sort_by(|left, right| {
            self.key(*left)
                .cmp(self.key(*right))
                .then_with(|| self.name(*left).cmp(self.name(*right)))
        });
        ids.into_iter().map(|id| self.name(id).to_string()).collect()
    }
}

fn canonical_key(token: &str) -> String {
    token.to_lowercase()
}
