use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::MiningError;
use crate::item::{ItemId, Vocabulary};

/// One raw input row: an optional transaction key and its item tokens.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub key: Option<String>,
    pub items: Vec<String>,
}

impl TransactionRecord {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { key: None, items: items.into_iter().map(Into::into).collect() }
    }

    pub fn keyed<I, S>(key: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { key: Some(key.into()), items: items.into_iter().map(Into::into).collect() }
    }
}

/// Distinct items of one transaction, sorted by id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    items: Vec<ItemId>,
}

impl Transaction {
    fn from_unsorted(mut items: Vec<ItemId>) -> Self {
        items.sort_unstable();
        items.dedup();
        Self { items }
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: ItemId) -> bool {
        self.items.binary_search(&item).is_ok()
    }

    /// `true` when every id in `sorted_items` is present. `sorted_items` must
    /// be ascending; both sides are walked once.
    pub fn contains_all(&self, sorted_items: &[ItemId]) -> bool {
        if sorted_items.len() > self.items.len() {
            return false;
        }

        let mut own = self.items.iter();
        'wanted: for wanted in sorted_items {
            for candidate in own.by_ref() {
                if candidate == wanted {
                    continue 'wanted;
                }
                if candidate > wanted {
                    return false;
                }
            }
            return false;
        }
        true
    }
}

/// Validated, immutable set of transactions plus the item vocabulary.
#[derive(Clone, Debug)]
pub struct TransactionStore {
    transactions: Vec<Transaction>,
    vocabulary: Vocabulary,
    item_counts: Vec<usize>,
}

impl TransactionStore {
    /// Build a store from raw records. Records sharing a key merge into one
    /// transaction in first-seen key order; unkeyed records stand alone.
    pub fn from_records<I>(records: I) -> Result<Self, MiningError>
    where
        I: IntoIterator<Item = TransactionRecord>,
    {
        let mut vocabulary = Vocabulary::new();
        let mut grouped: Vec<Vec<ItemId>> = Vec::new();
        let mut slot_by_key: HashMap<String, usize> = HashMap::new();
        let mut row_count = 0usize;

        for (row, record) in records.into_iter().enumerate() {
            row_count += 1;
            let ids: Vec<ItemId> =
                record.items.iter().filter_map(|token| vocabulary.intern(token)).collect();
            if ids.is_empty() {
                return Err(MiningError::InvalidInput(format!(
                    "transaction row {row} has no items after normalization"
                )));
            }

            match record.key {
                Some(key) => {
                    let slot = *slot_by_key.entry(key).or_insert_with(|| {
                        grouped.push(Vec::new());
                        grouped.len() - 1
                    });
                    grouped[slot].extend(ids);
                }
                None => grouped.push(ids),
            }
        }

        if row_count == 0 {
            return Err(MiningError::InvalidInput("transaction list is empty".to_string()));
        }
        if vocabulary.is_empty() {
            return Err(MiningError::InvalidInput(
                "no items remain after normalization".to_string(),
            ));
        }

        let transactions: Vec<Transaction> =
            grouped.into_iter().map(Transaction::from_unsorted).collect();
        let mut item_counts = vec![0usize; vocabulary.len()];
        for transaction in &transactions {
            for item in transaction.items() {
                item_counts[item.index()] += 1;
            }
        }

        Ok(Self { transactions, vocabulary, item_counts })
    }

    /// Unkeyed shorthand: each basket is one transaction.
    pub fn from_baskets<B, I, S>(baskets: B) -> Result<Self, MiningError>
    where
        B: IntoIterator<Item = I>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_records(baskets.into_iter().map(TransactionRecord::new))
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Number of transactions containing each item, indexed by [`ItemId::index`].
    pub fn item_counts(&self) -> &[usize] {
        &self.item_counts
    }

    pub fn item_count(&self, item: ItemId) -> usize {
        self.item_counts[item.index()]
    }

    pub fn count_containing(&self, sorted_items: &[ItemId]) -> usize {
        self.transactions.iter().filter(|transaction| transaction.contains_all(sorted_items)).count()
    }

    /// Positions of the transactions containing every item in `items`.
    pub fn containing(&self, items: &[ItemId]) -> Vec<usize> {
        let mut sorted = items.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        self.transactions
            .iter()
            .enumerate()
            .filter(|(_, transaction)| transaction.contains_all(&sorted))
            .map(|(index, _)| index)
            .collect()
    }

    /// Resolve display names to ids, ignoring case. Unknown names yield `None`.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Option<Vec<ItemId>> {
        names.iter().map(|name| self.vocabulary.get(name.as_ref())).collect()
    }
}
