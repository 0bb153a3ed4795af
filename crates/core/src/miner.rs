//! Level-wise frequent itemset mining
//!
//! Candidates of size k are joined from frequent (k-1)-itemsets that share
//! their first k-2 items, pruned by downward closure (a candidate with an
//! infrequent (k-1)-subset is dropped without being counted), and only then
//! counted against the transactions.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::MiningError;
use crate::item::ItemId;
use crate::store::TransactionStore;

/// Tolerance applied to every threshold comparison.
pub const SUPPORT_EPSILON: f64 = 1e-9;

/// Candidate lists at least this long are counted on the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 256;

/// A frequent itemset: sorted distinct item ids with its absolute count and support.
#[derive(Clone, Debug, PartialEq)]
pub struct Itemset {
    items: Vec<ItemId>,
    count: usize,
    support: f64,
}

impl Itemset {
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// Number of transactions containing every item
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn support(&self) -> f64 {
        self.support
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
}

/// Candidate accounting for one level of the search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStats {
    /// Itemset size of this level
    pub k: usize,
    /// Candidates produced by the join step
    pub joined: usize,
    /// Candidates discarded by downward closure before counting
    pub pruned: usize,
    /// Candidates whose support was counted
    pub counted: usize,
    /// Candidates that met the threshold
    pub frequent: usize,
}

/// Ordered mining output with a support lookup by item set.
#[derive(Clone, Debug)]
pub struct FrequentItemsets {
    itemsets: Vec<Itemset>,
    index: HashMap<Vec<ItemId>, usize>,
    levels: Vec<LevelStats>,
    transaction_count: usize,
    min_support: f64,
}

impl FrequentItemsets {
    /// Itemsets ordered by descending support, ascending size, then canonical item keys.
    pub fn itemsets(&self) -> &[Itemset] {
        &self.itemsets
    }

    pub fn iter(&self) -> impl Iterator<Item = &Itemset> {
        self.itemsets.iter()
    }

    pub fn len(&self) -> usize {
        self.itemsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itemsets.is_empty()
    }

    pub fn levels(&self) -> &[LevelStats] {
        &self.levels
    }

    pub fn transaction_count(&self) -> usize {
        self.transaction_count
    }

    pub fn min_support(&self) -> f64 {
        self.min_support
    }

    /// Find the itemset with exactly these members, in any order.
    pub fn get(&self, items: &[ItemId]) -> Option<&Itemset> {
        let position = if is_sorted(items) {
            self.index.get(items)
        } else {
            let mut sorted = items.to_vec();
            sorted.sort_unstable();
            self.index.get(&sorted)
        };
        position.map(|position| &self.itemsets[*position])
    }

    pub fn support_of(&self, items: &[ItemId]) -> Option<f64> {
        self.get(items).map(Itemset::support)
    }

    pub fn count_of(&self, items: &[ItemId]) -> Option<usize> {
        self.get(items).map(Itemset::count)
    }
}

#[derive(Clone, Debug)]
pub struct Miner {
    parallel_threshold: usize,
}

impl Default for Miner {
    fn default() -> Self {
        Self { parallel_threshold: DEFAULT_PARALLEL_THRESHOLD }
    }
}

impl Miner {
    pub fn with_parallel_threshold(parallel_threshold: usize) -> Self {
        Self { parallel_threshold: parallel_threshold.max(1) }
    }

    pub fn mine(
        &self,
        store: &TransactionStore,
        min_support: f64,
    ) -> Result<FrequentItemsets, MiningError> {
        validate_min_support(min_support)?;

        let transaction_count = store.len();
        let vocabulary_size = store.vocabulary().len();
        let mut discovered: Vec<Itemset> = Vec::new();
        let mut levels = Vec::new();

        let mut current: Vec<Itemset> = store
            .vocabulary()
            .ids()
            .map(|id| (id, store.item_count(id)))
            .filter(|(_, count)| meets_threshold(*count, transaction_count, min_support))
            .map(|(id, count)| Itemset {
                items: vec![id],
                count,
                support: count as f64 / transaction_count as f64,
            })
            .collect();
        levels.push(LevelStats {
            k: 1,
            joined: vocabulary_size,
            pruned: 0,
            counted: vocabulary_size,
            frequent: current.len(),
        });
        debug!(
            event_name = "mining.itemsets.level_completed",
            k = 1,
            frequent = current.len(),
            "level completed"
        );

        let mut k = 2;
        while !current.is_empty() && k <= vocabulary_size {
            let (joined_count, survivors) = {
                let previous: HashSet<&[ItemId]> =
                    current.iter().map(|itemset| itemset.items.as_slice()).collect();
                let joined = join(&current);
                let joined_count = joined.len();
                let survivors: Vec<Vec<ItemId>> = joined
                    .into_iter()
                    .filter(|candidate| all_subsets_frequent(candidate, &previous))
                    .collect();
                (joined_count, survivors)
            };
            let pruned = joined_count - survivors.len();

            let counts = self.count_candidates(store, &survivors);
            let next: Vec<Itemset> = survivors
                .into_iter()
                .zip(counts)
                .filter(|(_, count)| meets_threshold(*count, transaction_count, min_support))
                .map(|(items, count)| Itemset {
                    items,
                    count,
                    support: count as f64 / transaction_count as f64,
                })
                .collect();

            let stats = LevelStats {
                k,
                joined: joined_count,
                pruned,
                counted: joined_count - pruned,
                frequent: next.len(),
            };
            debug!(
                event_name = "mining.itemsets.level_completed",
                k,
                joined = stats.joined,
                pruned = stats.pruned,
                frequent = stats.frequent,
                "level completed"
            );
            levels.push(stats);

            discovered.append(&mut current);
            current = next;
            k += 1;
        }
        discovered.append(&mut current);

        let vocabulary = store.vocabulary();
        // Stable sort: remaining ties keep discovery order.
        discovered.sort_by(|left, right| {
            right
                .count
                .cmp(&left.count)
                .then_with(|| left.items.len().cmp(&right.items.len()))
                .then_with(|| {
                    vocabulary.sorted_keys(&left.items).cmp(&vocabulary.sorted_keys(&right.items))
                })
        });

        let index = discovered
            .iter()
            .enumerate()
            .map(|(position, itemset)| (itemset.items.clone(), position))
            .collect();

        info!(
            event_name = "mining.itemsets.completed",
            transactions = transaction_count,
            vocabulary = vocabulary_size,
            min_support,
            itemsets = discovered.len(),
            levels = levels.len(),
            "frequent itemset mining completed"
        );

        Ok(FrequentItemsets { itemsets: discovered, index, levels, transaction_count, min_support })
    }

    fn count_candidates(&self, store: &TransactionStore, candidates: &[Vec<ItemId>]) -> Vec<usize> {
        if candidates.len() >= self.parallel_threshold {
            candidates.par_iter().map(|candidate| store.count_containing(candidate)).collect()
        } else {
            candidates.iter().map(|candidate| store.count_containing(candidate)).collect()
        }
    }
}

/// Mine with the default parallelism settings.
pub fn mine(store: &TransactionStore, min_support: f64) -> Result<FrequentItemsets, MiningError> {
    Miner::default().mine(store, min_support)
}

pub fn validate_min_support(min_support: f64) -> Result<(), MiningError> {
    if min_support > 0.0 && min_support <= 1.0 {
        return Ok(());
    }
    Err(MiningError::InvalidParameter(format!("min_support must be in (0,1], got {min_support}")))
}

pub(crate) fn meets_threshold(count: usize, total: usize, threshold: f64) -> bool {
    total > 0 && count as f64 / total as f64 >= threshold - SUPPORT_EPSILON
}

/// Prefix join. `level` holds distinct sorted itemsets of equal size; each
/// candidate is produced once, from the two members whose last items differ.
fn join(level: &[Itemset]) -> Vec<Vec<ItemId>> {
    let mut sorted: Vec<&[ItemId]> = level.iter().map(|itemset| itemset.items.as_slice()).collect();
    sorted.sort_unstable();

    let mut candidates = Vec::new();
    for (position, left) in sorted.iter().enumerate() {
        let prefix = &left[..left.len() - 1];
        for right in &sorted[position + 1..] {
            if &right[..right.len() - 1] != prefix {
                break;
            }
            let mut candidate = left.to_vec();
            candidate.push(right[right.len() - 1]);
            candidates.push(candidate);
        }
    }
    candidates
}

fn all_subsets_frequent(candidate: &[ItemId], previous: &HashSet<&[ItemId]>) -> bool {
    // Dropping either of the last two items yields one of the join parents.
    let checked = candidate.len().saturating_sub(2);
    let mut subset = Vec::with_capacity(candidate.len() - 1);
    (0..checked).all(|skip| {
        subset.clear();
        subset.extend(
            candidate
                .iter()
                .enumerate()
                .filter(|(position, _)| *position != skip)
                .map(|(_, item)| *item),
        );
        previous.contains(subset.as_slice())
    })
}

fn is_sorted(items: &[ItemId]) -> bool {
    items.windows(2).all(|pair| pair[0] < pair[1])
}
