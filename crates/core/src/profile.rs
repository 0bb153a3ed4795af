use serde::{Deserialize, Serialize};

use crate::item::ItemId;
use crate::store::TransactionStore;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemFrequency {
    pub name: String,
    pub frequency: f64,
}

/// Support thresholds derived from the per-item frequency distribution,
/// from most permissive to strictest.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SupportSuggestions {
    pub very_low: f64,
    pub low: f64,
    pub conservative: f64,
    pub moderate: f64,
    pub strict: f64,
}

impl SupportSuggestions {
    pub fn from_frequencies(frequencies: &[f64]) -> Self {
        let mut sorted = frequencies.to_vec();
        sorted.sort_by(f64::total_cmp);
        let min = sorted.first().copied().unwrap_or(0.0);
        let median = median_of_sorted(&sorted);

        Self {
            very_low: bounded(0.01, min * 0.5),
            low: bounded(0.02, min),
            conservative: bounded(0.05, median * 0.3),
            moderate: bounded(0.1, median * 0.5),
            strict: bounded(0.2, median),
        }
    }

    /// (name, value, description) triples in ascending strictness.
    pub fn described(&self) -> [(&'static str, f64, &'static str); 5] {
        [
            ("very_low", self.very_low, "Most permissive - includes very rare item combinations"),
            ("low", self.low, "Includes even the rarest items that appear"),
            ("conservative", self.conservative, "Balanced approach - good starting point"),
            ("moderate", self.moderate, "Focuses on moderately frequent patterns"),
            ("strict", self.strict, "Only very common patterns"),
        ]
    }
}

/// Shape of a transaction set, computed before any mining.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub transaction_count: usize,
    pub item_count: usize,
    pub avg_items_per_transaction: f64,
    /// Share of empty cells in the transaction-by-item incidence table
    pub sparsity: f64,
    pub most_frequent_item: ItemFrequency,
    pub least_frequent_item: ItemFrequency,
    pub support_suggestions: SupportSuggestions,
}

impl DatasetProfile {
    pub fn from_store(store: &TransactionStore) -> Self {
        let vocabulary = store.vocabulary();
        let transaction_count = store.len();
        let item_count = vocabulary.len();
        let filled: usize = store.transactions().iter().map(|transaction| transaction.len()).sum();

        let frequencies: Vec<f64> = store
            .item_counts()
            .iter()
            .map(|count| *count as f64 / transaction_count as f64)
            .collect();

        let mut ranked: Vec<ItemId> = vocabulary.ids().collect();
        ranked.sort_by(|left, right| {
            store
                .item_count(*right)
                .cmp(&store.item_count(*left))
                .then_with(|| vocabulary.key(*left).cmp(vocabulary.key(*right)))
        });
        let describe = |id: ItemId| ItemFrequency {
            name: vocabulary.name(id).to_string(),
            frequency: frequencies[id.index()],
        };
        // A built store always has at least one item.
        let most = ranked[0];
        let lowest_count = store.item_count(ranked[ranked.len() - 1]);
        let least = ranked
            .iter()
            .copied()
            .find(|id| store.item_count(*id) == lowest_count)
            .unwrap_or(most);

        Self {
            transaction_count,
            item_count,
            avg_items_per_transaction: filled as f64 / transaction_count as f64,
            sparsity: 1.0 - filled as f64 / (transaction_count * item_count) as f64,
            most_frequent_item: describe(most),
            least_frequent_item: describe(least),
            support_suggestions: SupportSuggestions::from_frequencies(&frequencies),
        }
    }
}

fn bounded(floor: f64, value: f64) -> f64 {
    value.max(floor).min(1.0)
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    match sorted.len() {
        0 => 0.0,
        len if len % 2 == 1 => sorted[len / 2],
        len => (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0,
    }
}
