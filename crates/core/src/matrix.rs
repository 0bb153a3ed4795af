use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::item::{ItemId, Vocabulary};
use crate::miner::FrequentItemsets;
use crate::store::TransactionStore;

pub const DEFAULT_MATRIX_MAX_ITEMS: usize = 50;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixWeighting {
    /// Sum of supports of the frequent itemsets containing both items.
    #[default]
    ItemsetSupport,
    /// Raw count of transactions containing both items, zero diagonal.
    PairCount,
}

impl MatrixWeighting {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ItemsetSupport => "itemset_support",
            Self::PairCount => "pair_count",
        }
    }
}

impl std::str::FromStr for MatrixWeighting {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "itemset_support" => Ok(Self::ItemsetSupport),
            "pair_count" => Ok(Self::PairCount),
            other => Err(format!(
                "unsupported matrix weighting `{other}` (expected itemset_support|pair_count)"
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatrixOptions {
    /// Upper bound on rows/columns; the best-supported items are kept.
    pub max_items: usize,
    pub weighting: MatrixWeighting,
}

impl Default for MatrixOptions {
    fn default() -> Self {
        Self { max_items: DEFAULT_MATRIX_MAX_ITEMS, weighting: MatrixWeighting::default() }
    }
}

/// Symmetric item-by-item weight table with its row/column labels.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CoOccurrenceMatrix {
    items: Vec<String>,
    weights: Vec<Vec<f64>>,
    truncated: bool,
}

impl CoOccurrenceMatrix {
    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    /// `true` when the vocabulary was larger than the configured cap.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn weight(&self, row: usize, column: usize) -> f64 {
        self.weights[row][column]
    }

    /// Weight between two items by name, ignoring case.
    pub fn weight_between(&self, left: &str, right: &str) -> Option<f64> {
        let row = self.position(left)?;
        let column = self.position(right)?;
        Some(self.weights[row][column])
    }

    fn position(&self, name: &str) -> Option<usize> {
        let wanted = name.trim().to_lowercase();
        self.items.iter().position(|item| item.to_lowercase() == wanted)
    }
}

/// Heatmap matrix over the observed vocabulary. Off-diagonal cells sum the
/// supports of frequent itemsets holding both items; the diagonal is the
/// item's own support, or 0 when it was not individually frequent.
///
/// Items are ranked by own support, ties broken by canonical key and then
/// display name; only the first `options.max_items` are kept.
pub fn build_matrix(
    frequent: &FrequentItemsets,
    vocabulary: &Vocabulary,
    options: &MatrixOptions,
) -> CoOccurrenceMatrix {
    let scores: Vec<f64> =
        vocabulary.ids().map(|id| frequent.support_of(&[id]).unwrap_or(0.0)).collect();
    let selection = select_items(vocabulary, options.max_items, |left, right| {
        scores[right.index()].total_cmp(&scores[left.index()])
    });

    let size = selection.ids.len();
    let mut weights = vec![vec![0.0; size]; size];
    for (position, id) in selection.ids.iter().enumerate() {
        weights[position][position] = scores[id.index()];
    }

    for itemset in frequent.iter().filter(|itemset| itemset.len() >= 2) {
        let members: Vec<usize> =
            itemset.items().iter().filter_map(|id| selection.position[id.index()]).collect();
        for (offset, &row) in members.iter().enumerate() {
            for &column in &members[offset + 1..] {
                weights[row][column] += itemset.support();
                weights[column][row] += itemset.support();
            }
        }
    }

    selection.into_matrix(vocabulary, weights)
}

/// Raw pairwise co-occurrence counts straight from the transactions, with a
/// zero diagonal. Independent of any mining threshold.
pub fn build_pair_count_matrix(
    store: &TransactionStore,
    options: &MatrixOptions,
) -> CoOccurrenceMatrix {
    let vocabulary = store.vocabulary();
    let selection = select_items(vocabulary, options.max_items, |left, right| {
        store.item_count(*right).cmp(&store.item_count(*left))
    });

    let size = selection.ids.len();
    let mut weights = vec![vec![0.0; size]; size];
    for transaction in store.transactions() {
        let members: Vec<usize> =
            transaction.items().iter().filter_map(|id| selection.position[id.index()]).collect();
        for (offset, &row) in members.iter().enumerate() {
            for &column in &members[offset + 1..] {
                weights[row][column] += 1.0;
                weights[column][row] += 1.0;
            }
        }
    }

    selection.into_matrix(vocabulary, weights)
}

struct Selection {
    ids: Vec<ItemId>,
    position: Vec<Option<usize>>,
    truncated: bool,
}

impl Selection {
    fn into_matrix(self, vocabulary: &Vocabulary, weights: Vec<Vec<f64>>) -> CoOccurrenceMatrix {
        CoOccurrenceMatrix {
            items: self.ids.iter().map(|id| vocabulary.name(*id).to_string()).collect(),
            weights,
            truncated: self.truncated,
        }
    }
}

fn select_items<F>(vocabulary: &Vocabulary, max_items: usize, by_score: F) -> Selection
where
    F: Fn(&ItemId, &ItemId) -> Ordering,
{
    let mut ids: Vec<ItemId> = vocabulary.ids().collect();
    ids.sort_by(|left, right| {
        by_score(left, right)
            .then_with(|| vocabulary.key(*left).cmp(vocabulary.key(*right)))
            .then_with(|| vocabulary.name(*left).cmp(vocabulary.name(*right)))
    });

    let truncated = ids.len() > max_items;
    ids.truncate(max_items);

    let mut position = vec![None; vocabulary.len()];
    for (index, id) in ids.iter().enumerate() {
        position[id.index()] = Some(index);
    }

    Selection { ids, position, truncated }
}

#[cfg(test)]
mod tests {
    use super::{build_matrix, build_pair_count_matrix, MatrixOptions, MatrixWeighting};
    use crate::miner::mine;
    use crate::store::TransactionStore;

    fn scenario_store() -> TransactionStore {
        TransactionStore::from_baskets(vec![
            vec!["A", "B"],
            vec!["A", "B", "C"],
            vec!["A"],
            vec!["B", "C"],
        ])
        .expect("scenario store should build")
    }

    #[test]
    fn itemset_weighted_matrix_matches_scenario() {
        let store = scenario_store();
        let frequent = mine(&store, 0.5).expect("mining should succeed");
        let matrix = build_matrix(&frequent, store.vocabulary(), &MatrixOptions::default());

        assert_eq!(matrix.items(), ["A", "B", "C"]);
        assert_eq!(matrix.weight_between("a", "a"), Some(0.75));
        assert_eq!(matrix.weight_between("A", "B"), Some(0.5));
        assert_eq!(matrix.weight_between("B", "C"), Some(0.5));
        // {A,C} is not frequent, so it contributes nothing.
        assert_eq!(matrix.weight_between("A", "C"), Some(0.0));
        assert!(!matrix.truncated());
    }

    #[test]
    fn matrix_is_symmetric() {
        let store = TransactionStore::from_baskets(vec![
            vec!["bread", "milk", "eggs"],
            vec!["bread", "butter", "cheese"],
            vec!["milk", "eggs", "yogurt"],
            vec!["bread", "cheese", "butter"],
            vec!["bread", "milk", "butter"],
        ])
        .expect("store should build");
        let frequent = mine(&store, 0.2).expect("mining should succeed");
        let matrix = build_matrix(&frequent, store.vocabulary(), &MatrixOptions::default());

        for row in 0..matrix.len() {
            for column in 0..matrix.len() {
                assert_eq!(matrix.weight(row, column), matrix.weight(column, row));
            }
        }
    }

    #[test]
    fn infrequent_items_stay_in_matrix_with_zero_weight() {
        let store = TransactionStore::from_baskets(vec![vec!["a", "b"], vec!["a", "b"], vec!["z"]])
            .expect("store should build");
        let frequent = mine(&store, 0.5).expect("mining should succeed");
        let matrix = build_matrix(&frequent, store.vocabulary(), &MatrixOptions::default());

        assert_eq!(matrix.items(), ["a", "b", "z"]);
        assert_eq!(matrix.weight_between("z", "z"), Some(0.0));
    }

    #[test]
    fn cap_keeps_best_supported_items_with_lexicographic_ties() {
        let store = TransactionStore::from_baskets(vec![
            vec!["pear", "fig", "kiwi"],
            vec!["pear", "fig"],
            vec!["kiwi", "apple"],
            vec!["pear"],
        ])
        .expect("store should build");
        let frequent = mine(&store, 0.25).expect("mining should succeed");
        let options = MatrixOptions { max_items: 3, weighting: MatrixWeighting::ItemsetSupport };
        let matrix = build_matrix(&frequent, store.vocabulary(), &options);

        // pear 0.75, then fig and kiwi tie at 0.5 and sort by name.
        assert_eq!(matrix.items(), ["pear", "fig", "kiwi"]);
        assert!(matrix.truncated());
        assert_eq!(matrix.weight_between("apple", "kiwi"), None);
    }

    #[test]
    fn pair_count_matrix_counts_transactions_with_zero_diagonal() {
        let store = scenario_store();
        let matrix = build_pair_count_matrix(&store, &MatrixOptions::default());

        assert_eq!(matrix.items(), ["A", "B", "C"]);
        assert_eq!(matrix.weight_between("A", "A"), Some(0.0));
        assert_eq!(matrix.weight_between("A", "B"), Some(2.0));
        assert_eq!(matrix.weight_between("A", "C"), Some(1.0));
        assert_eq!(matrix.weight_between("C", "B"), Some(2.0));
    }

    #[test]
    fn weighting_parses_from_config_strings() {
        assert_eq!("pair_count".parse::<MatrixWeighting>(), Ok(MatrixWeighting::PairCount));
        let parsed = " Itemset_Support ".parse::<MatrixWeighting>();
        assert_eq!(parsed, Ok(MatrixWeighting::ItemsetSupport));
        assert_eq!(MatrixWeighting::PairCount.as_str(), "pair_count");
        assert!("heat".parse::<MatrixWeighting>().is_err());
    }
}
