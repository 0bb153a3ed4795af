//! Association rule generation
//!
//! Every frequent itemset of size k >= 2 is split into antecedent and
//! consequent by walking the bitmasks `1..2^k - 1`; no recursion is involved.
//! Confidence and lift come from the counts already held by
//! [`FrequentItemsets`], so transactions are never rescanned here.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::errors::MiningError;
use crate::item::{ItemId, Vocabulary};
use crate::miner::{FrequentItemsets, Itemset, DEFAULT_PARALLEL_THRESHOLD, SUPPORT_EPSILON};
use crate::store::TransactionStore;

/// Widest itemset whose partitions fit a `u64` mask.
pub const MAX_RULE_ITEMSET_LEN: usize = 63;

#[derive(Clone, Debug, PartialEq)]
pub struct AssociationRule {
    antecedent: Vec<ItemId>,
    consequent: Vec<ItemId>,
    support: f64,
    confidence: f64,
    lift: f64,
    transaction_count: usize,
}

impl AssociationRule {
    pub fn antecedent(&self) -> &[ItemId] {
        &self.antecedent
    }

    pub fn consequent(&self) -> &[ItemId] {
        &self.consequent
    }

    /// Support of antecedent ∪ consequent
    pub fn support(&self) -> f64 {
        self.support
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn lift(&self) -> f64 {
        self.lift
    }

    /// Transactions containing antecedent ∪ consequent
    pub fn transaction_count(&self) -> usize {
        self.transaction_count
    }

    /// Antecedent and consequent together, sorted by id.
    pub fn items(&self) -> Vec<ItemId> {
        let mut items = self.antecedent.clone();
        items.extend_from_slice(&self.consequent);
        items.sort_unstable();
        items
    }
}

#[derive(Clone, Debug)]
pub struct RuleGenerator {
    parallel_threshold: usize,
}

impl Default for RuleGenerator {
    fn default() -> Self {
        Self { parallel_threshold: DEFAULT_PARALLEL_THRESHOLD }
    }
}

impl RuleGenerator {
    pub fn with_parallel_threshold(parallel_threshold: usize) -> Self {
        Self { parallel_threshold: parallel_threshold.max(1) }
    }

    pub fn generate(
        &self,
        frequent: &FrequentItemsets,
        store: &TransactionStore,
        min_confidence: f64,
    ) -> Result<Vec<AssociationRule>, MiningError> {
        validate_min_confidence(min_confidence)?;

        let transaction_count = store.len();
        let expandable: Vec<&Itemset> =
            frequent.iter().filter(|itemset| itemset.len() >= 2).collect();
        let expand_one =
            |itemset: &&Itemset| expand(itemset, frequent, transaction_count, min_confidence);

        let mut rules: Vec<AssociationRule> = if expandable.len() >= self.parallel_threshold {
            expandable.par_iter().flat_map_iter(expand_one).collect()
        } else {
            expandable.iter().flat_map(expand_one).collect()
        };

        sort_rules(&mut rules, store.vocabulary());

        info!(
            event_name = "mining.rules.completed",
            itemsets_expanded = expandable.len(),
            min_confidence,
            rules = rules.len(),
            "association rule generation completed"
        );
        Ok(rules)
    }
}

/// Generate rules with the default parallelism settings.
pub fn generate(
    frequent: &FrequentItemsets,
    store: &TransactionStore,
    min_confidence: f64,
) -> Result<Vec<AssociationRule>, MiningError> {
    RuleGenerator::default().generate(frequent, store, min_confidence)
}

pub fn validate_min_confidence(min_confidence: f64) -> Result<(), MiningError> {
    if min_confidence > 0.0 && min_confidence <= 1.0 {
        return Ok(());
    }
    Err(MiningError::InvalidParameter(format!(
        "min_confidence must be in (0,1], got {min_confidence}"
    )))
}

fn expand(
    itemset: &Itemset,
    frequent: &FrequentItemsets,
    transaction_count: usize,
    min_confidence: f64,
) -> Vec<AssociationRule> {
    let width = itemset.len();
    if width > MAX_RULE_ITEMSET_LEN {
        warn!(
            event_name = "mining.rules.itemset_skipped",
            width,
            "itemset too wide for rule enumeration"
        );
        return Vec::new();
    }

    let items = itemset.items();
    let full_mask: u64 = (1u64 << width) - 1;
    let mut rules = Vec::new();

    for mask in 1..full_mask {
        let mut antecedent = Vec::with_capacity(width);
        let mut consequent = Vec::with_capacity(width);
        for (position, item) in items.iter().enumerate() {
            if mask & (1u64 << position) != 0 {
                antecedent.push(*item);
            } else {
                consequent.push(*item);
            }
        }

        // Subsets of a frequent itemset are frequent, so both lookups hit.
        let (Some(antecedent_count), Some(consequent_count)) =
            (frequent.count_of(&antecedent), frequent.count_of(&consequent))
        else {
            continue;
        };

        let confidence = itemset.count() as f64 / antecedent_count as f64;
        if confidence < min_confidence - SUPPORT_EPSILON {
            continue;
        }
        let lift = (itemset.count() as f64 * transaction_count as f64)
            / (antecedent_count as f64 * consequent_count as f64);

        rules.push(AssociationRule {
            antecedent,
            consequent,
            support: itemset.support(),
            confidence,
            lift,
            transaction_count: (itemset.support() * transaction_count as f64).round() as usize,
        });
    }

    rules
}

fn sort_rules(rules: &mut [AssociationRule], vocabulary: &Vocabulary) {
    rules.sort_by(|left, right| {
        right
            .lift
            .total_cmp(&left.lift)
            .then_with(|| right.confidence.total_cmp(&left.confidence))
            .then_with(|| right.support.total_cmp(&left.support))
            .then_with(|| {
                vocabulary.sorted_keys(&left.antecedent).cmp(&vocabulary.sorted_keys(&right.antecedent))
            })
            .then_with(|| {
                vocabulary.sorted_keys(&left.consequent).cmp(&vocabulary.sorted_keys(&right.consequent))
            })
    });
}

#[cfg(test)]
mod tests {
    use super::{generate, AssociationRule, RuleGenerator};
    use crate::errors::MiningError;
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

    fn render(store: &TransactionStore, rule: &AssociationRule) -> String {
        let vocabulary = store.vocabulary();
        format!(
            "{} -> {}",
            vocabulary.sorted_names(rule.antecedent()).join("+"),
            vocabulary.sorted_names(rule.consequent()).join("+")
        )
    }

    #[test]
    fn scenario_rules_are_ordered_by_lift_then_confidence() {
        let store = scenario_store();
        let frequent = mine(&store, 0.5).expect("mining should succeed");
        let rules = generate(&frequent, &store, 0.6).expect("rules should generate");

        let rendered: Vec<String> = rules.iter().map(|rule| render(&store, rule)).collect();
        assert_eq!(rendered, vec!["C -> B", "B -> C", "A -> B", "B -> A"]);

        let a_to_b = &rules[2];
        assert!((a_to_b.confidence() - 2.0 / 3.0).abs() < 1e-12);
        assert!((a_to_b.lift() - 8.0 / 9.0).abs() < 1e-12);
        assert_eq!(a_to_b.support(), 0.5);
        assert_eq!(a_to_b.transaction_count(), 2);
        assert_eq!(rules[2].lift(), rules[3].lift());
    }

    #[test]
    fn full_confidence_keeps_only_rules_without_counterexamples() {
        let store = scenario_store();
        let frequent = mine(&store, 0.5).expect("mining should succeed");
        let rules = generate(&frequent, &store, 1.0).expect("rules should generate");

        let rendered: Vec<String> = rules.iter().map(|rule| render(&store, rule)).collect();
        assert_eq!(rendered, vec!["C -> B"]);
        for rule in &rules {
            let antecedent_rows = store.containing(rule.antecedent());
            let rule_rows = store.containing(&rule.items());
            assert_eq!(antecedent_rows, rule_rows);
        }
    }

    #[test]
    fn three_item_itemset_yields_six_partitions() {
        let store = TransactionStore::from_baskets(vec![vec!["x", "y", "z"]; 3])
            .expect("store should build");
        let frequent = mine(&store, 1.0).expect("mining should succeed");
        let rules = generate(&frequent, &store, 1.0).expect("rules should generate");

        // 3 pairs * 2 + 1 triple * 6
        assert_eq!(rules.len(), 12);
        assert!(rules.iter().all(|rule| (rule.lift() - 1.0).abs() < 1e-12));
        for rule in &rules {
            assert!(!rule.antecedent().is_empty());
            assert!(!rule.consequent().is_empty());
            assert!(rule.antecedent().iter().all(|item| !rule.consequent().contains(item)));
        }
    }

    #[test]
    fn confidence_out_of_range_is_rejected() {
        let store = scenario_store();
        let frequent = mine(&store, 0.5).expect("mining should succeed");

        for bad in [0.0, 1.01, -1.0, f64::NAN] {
            let error = generate(&frequent, &store, bad).expect_err("threshold must fail");
            assert!(matches!(error, MiningError::InvalidParameter(ref message)
                if message.starts_with("min_confidence must be in (0,1]")));
        }
    }

    #[test]
    fn parallel_expansion_matches_sequential_expansion() {
        let baskets: Vec<Vec<String>> = (0..30)
            .map(|row| {
                (0..6).filter(|item| (row * 7 + item) % 4 != 0).map(|i| format!("p{i}")).collect()
            })
            .collect();
        let store = TransactionStore::from_baskets(baskets).expect("store should build");
        let frequent = mine(&store, 0.3).expect("mining should succeed");

        let sequential =
            RuleGenerator::with_parallel_threshold(usize::MAX).generate(&frequent, &store, 0.5);
        let parallel = RuleGenerator::with_parallel_threshold(1).generate(&frequent, &store, 0.5);

        assert_eq!(sequential.expect("sequential"), parallel.expect("parallel"));
    }
}
