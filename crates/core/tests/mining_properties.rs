use basketry_core::{Analyzer, MiningParams, TransactionStore};
use proptest::prelude::*;

const ALPHABET: [&str; 7] = ["apple", "bread", "cheese", "dates", "eggs", "figs", "grapes"];

fn arb_baskets() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(
        prop::collection::btree_set(0usize..ALPHABET.len(), 1..5).prop_map(|set| {
            set.into_iter().map(|index| ALPHABET[index].to_string()).collect::<Vec<_>>()
        }),
        1..24,
    )
}

fn supports(store: &TransactionStore, items: &[String]) -> f64 {
    let ids = store.resolve(items).unwrap_or_default();
    store.containing(&ids).len() as f64 / store.len() as f64
}

proptest! {
    #[test]
    fn every_subset_of_a_frequent_itemset_is_frequent(
        baskets in arb_baskets(),
        min_support in 0.05f64..0.9,
    ) {
        let result = Analyzer::default().run_baskets(baskets, min_support, 0.5).unwrap();
        let kept: Vec<&Vec<String>> = result.itemsets().iter().map(|view| &view.itemset).collect();

        for view in result.itemsets() {
            prop_assert!(view.support + 1e-9 >= min_support);
            for skip in 0..view.itemset.len() {
                let subset: Vec<String> = view
                    .itemset
                    .iter()
                    .enumerate()
                    .filter(|(index, _)| *index != skip)
                    .map(|(_, item)| item.clone())
                    .collect();
                if !subset.is_empty() {
                    prop_assert!(kept.contains(&&subset), "missing subset {:?}", subset);
                }
            }
        }
    }

    #[test]
    fn supports_are_exact_and_monotone(
        baskets in arb_baskets(),
        min_support in 0.05f64..0.9,
    ) {
        let store = TransactionStore::from_baskets(baskets).unwrap();
        let params = MiningParams::new(min_support, 0.5).unwrap();
        let result = Analyzer::default().run(&store, params).unwrap();

        for view in result.itemsets() {
            prop_assert!((view.support - supports(&store, &view.itemset)).abs() < 1e-12);
            for other in result.itemsets() {
                let superset = view.itemset.iter().all(|item| other.itemset.contains(item));
                if superset {
                    prop_assert!(other.support <= view.support + 1e-12);
                }
            }
        }
    }

    #[test]
    fn rules_are_valid_partitions_with_consistent_metrics(
        baskets in arb_baskets(),
        min_support in 0.05f64..0.6,
        min_confidence in 0.1f64..1.0,
    ) {
        let store = TransactionStore::from_baskets(baskets).unwrap();
        let params = MiningParams::new(min_support, min_confidence).unwrap();
        let result = Analyzer::default().run(&store, params).unwrap();

        for rule in result.rules() {
            prop_assert!(!rule.antecedent.is_empty());
            prop_assert!(!rule.consequent.is_empty());
            prop_assert!(rule.antecedent.iter().all(|item| !rule.consequent.contains(item)));
            prop_assert!(rule.confidence + 1e-9 >= min_confidence);
            prop_assert!(rule.confidence <= 1.0 + 1e-12);

            let mut union = rule.antecedent.clone();
            union.extend(rule.consequent.iter().cloned());
            let support = supports(&store, &union);
            prop_assert!((rule.support - support).abs() < 1e-12);
            let expected_confidence = support / supports(&store, &rule.antecedent);
            prop_assert!((rule.confidence - expected_confidence).abs() < 1e-9);
            let expected_lift = rule.confidence / supports(&store, &rule.consequent);
            prop_assert!((rule.lift - expected_lift).abs() < 1e-9);
            prop_assert_eq!(rule.supporting_transactions(&store).len(), rule.transaction_count);
        }

        for pair in result.rules().windows(2) {
            prop_assert!(pair[0].lift >= pair[1].lift);
        }
    }

    #[test]
    fn matrix_is_symmetric(baskets in arb_baskets(), min_support in 0.05f64..0.9) {
        let result = Analyzer::default().run_baskets(baskets, min_support, 0.5).unwrap();
        let matrix = result.matrix();

        for row in 0..matrix.len() {
            for column in 0..matrix.len() {
                prop_assert_eq!(matrix.weight(row, column), matrix.weight(column, row));
            }
        }
    }

    #[test]
    fn repeated_runs_serialize_identically(baskets in arb_baskets(), min_support in 0.05f64..0.9) {
        let analyzer = Analyzer::default();
        let first = analyzer.run_baskets(baskets.clone(), min_support, 0.4).unwrap();
        let second = analyzer.run_baskets(baskets, min_support, 0.4).unwrap();

        prop_assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }
}
