use basketry_core::{
    find_sample, Analyzer, DatasetProfile, MiningError, MiningParams, TransactionRecord,
    TransactionStore,
};

fn scenario() -> Vec<Vec<&'static str>> {
    vec![vec!["A", "B"], vec!["A", "B", "C"], vec!["A"], vec!["B", "C"]]
}

fn close(left: f64, right: f64) -> bool {
    (left - right).abs() < 1e-9
}

#[test]
fn four_basket_scenario_end_to_end() {
    let result = Analyzer::default().run_baskets(scenario(), 0.5, 0.6).expect("run succeeds");

    let itemsets: Vec<(String, f64)> = result
        .itemsets()
        .iter()
        .map(|view| (view.itemset.join(","), view.support))
        .collect();
    assert_eq!(
        itemsets,
        vec![
            ("A".to_string(), 0.75),
            ("B".to_string(), 0.75),
            ("C".to_string(), 0.5),
            ("A,B".to_string(), 0.5),
            ("B,C".to_string(), 0.5),
        ]
    );

    let a_to_b = result
        .rules()
        .iter()
        .find(|rule| rule.antecedent == ["A"] && rule.consequent == ["B"])
        .expect("A -> B is kept");
    let b_to_a = result
        .rules()
        .iter()
        .find(|rule| rule.antecedent == ["B"] && rule.consequent == ["A"])
        .expect("B -> A is kept");
    for rule in [a_to_b, b_to_a] {
        assert!(close(rule.confidence, 2.0 / 3.0));
        assert!(close(rule.lift, 8.0 / 9.0));
        assert_eq!(rule.transaction_count, 2);
    }

    let matrix = result.matrix();
    assert_eq!(matrix.weight_between("A", "B"), Some(0.5));
    assert_eq!(matrix.weight_between("C", "C"), Some(0.5));
}

#[test]
fn mixed_case_tokens_share_one_item() {
    let baskets = vec![vec![" Milk", "bread"], vec!["milk ", "BREAD"], vec!["MILK"]];
    let result = Analyzer::default().run_baskets(baskets, 0.5, 0.5).expect("run succeeds");

    assert_eq!(result.vocabulary_size(), 2);
    assert_eq!(result.itemsets()[0].itemset, vec!["Milk"]);
    assert_eq!(result.itemsets()[0].transaction_count, 3);
}

#[test]
fn long_format_records_merge_by_transaction_key() {
    let store = TransactionStore::from_records(vec![
        TransactionRecord::keyed("t1", ["bread"]),
        TransactionRecord::keyed("t2", ["milk"]),
        TransactionRecord::keyed("t1", ["butter"]),
    ])
    .expect("store builds");

    assert_eq!(store.len(), 2);
    assert_eq!(store.transactions()[0].len(), 2);
}

#[test]
fn invalid_requests_are_rejected_before_mining() {
    let empty: Vec<Vec<&str>> = Vec::new();
    assert!(matches!(
        Analyzer::default().run_baskets(empty, 0.5, 0.5),
        Err(MiningError::InvalidInput(_))
    ));
    assert!(matches!(MiningParams::new(0.0, 0.5), Err(MiningError::InvalidParameter(_))));
    assert!(matches!(
        Analyzer::default().run_baskets(vec![vec!["  "], vec![""]], 0.5, 0.5),
        Err(MiningError::InvalidInput(_))
    ));
}

#[test]
fn strict_support_gives_empty_but_valid_result() {
    let result = Analyzer::default()
        .run_baskets(vec![vec!["a"], vec!["b"], vec!["c"], vec!["d"]], 0.5, 0.5)
        .expect("run succeeds");

    assert!(result.itemsets().is_empty());
    assert!(result.rules().is_empty());
    assert_eq!(result.matrix().len(), 4);
    assert!(result.insights().is_empty());
}

#[test]
fn electronics_sample_profile_and_mining_agree() {
    let sample = find_sample("electronics").expect("electronics sample exists");
    let store = sample.store().expect("store builds");
    let profile = DatasetProfile::from_store(&store);

    assert_eq!(profile.transaction_count, 8);
    assert_eq!(profile.item_count, 9);
    assert_eq!(profile.avg_items_per_transaction, 3.0);

    let params = MiningParams::new(profile.support_suggestions.moderate, 0.5).expect("valid");
    let result = Analyzer::default().run(&store, params).expect("run succeeds");
    assert!(result
        .itemsets()
        .iter()
        .all(|view| view.support + 1e-9 >= profile.support_suggestions.moderate));
}
