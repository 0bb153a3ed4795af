//! Built-in demo datasets.

use crate::errors::MiningError;
use crate::store::TransactionStore;

#[derive(Clone, Copy, Debug)]
pub struct SampleDataset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub baskets: &'static [&'static [&'static str]],
}

impl SampleDataset {
    pub fn transaction_count(&self) -> usize {
        self.baskets.len()
    }

    pub fn store(&self) -> Result<TransactionStore, MiningError> {
        TransactionStore::from_baskets(self.baskets.iter().map(|basket| basket.iter().copied()))
    }
}

const GROCERIES: &[&[&str]] = &[
    &["bread", "milk", "eggs"],
    &["bread", "butter", "cheese"],
    &["milk", "eggs", "yogurt"],
    &["bread", "cheese", "butter"],
    &["bread", "milk", "butter"],
    &["eggs", "yogurt", "milk"],
    &["bread", "eggs", "butter"],
    &["milk", "cheese", "yogurt"],
];

const ELECTRONICS: &[&[&str]] = &[
    &["laptop", "mouse", "keyboard"],
    &["smartphone", "case", "charger"],
    &["laptop", "charger", "headphones"],
    &["tablet", "case", "stylus"],
    &["smartphone", "headphones", "charger"],
    &["laptop", "keyboard", "mouse"],
    &["tablet", "keyboard", "stylus"],
    &["smartphone", "case", "headphones"],
];

const OFFICE: &[&[&str]] = &[
    &["paper", "pens", "stapler"],
    &["notebook", "pens", "highlighter"],
    &["paper", "stapler", "clips"],
    &["pens", "highlighter", "ruler"],
    &["notebook", "paper", "pens"],
    &["stapler", "clips", "tape"],
    &["pens", "ruler", "highlighter"],
    &["paper", "clips", "tape"],
];

const SAMPLES: [SampleDataset; 3] = [
    SampleDataset {
        id: "groceries",
        name: "Grocery Store",
        description: "Common grocery store purchases",
        baskets: GROCERIES,
    },
    SampleDataset {
        id: "electronics",
        name: "Electronics Store",
        description: "Electronics store purchases",
        baskets: ELECTRONICS,
    },
    SampleDataset {
        id: "office",
        name: "Office Supplies",
        description: "Office supply store purchases",
        baskets: OFFICE,
    },
];

pub fn sample_datasets() -> &'static [SampleDataset] {
    &SAMPLES
}

pub fn find_sample(id: &str) -> Option<&'static SampleDataset> {
    let wanted = id.trim();
    SAMPLES.iter().find(|sample| sample.id.eq_ignore_ascii_case(wanted))
}

#[cfg(test)]
mod tests {
    use super::{find_sample, sample_datasets};
    use crate::analysis::{Analyzer, MiningParams};

    #[test]
    fn every_sample_has_eight_baskets() {
        let ids: Vec<&str> = sample_datasets().iter().map(|sample| sample.id).collect();
        assert_eq!(ids, vec!["groceries", "electronics", "office"]);
        for sample in sample_datasets() {
            assert_eq!(sample.transaction_count(), 8);
            assert_eq!(sample.store().expect("sample store builds").len(), 8);
        }
    }

    #[test]
    fn lookup_ignores_case_and_rejects_unknown_ids() {
        assert_eq!(find_sample(" Office ").map(|sample| sample.name), Some("Office Supplies"));
        assert!(find_sample("hardware").is_none());
    }

    #[test]
    fn groceries_mine_with_default_thresholds() {
        let sample = find_sample("groceries").expect("groceries sample exists");
        let store = sample.store().expect("sample store builds");
        let params = MiningParams::new(0.1, 0.3).expect("default thresholds are valid");
        let result = Analyzer::default().run(&store, params).expect("mining succeeds");

        assert_eq!(result.vocabulary_size(), 6);
        // bread and milk both appear in five of eight baskets.
        assert_eq!(result.itemsets()[0].itemset, vec!["bread"]);
        assert_eq!(result.itemsets()[0].transaction_count, 5);
        assert_eq!(result.itemsets()[1].itemset, vec!["milk"]);
        assert!(!result.rules().is_empty());
    }
}
