//! Mining pipeline
//!
//! [`Analyzer::run`] validates the thresholds, mines frequent itemsets,
//! derives rules, builds the co-occurrence matrix and summarises the outcome
//! into one immutable [`MiningResult`]. Each call produces a fresh result; the
//! caller decides what to keep.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::AppConfig;
use crate::errors::MiningError;
use crate::insights::{summarize, InsightOptions};
use crate::matrix::{
    build_matrix, build_pair_count_matrix, CoOccurrenceMatrix, MatrixOptions, MatrixWeighting,
};
use crate::miner::{validate_min_support, LevelStats, Miner, DEFAULT_PARALLEL_THRESHOLD};
use crate::rules::{validate_min_confidence, RuleGenerator};
use crate::store::TransactionStore;

/// Validated pair of thresholds, both in (0, 1]. Deserialization goes
/// through [`MiningParams::new`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMiningParams")]
pub struct MiningParams {
    min_support: f64,
    min_confidence: f64,
}

#[derive(Deserialize)]
struct RawMiningParams {
    min_support: f64,
    min_confidence: f64,
}

impl TryFrom<RawMiningParams> for MiningParams {
    type Error = MiningError;

    fn try_from(raw: RawMiningParams) -> Result<Self, Self::Error> {
        Self::new(raw.min_support, raw.min_confidence)
    }
}

impl MiningParams {
    pub fn new(min_support: f64, min_confidence: f64) -> Result<Self, MiningError> {
        validate_min_support(min_support)?;
        validate_min_confidence(min_confidence)?;
        Ok(Self { min_support, min_confidence })
    }

    pub fn min_support(&self) -> f64 {
        self.min_support
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }
}

/// A frequent itemset with resolved item names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemsetView {
    pub itemset: Vec<String>,
    pub support: f64,
    pub transaction_count: usize,
}

/// An association rule with resolved item names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleView {
    pub antecedent: Vec<String>,
    pub consequent: Vec<String>,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    #[serde(rename = "n_transactions")]
    pub transaction_count: usize,
}

impl RuleView {
    /// Positions of the transactions in `store` that contain every item of the rule.
    pub fn supporting_transactions(&self, store: &TransactionStore) -> Vec<usize> {
        let names: Vec<&str> =
            self.antecedent.iter().chain(&self.consequent).map(String::as_str).collect();
        match store.resolve(&names) {
            Some(items) => store.containing(&items),
            None => Vec::new(),
        }
    }
}

/// Headline numbers of one mining run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MiningMeta {
    pub transaction_count: usize,
    pub vocabulary_size: usize,
    pub min_support: f64,
    pub min_confidence: f64,
    pub itemset_count: usize,
    pub rule_count: usize,
    pub levels: Vec<LevelStats>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MiningResult {
    meta: MiningMeta,
    itemsets: Vec<ItemsetView>,
    rules: Vec<RuleView>,
    matrix: CoOccurrenceMatrix,
    insights: Vec<String>,
}

impl MiningResult {
    pub fn meta(&self) -> &MiningMeta {
        &self.meta
    }

    pub fn transaction_count(&self) -> usize {
        self.meta.transaction_count
    }

    pub fn vocabulary_size(&self) -> usize {
        self.meta.vocabulary_size
    }

    pub fn itemsets(&self) -> &[ItemsetView] {
        &self.itemsets
    }

    pub fn rules(&self) -> &[RuleView] {
        &self.rules
    }

    pub fn matrix(&self) -> &CoOccurrenceMatrix {
        &self.matrix
    }

    pub fn insights(&self) -> &[String] {
        &self.insights
    }
}

#[derive(Clone, Debug)]
pub struct AnalyzerOptions {
    pub parallel_threshold: usize,
    pub matrix: MatrixOptions,
    pub insights: InsightOptions,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            matrix: MatrixOptions::default(),
            insights: InsightOptions::default(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Analyzer {
    options: AnalyzerOptions,
}

impl Analyzer {
    pub fn new(options: AnalyzerOptions) -> Self {
        Self { options }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(AnalyzerOptions {
            parallel_threshold: config.mining.parallel_threshold,
            matrix: MatrixOptions {
                max_items: config.matrix.max_items,
                weighting: config.matrix.weighting,
            },
            insights: InsightOptions {
                max_insights: config.insights.max_insights,
                high_confidence: config.insights.high_confidence,
            },
        })
    }

    pub fn options(&self) -> &AnalyzerOptions {
        &self.options
    }

    pub fn run(
        &self,
        store: &TransactionStore,
        params: MiningParams,
    ) -> Result<MiningResult, MiningError> {
        let miner = Miner::with_parallel_threshold(self.options.parallel_threshold);
        let frequent = miner.mine(store, params.min_support)?;
        let rules = RuleGenerator::with_parallel_threshold(self.options.parallel_threshold)
            .generate(&frequent, store, params.min_confidence)?;

        let matrix = match self.options.matrix.weighting {
            MatrixWeighting::ItemsetSupport => {
                build_matrix(&frequent, store.vocabulary(), &self.options.matrix)
            }
            MatrixWeighting::PairCount => build_pair_count_matrix(store, &self.options.matrix),
        };

        let vocabulary = store.vocabulary();
        let itemsets: Vec<ItemsetView> = frequent
            .iter()
            .map(|itemset| ItemsetView {
                itemset: vocabulary.sorted_names(itemset.items()),
                support: itemset.support(),
                transaction_count: itemset.count(),
            })
            .collect();
        let rules: Vec<RuleView> = rules
            .iter()
            .map(|rule| RuleView {
                antecedent: vocabulary.sorted_names(rule.antecedent()),
                consequent: vocabulary.sorted_names(rule.consequent()),
                support: rule.support(),
                confidence: rule.confidence(),
                lift: rule.lift(),
                transaction_count: rule.transaction_count(),
            })
            .collect();

        let meta = MiningMeta {
            transaction_count: store.len(),
            vocabulary_size: vocabulary.len(),
            min_support: params.min_support,
            min_confidence: params.min_confidence,
            itemset_count: itemsets.len(),
            rule_count: rules.len(),
            levels: frequent.levels().to_vec(),
        };

        let mut result = MiningResult { meta, itemsets, rules, matrix, insights: Vec::new() };
        result.insights = summarize(&result, &self.options.insights);

        info!(
            event_name = "mining.run.completed",
            transactions = result.meta.transaction_count,
            vocabulary = result.meta.vocabulary_size,
            itemsets = result.meta.itemset_count,
            rules = result.meta.rule_count,
            matrix_items = result.matrix.len(),
            "mining run completed"
        );
        Ok(result)
    }

    /// Validate thresholds, ingest raw baskets, then mine. Threshold errors
    /// are reported before the input is looked at.
    pub fn run_baskets<B, I, S>(
        &self,
        baskets: B,
        min_support: f64,
        min_confidence: f64,
    ) -> Result<MiningResult, MiningError>
    where
        B: IntoIterator<Item = I>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let params = MiningParams::new(min_support, min_confidence)?;
        let store = TransactionStore::from_baskets(baskets)?;
        self.run(&store, params)
    }
}

#[cfg(test)]
mod tests {
    use super::{Analyzer, AnalyzerOptions, MiningParams};
    use crate::errors::MiningError;
    use crate::matrix::{MatrixOptions, MatrixWeighting};
    use crate::store::TransactionStore;

    fn scenario() -> Vec<Vec<&'static str>> {
        vec![vec!["A", "B"], vec!["A", "B", "C"], vec!["A"], vec!["B", "C"]]
    }

    #[test]
    fn run_produces_all_four_views() {
        let result = Analyzer::default().run_baskets(scenario(), 0.5, 0.6).expect("run succeeds");

        assert_eq!(result.transaction_count(), 4);
        assert_eq!(result.vocabulary_size(), 3);
        assert_eq!(result.itemsets().len(), 5);
        assert_eq!(result.rules().len(), 4);
        assert_eq!(result.matrix().len(), 3);
        assert!(!result.insights().is_empty());
        assert_eq!(result.meta().rule_count, 4);
        assert_eq!(result.itemsets()[3].itemset, vec!["A", "B"]);
    }

    #[test]
    fn parameter_errors_win_over_input_errors() {
        let empty: Vec<Vec<&str>> = Vec::new();
        let error = Analyzer::default().run_baskets(empty, 0.0, 0.5).expect_err("must fail");

        assert!(matches!(error, MiningError::InvalidParameter(_)));
    }

    #[test]
    fn empty_input_is_invalid_input() {
        let empty: Vec<Vec<&str>> = Vec::new();
        let error = Analyzer::default().run_baskets(empty, 0.5, 0.5).expect_err("must fail");

        assert!(matches!(error, MiningError::InvalidInput(_)));
    }

    #[test]
    fn params_validate_both_thresholds() {
        assert!(MiningParams::new(0.5, 0.5).is_ok());
        assert!(matches!(
            MiningParams::new(1.5, 0.5),
            Err(MiningError::InvalidParameter(ref message)) if message.contains("got 1.5")
        ));
        assert!(matches!(
            MiningParams::new(0.5, 0.0),
            Err(MiningError::InvalidParameter(ref message)) if message.contains("min_confidence")
        ));
    }

    #[test]
    fn deserialized_params_are_validated() {
        let error = serde_json::from_str::<MiningParams>(
            r#"{"min_support":0.5,"min_confidence":7.0}"#,
        )
        .expect_err("confidence above 1 must be rejected");
        assert!(error.to_string().contains("min_confidence must be in (0,1], got 7"));

        let params: MiningParams =
            serde_json::from_str(r#"{"min_support":0.25,"min_confidence":0.5}"#)
                .expect("valid params deserialize");
        assert_eq!(params, MiningParams::new(0.25, 0.5).expect("params"));
        assert_eq!(
            serde_json::to_string(&params).expect("serialize"),
            r#"{"min_support":0.25,"min_confidence":0.5}"#
        );
    }

    #[test]
    fn supporting_transactions_resolve_rule_items() {
        let store = TransactionStore::from_baskets(scenario()).expect("store builds");
        let params = MiningParams::new(0.5, 0.6).expect("params");
        let result = Analyzer::default().run(&store, params).expect("run succeeds");

        let c_to_b = &result.rules()[0];
        assert_eq!(c_to_b.antecedent, vec!["C"]);
        assert_eq!(c_to_b.supporting_transactions(&store), vec![1, 3]);
    }

    #[test]
    fn pair_count_weighting_is_selectable() {
        let analyzer = Analyzer::new(AnalyzerOptions {
            matrix: MatrixOptions { max_items: 2, weighting: MatrixWeighting::PairCount },
            ..AnalyzerOptions::default()
        });
        let result = analyzer.run_baskets(scenario(), 0.5, 0.6).expect("run succeeds");

        assert_eq!(result.matrix().items(), ["A", "B"]);
        assert_eq!(result.matrix().weight_between("A", "B"), Some(2.0));
        assert!(result.matrix().truncated());
    }
}
