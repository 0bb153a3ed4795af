use basketry_core::analysis::{Analyzer, MiningParams, MiningResult, RuleView};
use basketry_core::config::{AppConfig, LoadOptions};
use basketry_core::errors::ApplicationError;
use basketry_core::store::TransactionStore;
use clap::{Args, ValueEnum};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::commands::{to_data, CommandResult};
use crate::dataset::{self, DatasetArgs};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum View {
    #[default]
    All,
    Itemsets,
    Rules,
    Matrix,
    Insights,
    Meta,
}

#[derive(Clone, Debug, Args)]
pub struct MineArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[arg(long, value_name = "FRACTION", help = "Minimum itemset support in (0,1]")]
    pub min_support: Option<f64>,
    #[arg(long, value_name = "FRACTION", help = "Minimum rule confidence in (0,1]")]
    pub min_confidence: Option<f64>,
    #[arg(
        long,
        value_enum,
        default_value_t = View::All,
        help = "Which part of the result to print"
    )]
    pub view: View,
    #[arg(long, help = "List the transactions backing each rule")]
    pub supporting_transactions: bool,
}

#[derive(Debug, Serialize)]
struct RuleOutput<'a> {
    #[serde(flatten)]
    rule: &'a RuleView,
    #[serde(skip_serializing_if = "Option::is_none")]
    supporting_transactions: Option<Vec<usize>>,
}

pub fn run(args: &MineArgs, options: LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return CommandResult::from_error("mine", &error.into()),
    };

    let (store, result) = match execute(&config, args) {
        Ok(outcome) => outcome,
        Err(error) => return CommandResult::from_error("mine", &error),
    };

    let data = match render(&store, &result, args) {
        Ok(data) => data,
        Err(failure) => return failure,
    };
    CommandResult::success(
        "mine",
        format!(
            "mined {} itemsets and {} rules from {} transactions",
            result.itemsets().len(),
            result.rules().len(),
            result.transaction_count()
        ),
        data,
    )
}

/// Flag thresholds win over configured ones and are validated before the
/// dataset is read.
fn execute(
    config: &AppConfig,
    args: &MineArgs,
) -> Result<(TransactionStore, MiningResult), ApplicationError> {
    let params = MiningParams::new(
        args.min_support.unwrap_or(config.mining.min_support),
        args.min_confidence.unwrap_or(config.mining.min_confidence),
    )?;
    let store = dataset::load(&args.dataset)?;
    info!(
        event_name = "cli.mine.dataset_loaded",
        transactions = store.len(),
        items = store.vocabulary().len(),
        "dataset loaded"
    );
    let result = Analyzer::from_config(config).run(&store, params)?;
    Ok((store, result))
}

fn render(
    store: &TransactionStore,
    result: &MiningResult,
    args: &MineArgs,
) -> Result<Value, CommandResult> {
    let rules: Vec<RuleOutput<'_>> = result
        .rules()
        .iter()
        .map(|rule| RuleOutput {
            rule,
            supporting_transactions: args
                .supporting_transactions
                .then(|| rule.supporting_transactions(store)),
        })
        .collect();

    let data = match args.view {
        View::All => json!({
            "meta": to_data("mine", result.meta())?,
            "itemsets": to_data("mine", &result.itemsets())?,
            "rules": to_data("mine", &rules)?,
            "matrix": to_data("mine", result.matrix())?,
            "insights": result.insights(),
        }),
        View::Itemsets => json!({ "itemsets": to_data("mine", &result.itemsets())? }),
        View::Rules => json!({ "rules": to_data("mine", &rules)? }),
        View::Matrix => json!({ "matrix": to_data("mine", result.matrix())? }),
        View::Insights => json!({ "insights": result.insights() }),
        View::Meta => json!({ "meta": to_data("mine", result.meta())? }),
    };
    Ok(data)
}
