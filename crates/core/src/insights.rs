//! Plain-language highlights of a mining run.

use crate::analysis::{MiningResult, RuleView};

pub const DEFAULT_MAX_INSIGHTS: usize = 5;
pub const DEFAULT_HIGH_CONFIDENCE: f64 = 0.8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InsightOptions {
    pub max_insights: usize,
    /// Rules strictly above this confidence are called out.
    pub high_confidence: f64,
}

impl Default for InsightOptions {
    fn default() -> Self {
        Self { max_insights: DEFAULT_MAX_INSIGHTS, high_confidence: DEFAULT_HIGH_CONFIDENCE }
    }
}

/// Derive at most `options.max_insights` sentences from `result`. A run with
/// no frequent itemsets has nothing to say and yields an empty list.
pub fn summarize(result: &MiningResult, options: &InsightOptions) -> Vec<String> {
    let itemsets = result.itemsets();
    let Some(top) = itemsets.first() else {
        return Vec::new();
    };
    let rules = result.rules();
    let meta = result.meta();

    let mut insights = vec![format!(
        "{} transactions over {} distinct items produced {} frequent itemsets and {} association rules.",
        meta.transaction_count,
        meta.vocabulary_size,
        itemsets.len(),
        rules.len()
    )];

    insights.push(format!(
        "Most frequent itemset: {} appears in {} of transactions.",
        quote_items(&top.itemset),
        percent(top.support)
    ));
    if top.itemset.len() == 1 {
        if let Some(combination) = itemsets.iter().find(|itemset| itemset.itemset.len() > 1) {
            insights.push(format!(
                "Top combination: {} are bought together in {} of transactions.",
                quote_items(&combination.itemset),
                percent(combination.support)
            ));
        }
    }

    if let Some(strongest) = rules.first() {
        insights.push(format!(
            "Strongest association: when customers buy {}, they also buy {} {} of the time (lift {:.2}).",
            quote_items(&strongest.antecedent),
            quote_items(&strongest.consequent),
            percent(strongest.confidence),
            strongest.lift
        ));
    } else {
        insights.push(format!(
            "No rules reached the {} confidence threshold; lowering it may surface weaker associations.",
            percent(meta.min_confidence)
        ));
    }

    let confident: Vec<&RuleView> =
        rules.iter().filter(|rule| rule.confidence > options.high_confidence).collect();
    if let Some(best) = most_confident(&confident) {
        insights.push(format!(
            "{} {} {} confidence; the most reliable is {} -> {} at {}.",
            confident.len(),
            if confident.len() == 1 { "rule exceeds" } else { "rules exceed" },
            percent(options.high_confidence),
            quote_items(&best.antecedent),
            quote_items(&best.consequent),
            percent(best.confidence)
        ));
    }

    insights.truncate(options.max_insights);
    insights
}

/// First rule with the highest confidence, keeping the lift ordering on ties.
fn most_confident<'a>(rules: &[&'a RuleView]) -> Option<&'a RuleView> {
    rules.iter().copied().fold(None::<&'a RuleView>, |best, rule| match best {
        Some(current) if current.confidence >= rule.confidence => Some(current),
        _ => Some(rule),
    })
}

fn quote_items(items: &[String]) -> String {
    items.iter().map(|item| format!("'{item}'")).collect::<Vec<_>>().join(" + ")
}

fn percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}
