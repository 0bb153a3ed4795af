pub mod analysis;
pub mod config;
pub mod errors;
pub mod insights;
pub mod item;
pub mod matrix;
pub mod miner;
pub mod profile;
pub mod rules;
pub mod samples;
pub mod store;

pub use analysis::{
    Analyzer, AnalyzerOptions, ItemsetView, MiningMeta, MiningParams, MiningResult, RuleView,
};
pub use errors::{ApplicationError, MiningError};
pub use insights::{summarize, InsightOptions};
pub use item::{ItemId, Vocabulary};
pub use matrix::{
    build_matrix, build_pair_count_matrix, CoOccurrenceMatrix, MatrixOptions, MatrixWeighting,
};
pub use miner::{mine, FrequentItemsets, Itemset, LevelStats, Miner};
pub use profile::{DatasetProfile, ItemFrequency, SupportSuggestions};
pub use rules::{generate, AssociationRule, RuleGenerator};
pub use samples::{find_sample, sample_datasets, SampleDataset};
pub use store::{Transaction, TransactionRecord, TransactionStore};
