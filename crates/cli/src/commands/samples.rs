use basketry_core::samples::sample_datasets;
use serde::Serialize;

use crate::commands::{to_data, CommandResult};

#[derive(Debug, Serialize)]
struct SampleSummary {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    transactions: usize,
}

pub fn run() -> CommandResult {
    let samples: Vec<SampleSummary> = sample_datasets()
        .iter()
        .map(|sample| SampleSummary {
            id: sample.id,
            name: sample.name,
            description: sample.description,
            transactions: sample.transaction_count(),
        })
        .collect();

    match to_data("samples", &samples) {
        Ok(data) => CommandResult::success(
            "samples",
            format!("{} built-in datasets", samples.len()),
            data,
        ),
        Err(failure) => failure,
    }
}
