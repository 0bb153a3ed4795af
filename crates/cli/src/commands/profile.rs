use basketry_core::config::{AppConfig, LoadOptions};
use basketry_core::profile::DatasetProfile;
use clap::Args;
use serde_json::{json, Value};

use crate::commands::{to_data, CommandResult};
use crate::dataset::{self, DatasetArgs};

#[derive(Clone, Debug, Args)]
pub struct ProfileArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
}

pub fn run(args: &ProfileArgs, options: LoadOptions) -> CommandResult {
    if let Err(error) = AppConfig::load(options) {
        return CommandResult::from_error("profile", &error.into());
    }

    let store = match dataset::load(&args.dataset) {
        Ok(store) => store,
        Err(error) => return CommandResult::from_error("profile", &error),
    };
    let profile = DatasetProfile::from_store(&store);

    let suggestions: Vec<Value> = profile
        .support_suggestions
        .described()
        .into_iter()
        .map(|(name, value, description)| {
            json!({ "name": name, "value": value, "description": description })
        })
        .collect();
    let data = match to_data("profile", &profile) {
        Ok(mut data) => {
            data["suggestion_details"] = Value::Array(suggestions);
            data
        }
        Err(failure) => return failure,
    };

    CommandResult::success(
        "profile",
        format!(
            "{} transactions over {} items; suggested min_support {:.3} (moderate)",
            profile.transaction_count, profile.item_count, profile.support_suggestions.moderate
        ),
        data,
    )
}
