pub mod commands;
pub mod dataset;

use std::path::PathBuf;
use std::process::ExitCode;

use basketry_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};
use clap::{Parser, Subcommand};
use tracing::{info, info_span, Level};
use uuid::Uuid;

use crate::commands::mine::MineArgs;
use crate::commands::profile::ProfileArgs;

#[derive(Debug, Parser)]
#[command(
    name = "basketry",
    about = "Basketry market-basket mining CLI",
    long_about = "Mine frequent itemsets and association rules from transaction data, profile datasets, and inspect configuration.",
    after_help = "Examples:\n  basketry mine --sample groceries\n  basketry mine --input baskets.csv --min-support 0.2 --view rules\n  basketry profile --input baskets.csv\n  basketry config"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Read configuration from this TOML file"
    )]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_name = "LEVEL", help = "Override logging.level")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Mine itemsets, rules, co-occurrence matrix and insights from a dataset")]
    Mine(MineArgs),
    #[command(about = "Describe a dataset and suggest support thresholds")]
    Profile(ProfileArgs),
    #[command(about = "List the built-in sample datasets")]
    Samples,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: false,
            overrides: ConfigOverrides { log_level: self.log_level.clone(), log_format: None },
        }
    }

    fn command_name(&self) -> &'static str {
        match self.command {
            Command::Mine(_) => "mine",
            Command::Profile(_) => "profile",
            Command::Samples => "samples",
            Command::Config => "config",
        }
    }
}

/// Install the stderr subscriber. Later calls are no-ops.
pub fn init_logging(config: &AppConfig) {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let load_options = cli.load_options();

    // Invalid configuration is reported by the command itself.
    if let Ok(config) = AppConfig::load(load_options.clone()) {
        init_logging(&config);
    }

    let correlation_id = Uuid::new_v4();
    let command = cli.command_name();
    let span = info_span!("basketry", %correlation_id, command);
    let _entered = span.enter();

    let result = match &cli.command {
        Command::Mine(args) => commands::mine::run(args, load_options),
        Command::Profile(args) => commands::profile::run(args, load_options),
        Command::Samples => commands::samples::run(),
        Command::Config => commands::config::run(load_options),
    };

    info!(
        event_name = "cli.command.completed",
        correlation_id = %correlation_id,
        command,
        exit_code = result.exit_code,
        "command completed"
    );
    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
