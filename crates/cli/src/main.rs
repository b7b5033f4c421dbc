//! branchmerge command-line tool.
//!
//! Compares the schema of two stack branches (content types and global
//! fields) and walks the operator through merging them. Also generates and
//! validates configuration files.

mod commands;
mod print;
mod prompt;
mod signals;
mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use branchmerge_core::api::CmsClient;
use branchmerge_core::config::AppConfig;
use branchmerge_core::merge::{ExecutionOption, MergeSeed, MergeStrategy, StrategySubOption};
use branchmerge_core::models::DiffModule;

use commands::diff::DiffFormat;

const DEFAULT_CONFIG_PATH: &str = "~/.config/branchmerge/config.toml";

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// branchmerge command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "branchmerge",
    version,
    about = "Compare and merge the schema of two stack branches"
)]
struct Cli {
    /// Path to the TOML configuration file [default: ~/.config/branchmerge/config.toml].
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Stack API key; overrides the environment variable named in the config.
    #[arg(long, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the differences between two branches.
    Diff(DiffArgs),

    /// Merge the compare branch into the base branch.
    Merge(MergeArgs),

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./branchmerge.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,
}

#[derive(Args, Debug)]
struct DiffArgs {
    /// Branch the comparison is made against.
    #[arg(long)]
    base_branch: String,

    /// Branch compared with the base branch.
    #[arg(long)]
    compare_branch: String,

    /// Which part of the schema to compare: content_types, global_fields or all.
    #[arg(long, default_value = "all", value_parser = parse_module)]
    module: DiffModule,

    /// Output format.
    #[arg(long, value_enum, default_value = "compact")]
    format: DiffFormat,
}

#[derive(Args, Debug)]
struct MergeArgs {
    /// Branch receiving the merge.
    #[arg(long, required_unless_present = "use_merge_summary")]
    base_branch: Option<String>,

    /// Branch whose changes are merged.
    #[arg(long, required_unless_present = "use_merge_summary")]
    compare_branch: Option<String>,

    /// merge_prefer_base, merge_prefer_compare, overwrite_with_compare or custom_preferences.
    #[arg(long, value_parser = parse_strategy)]
    strategy: Option<MergeStrategy>,

    /// new, modified or both (prefer strategies only).
    #[arg(long, value_parser = parse_sub_option)]
    strategy_sub_option: Option<StrategySubOption>,

    /// Comment recorded with the merge.
    #[arg(long)]
    comment: Option<String>,

    /// Do not create a revert branch.
    #[arg(long)]
    no_revert: bool,

    /// Directory the merge summary is exported to.
    #[arg(long, default_value = ".")]
    export_summary_path: PathBuf,

    /// Execute a previously exported merge summary.
    #[arg(long, conflicts_with_all = ["strategy", "strategy_sub_option"])]
    use_merge_summary: Option<PathBuf>,

    /// export, execute or both; skips the final question.
    #[arg(long, value_parser = parse_execution)]
    execute: Option<ExecutionOption>,
}

fn parse_module(s: &str) -> Result<DiffModule, String> {
    s.parse().map_err(|e: branchmerge_core::errors::DiffError| e.to_string())
}

fn parse_strategy(s: &str) -> Result<MergeStrategy, String> {
    s.parse().map_err(|e: branchmerge_core::errors::MergeError| e.to_string())
}

fn parse_sub_option(s: &str) -> Result<StrategySubOption, String> {
    s.parse().map_err(|e: branchmerge_core::errors::MergeError| e.to_string())
}

fn parse_execution(s: &str) -> Result<ExecutionOption, String> {
    s.parse()
        .map_err(|_| format!("invalid execution option '{}': expected export, execute or both", s))
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = expand_tilde(cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH));

    match cli.command {
        Commands::Init { output } => {
            init_logging("warn");
            cmd_init(&output)
        }
        Commands::Validate => {
            init_logging("warn");
            cmd_validate(&config_path)
        }
        Commands::Diff(args) => {
            let config = load_config(&config_path, cli.config.is_some(), cli.api_key)?;
            init_logging(&config.logging.log_level);
            let client = build_client(&config)?;
            commands::diff::run_diff(
                &config,
                &client,
                &args.base_branch,
                &args.compare_branch,
                args.module,
                args.format,
            )
            .await
        }
        Commands::Merge(args) => {
            let config = load_config(&config_path, cli.config.is_some(), cli.api_key)?;
            init_logging(&config.logging.log_level);
            let client = build_client(&config)?;

            if let Some(summary_path) = &args.use_merge_summary {
                return commands::merge::run_from_summary(&config, &client, summary_path).await;
            }

            let seed = MergeSeed {
                base_branch: args.base_branch.unwrap_or_default(),
                compare_branch: args.compare_branch.unwrap_or_default(),
                strategy: args.strategy,
                strategy_sub_option: args.strategy_sub_option,
                merge_comment: args.comment,
                no_revert: args.no_revert,
                execution: args.execute,
            };
            commands::merge::run_merge(&config, &client, seed, &args.export_summary_path).await
        }
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

/// Load the config file. Without an explicit `--config`, a missing default
/// file falls back to built-in defaults.
fn load_config(path: &Path, explicit: bool, api_key: Option<String>) -> Result<AppConfig> {
    let mut config = if explicit || path.exists() {
        AppConfig::load_from_file(path).context("failed to load configuration file")?
    } else {
        AppConfig::default()
    };
    config.resolve_env_vars();
    if let Some(key) = api_key {
        config.api.api_key = Some(key);
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn build_client(config: &AppConfig) -> Result<CmsClient> {
    let (api_key, token) = config
        .require_credentials()
        .context("missing API credentials")?;
    CmsClient::new(&config.api.api_url, api_key, token).context("failed to create API client")
}

/// Expand `~` to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_init(output: &Path) -> Result<()> {
    let default_config = r#"# branchmerge configuration
# See documentation for all available options.

[api]
api_url = "https://api.contentstack.io"
api_key_env = "BRANCHMERGE_API_KEY"
management_token_env = "BRANCHMERGE_MANAGEMENT_TOKEN"

[diff]
page_limit = 100

[merge]
poll_interval_secs = 5
# 0 keeps polling until the merge finishes
max_poll_attempts = 0
log_dir = "./merge-logs"

[logging]
log_level = "warn"
"#;

    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, default_config).context("failed to write config file")?;

    println!("{}", style::success(&format!("Default configuration written to {}", output.display())));
    println!();
    println!("Next steps:");
    println!("  1. Edit the config file with your stack's API URL");
    println!("  2. Set BRANCHMERGE_API_KEY and BRANCHMERGE_MANAGEMENT_TOKEN");
    println!(
        "  3. Validate with: branchmerge validate --config {}",
        output.display()
    );

    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());
    println!();

    let mut config =
        AppConfig::load_from_file(config_path).context("failed to parse configuration")?;
    println!("  [OK] TOML structure is valid");

    config.resolve_env_vars();
    println!("  [OK] Environment variable references processed");

    match config.validate() {
        Ok(()) => {
            println!("  [OK] All required fields are valid");
        }
        Err(e) => {
            println!("  [FAIL] Validation error: {}", e);
            anyhow::bail!("configuration validation failed");
        }
    }

    let set_or_not = |value: &Option<String>| if value.is_some() { "set" } else { "NOT SET" };

    println!();
    println!("Configuration summary:");
    println!("  API URL          : {}", config.api.api_url);
    println!(
        "  API key          : {} ({})",
        set_or_not(&config.api.api_key),
        config.api.api_key_env
    );
    println!(
        "  Management token : {} ({})",
        set_or_not(&config.api.management_token),
        config.api.management_token_env
    );
    println!("  Page limit       : {}", config.diff.page_limit);
    println!("  Poll interval    : {}s", config.merge.poll_interval_secs);
    println!(
        "  Poll attempts    : {}",
        match config.merge.attempt_limit() {
            Some(max) => max.to_string(),
            None => "unbounded".to_string(),
        }
    );
    println!("  Merge log dir    : {}", config.merge.log_dir.display());
    println!();
    println!("Configuration is valid.");

    Ok(())
}
