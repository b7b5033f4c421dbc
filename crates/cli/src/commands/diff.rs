//! `branchmerge diff`: compare two branches.

use anyhow::{Context, Result};
use clap::ValueEnum;

use branchmerge_core::api::CmsClient;
use branchmerge_core::config::AppConfig;
use branchmerge_core::diff::{compare_module, fetch_verbose_diffs};
use branchmerge_core::models::{DiffModule, ItemType};
use branchmerge_core::render::verbose_records;

use crate::print;
use crate::style;

/// How differences are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DiffFormat {
    /// One line per changed item.
    Compact,
    /// Field-level changes of every modified item.
    Verbose,
}

pub async fn run_diff(
    config: &AppConfig,
    client: &CmsClient,
    base_branch: &str,
    compare_branch: &str,
    module: DiffModule,
    format: DiffFormat,
) -> Result<()> {
    let spinner = style::spinner(format!("Comparing {} with {}...", base_branch, compare_branch));
    let comparison = compare_module(client, config.diff.page_limit, module, base_branch, compare_branch).await;
    spinner.finish_and_clear();
    let comparison = comparison.context("failed to compare branches")?;

    print::print_diff_summary(&comparison.summary);

    if comparison.classified.is_empty() {
        println!("{}", style::success("No differences found."));
        return Ok(());
    }

    match format {
        DiffFormat::Compact => match module {
            DiffModule::All => {
                print::print_compact(
                    DiffModule::ContentTypes.label(),
                    &comparison.classified.of_type(ItemType::ContentType),
                );
                print::print_compact(
                    DiffModule::GlobalFields.label(),
                    &comparison.classified.of_type(ItemType::GlobalField),
                );
            }
            other => print::print_compact(other.label(), &comparison.classified),
        },
        DiffFormat::Verbose => {
            let spinner = style::spinner("Fetching field-level differences...");
            let diffs = fetch_verbose_diffs(client, base_branch, compare_branch, &comparison.items).await;
            spinner.finish_and_clear();
            let diffs = diffs.context("failed to fetch field-level differences")?;

            print::print_compact(module.label(), &comparison.classified);
            print::print_verbose(&verbose_records(&diffs));
        }
    }

    Ok(())
}
