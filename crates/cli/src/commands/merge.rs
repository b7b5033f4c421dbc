//! `branchmerge merge`: reconcile two branches.

use std::path::Path;

use anyhow::{Context, Result};

use branchmerge_core::api::CmsClient;
use branchmerge_core::config::AppConfig;
use branchmerge_core::diff::compare_module;
use branchmerge_core::errors::MergeError;
use branchmerge_core::merge::{
    content_by_module, MergeExecutor, MergeRequestPayload, MergeSeed, MergeSummary, MergeWizard,
};
use branchmerge_core::models::DiffModule;

use crate::print;
use crate::prompt::DialoguerPrompter;
use crate::signals;
use crate::style;

/// Run the wizard for `seed` and act on the chosen execution option.
pub async fn run_merge(
    config: &AppConfig,
    client: &CmsClient,
    seed: MergeSeed,
    export_dir: &Path,
) -> Result<()> {
    let spinner = style::spinner(format!(
        "Comparing {} with {}...",
        seed.base_branch, seed.compare_branch
    ));
    let comparison = compare_module(
        client,
        config.diff.page_limit,
        DiffModule::All,
        &seed.base_branch,
        &seed.compare_branch,
    )
    .await;
    spinner.finish_and_clear();
    let comparison = comparison.context("failed to compare branches")?;

    print::print_diff_summary(&comparison.summary);
    if comparison.classified.is_empty() {
        println!("{}", style::warn("Nothing to merge: the branches have no differences."));
        return Ok(());
    }

    let full_content = content_by_module(&comparison.classified);
    let mut prompter = DialoguerPrompter;
    let outcome = MergeWizard::new(&mut prompter, seed, &full_content)
        .run()
        .context("merge wizard failed")?;

    if outcome.execution.exports() {
        let summary = MergeSummary::from_settings(&outcome.settings)?;
        let path = summary.save(export_dir).context("failed to export merge summary")?;
        println!(
            "{}",
            style::success(&format!("Merge summary exported to {}", path.display()))
        );
    }

    if outcome.execution.executes() {
        let payload = outcome.settings.to_payload()?;
        execute(config, client, &payload).await?;
    }

    Ok(())
}

/// Execute a previously exported summary.
pub async fn run_from_summary(config: &AppConfig, client: &CmsClient, path: &Path) -> Result<()> {
    let summary = MergeSummary::load(path).context("failed to load merge summary")?;
    print::print_loaded_summary(&summary);
    execute(config, client, &summary.request_payload).await
}

async fn execute(config: &AppConfig, client: &CmsClient, payload: &MergeRequestPayload) -> Result<()> {
    let spinner = style::spinner(format!(
        "Merging {} into {}...",
        payload.compare_branch, payload.base_branch
    ));
    let mut executor = MergeExecutor::new(client, &config.merge).with_shutdown(signals::shutdown_signal());
    let result = executor.execute(payload).await;
    spinner.finish_and_clear();

    match result {
        Ok(job) => {
            println!(
                "{}",
                style::success(&format!("Merged {} into {} (merge uid: {})", payload.compare_branch, payload.base_branch, job.uid))
            );
            Ok(())
        }
        Err(MergeError::JobFailed { uid, log_path }) => {
            println!("{}", style::error(&format!("Merge failed (merge uid: {})", uid)));
            if let Some(path) = &log_path {
                println!("  {}", style::dim(&format!("Error details written to {}", path.display())));
            }
            Err(MergeError::JobFailed { uid, log_path }.into())
        }
        Err(e) => Err(e).context("merge did not complete"),
    }
}
