//! Merge summary files.
//!
//! An exported summary holds the request payload and the content it would
//! merge, so a merge can be reviewed first and executed later with
//! `--use-merge-summary`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::MergeError;
use crate::merge::settings::{MergeContent, MergeRequestPayload, MergeSettings};

/// File name written inside the export directory.
pub const SUMMARY_FILE_NAME: &str = "merge-summary.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergeSummary {
    pub request_payload: MergeRequestPayload,
    #[serde(default)]
    pub merge_content: MergeContent,
}

fn file_error(path: &Path, detail: impl ToString) -> MergeError {
    MergeError::File {
        path: path.display().to_string(),
        detail: detail.to_string(),
    }
}

impl MergeSummary {
    pub fn from_settings(settings: &MergeSettings) -> Result<Self, MergeError> {
        Ok(Self {
            request_payload: settings.to_payload()?,
            merge_content: settings.merge_content.clone(),
        })
    }

    /// Write the summary into `dir`, creating it if needed. Returns the
    /// path of the written file.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf, MergeError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| file_error(dir, e))?;

        let path = dir.join(SUMMARY_FILE_NAME);
        info!(path = %path.display(), "saving merge summary");

        let json = serde_json::to_string_pretty(self).map_err(|e| file_error(&path, e))?;
        std::fs::write(&path, json).map_err(|e| file_error(&path, e))?;
        Ok(path)
    }

    /// Load a previously exported summary. An unknown strategy in the file
    /// is rejected here.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MergeError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading merge summary");

        if !path.exists() {
            return Err(file_error(path, "file not found"));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| file_error(path, e))?;
        let summary: Self = serde_json::from_str(&contents).map_err(|e| file_error(path, e))?;

        debug!(
            strategy = %summary.request_payload.default_merge_strategy,
            modules = summary.merge_content.len(),
            "loaded merge summary"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::strategy::{MergeStrategy, StrategySubOption};
    use crate::merge::MergeSeed;

    fn settings() -> MergeSettings {
        let mut settings = MergeSettings::from_seed(&MergeSeed {
            base_branch: "main".into(),
            compare_branch: "dev".into(),
            merge_comment: Some("sync".into()),
            ..MergeSeed::default()
        });
        settings.strategy = Some(MergeStrategy::MergePreferBase);
        settings.strategy_sub_option = Some(StrategySubOption::New);
        settings.resolve();
        settings
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("exports");
        let summary = MergeSummary::from_settings(&settings()).unwrap();

        let path = summary.save(&target).unwrap();
        assert_eq!(path, target.join(SUMMARY_FILE_NAME));

        let loaded = MergeSummary::load(&path).unwrap();
        assert_eq!(loaded, summary);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = MergeSummary::load(dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_load_rejects_unknown_strategy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SUMMARY_FILE_NAME);
        std::fs::write(
            &path,
            r#"{"request_payload": {"base_branch": "main", "compare_branch": "dev",
                "default_merge_strategy": "merge_everything", "merge_comment": ""}}"#,
        )
        .unwrap();

        let err = MergeSummary::load(&path).unwrap_err();
        assert!(err.to_string().contains("invalid merge strategy 'merge_everything'"));
    }
}
