//! Merge settings accumulated by the wizard and the request payload built
//! from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diff::ClassifiedDiff;
use crate::errors::MergeError;
use crate::merge::strategy::{
    resolve_strategy, ItemStrategy, MergeStrategy, ResolvedStrategy, StrategySubOption,
};
use crate::models::{ChangeKind, DiffItem, DiffModule, ItemType};

/// Diff content a merge touches, per module.
pub type MergeContent = BTreeMap<DiffModule, ClassifiedDiff>;

/// Split an `all` comparison into per-module content.
pub fn content_by_module(diff: &ClassifiedDiff) -> MergeContent {
    DiffModule::MERGEABLE
        .iter()
        .map(|&module| {
            let item_type = match module {
                DiffModule::ContentTypes => ItemType::ContentType,
                _ => ItemType::GlobalField,
            };
            (module, diff.of_type(item_type))
        })
        .collect()
}

/// What to do with the settings once the wizard completes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOption {
    /// Write the summary file only.
    Export,
    /// Submit the merge.
    Execute,
    /// Write the summary file, then submit.
    Both,
}

impl ExecutionOption {
    pub const ALL: [ExecutionOption; 3] = [
        ExecutionOption::Export,
        ExecutionOption::Execute,
        ExecutionOption::Both,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Export => "export",
            Self::Execute => "execute",
            Self::Both => "both",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Export => "Export merge summary",
            Self::Execute => "Execute merge",
            Self::Both => "Export summary & Execute immediately",
        }
    }

    pub fn exports(self) -> bool {
        matches!(self, Self::Export | Self::Both)
    }

    pub fn executes(self) -> bool {
        matches!(self, Self::Execute | Self::Both)
    }
}

impl std::str::FromStr for ExecutionOption {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|option| option.as_str() == s)
            .ok_or_else(|| MergeError::InvalidStrategy(s.to_string()))
    }
}

impl std::fmt::Display for ExecutionOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options supplied up front (flags). A restart goes back to these,
/// minus the strategy choice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeSeed {
    pub base_branch: String,
    pub compare_branch: String,
    pub strategy: Option<MergeStrategy>,
    pub strategy_sub_option: Option<StrategySubOption>,
    pub merge_comment: Option<String>,
    pub no_revert: bool,
    pub execution: Option<ExecutionOption>,
}

/// Per-item override chosen under custom preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemMergeStrategy {
    pub uid: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub merge_strategy: ItemStrategy,
}

/// Settings built up across the wizard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeSettings {
    pub base_branch: String,
    pub compare_branch: String,
    pub strategy: Option<MergeStrategy>,
    pub strategy_sub_option: Option<StrategySubOption>,
    pub resolved: Option<ResolvedStrategy>,
    pub merge_comment: Option<String>,
    pub item_merge_strategies: Vec<ItemMergeStrategy>,
    pub merge_content: MergeContent,
    pub no_revert: bool,
}

impl MergeSettings {
    /// Fresh settings carrying only the seed's branches, comment and
    /// no-revert flag.
    pub fn from_seed(seed: &MergeSeed) -> Self {
        Self {
            base_branch: seed.base_branch.clone(),
            compare_branch: seed.compare_branch.clone(),
            merge_comment: seed.merge_comment.clone(),
            no_revert: seed.no_revert,
            ..Self::default()
        }
    }

    /// Forget everything derived from the strategy choice.
    pub fn clear_strategy(&mut self) {
        self.strategy = None;
        self.clear_sub_option();
    }

    /// Forget the sub-option and everything resolved from it.
    pub fn clear_sub_option(&mut self) {
        self.strategy_sub_option = None;
        self.resolved = None;
        self.item_merge_strategies.clear();
        self.merge_content.clear();
    }

    /// Resolve the current strategy choice through the resolution table.
    pub fn resolve(&mut self) -> Option<ResolvedStrategy> {
        self.resolved = self
            .strategy
            .and_then(|strategy| resolve_strategy(strategy, self.strategy_sub_option));
        self.resolved
    }

    /// Fill `merge_content` with the part of `full` the resolved strategy
    /// merges.
    pub fn apply_summary_filter(&mut self, full: &MergeContent) -> Result<(), MergeError> {
        let resolved = self.resolved.ok_or_else(|| {
            MergeError::InvalidStrategy(
                self.strategy
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "none".to_string()),
            )
        })?;
        let policy = resolved
            .include_policy()
            .ok_or_else(|| MergeError::InvalidStrategy(resolved.to_string()))?;
        self.merge_content = full
            .iter()
            .map(|(module, diff)| (*module, policy.apply(diff)))
            .collect();
        debug!(strategy = %resolved, "filtered merge summary");
        Ok(())
    }

    /// Record one custom-preference selection. `ignore` rows are dropped.
    pub fn add_item_selection(
        &mut self,
        module: DiffModule,
        kind: ChangeKind,
        item: &DiffItem,
        merge_strategy: ItemStrategy,
    ) {
        if merge_strategy == ItemStrategy::Ignore {
            return;
        }
        self.item_merge_strategies.push(ItemMergeStrategy {
            uid: item.uid.clone(),
            item_type: item.item_type,
            merge_strategy,
        });
        self.merge_content
            .entry(module)
            .or_default()
            .bucket_mut(kind)
            .push(item.clone());
    }

    /// Freeze the settings into the submittable payload.
    pub fn to_payload(&self) -> Result<MergeRequestPayload, MergeError> {
        let resolved = self.resolved.ok_or_else(|| {
            MergeError::InvalidStrategy(
                self.strategy
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "none".to_string()),
            )
        })?;
        let item_merge_strategies =
            (resolved == ResolvedStrategy::Ignore).then(|| self.item_merge_strategies.clone());
        Ok(MergeRequestPayload {
            base_branch: self.base_branch.clone(),
            compare_branch: self.compare_branch.clone(),
            default_merge_strategy: resolved,
            item_merge_strategies,
            merge_comment: self.merge_comment.clone().unwrap_or_default(),
            no_revert: self.no_revert,
        })
    }
}

/// Body of a merge submission. Field names are part of the wire contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergeRequestPayload {
    pub base_branch: String,
    pub compare_branch: String,
    pub default_merge_strategy: ResolvedStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_merge_strategies: Option<Vec<ItemMergeStrategy>>,
    #[serde(default)]
    pub merge_comment: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_revert: bool,
}
