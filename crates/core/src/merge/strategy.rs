//! Merge strategies and the strategy resolution table.
//!
//! The operator picks a [`MergeStrategy`] and, for the two "prefer"
//! strategies, a [`StrategySubOption`]. Together they resolve to the
//! [`ResolvedStrategy`] sent to the server, which in turn decides which
//! parts of the branch diff the merge touches ([`IncludePolicy`]).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::diff::ClassifiedDiff;
use crate::errors::MergeError;

/// Strategy offered at the first wizard step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    MergePreferBase,
    MergePreferCompare,
    OverwriteWithCompare,
    CustomPreferences,
}

impl MergeStrategy {
    pub const ALL: [MergeStrategy; 4] = [
        MergeStrategy::MergePreferBase,
        MergeStrategy::MergePreferCompare,
        MergeStrategy::OverwriteWithCompare,
        MergeStrategy::CustomPreferences,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MergePreferBase => "merge_prefer_base",
            Self::MergePreferCompare => "merge_prefer_compare",
            Self::OverwriteWithCompare => "overwrite_with_compare",
            Self::CustomPreferences => "custom_preferences",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::MergePreferBase => "Merge, Prefer Base",
            Self::MergePreferCompare => "Merge, Prefer Compare",
            Self::OverwriteWithCompare => "Overwrite with Compare",
            Self::CustomPreferences => "Merge, Ask for Preference",
        }
    }

    /// Whether the strategy asks for new / modified / both.
    pub fn has_sub_options(self) -> bool {
        matches!(self, Self::MergePreferBase | Self::MergePreferCompare)
    }
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStrategy {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| MergeError::InvalidStrategy(s.to_string()))
    }
}

/// Which changes a "prefer" strategy applies to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StrategySubOption {
    New,
    Modified,
    Both,
}

impl StrategySubOption {
    pub const ALL: [StrategySubOption; 3] = [
        StrategySubOption::New,
        StrategySubOption::Modified,
        StrategySubOption::Both,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Modified => "modified",
            Self::Both => "both",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::New => "New in Compare Only",
            Self::Modified => "Modified Only",
            Self::Both => "Both",
        }
    }
}

impl std::fmt::Display for StrategySubOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategySubOption {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|option| option.as_str() == s)
            .ok_or_else(|| MergeError::InvalidStrategy(s.to_string()))
    }
}

/// The merge strategy the server executes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum ResolvedStrategy {
    MergePreferBase,
    MergePreferCompare,
    OverwriteWithCompare,
    MergeNewOnly,
    MergeModifiedOnlyPreferBase,
    MergeModifiedOnlyPreferCompare,
    /// Custom preferences: the per-item strategies decide.
    Ignore,
}

impl ResolvedStrategy {
    pub const ALL: [ResolvedStrategy; 7] = [
        ResolvedStrategy::MergePreferBase,
        ResolvedStrategy::MergePreferCompare,
        ResolvedStrategy::OverwriteWithCompare,
        ResolvedStrategy::MergeNewOnly,
        ResolvedStrategy::MergeModifiedOnlyPreferBase,
        ResolvedStrategy::MergeModifiedOnlyPreferCompare,
        ResolvedStrategy::Ignore,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MergePreferBase => "merge_prefer_base",
            Self::MergePreferCompare => "merge_prefer_compare",
            Self::OverwriteWithCompare => "overwrite_with_compare",
            Self::MergeNewOnly => "merge_new_only",
            Self::MergeModifiedOnlyPreferBase => "merge_modified_only_prefer_base",
            Self::MergeModifiedOnlyPreferCompare => "merge_modified_only_prefer_compare",
            Self::Ignore => "ignore",
        }
    }

    /// Which diff buckets this strategy merges. `None` for [`Self::Ignore`],
    /// whose content comes from explicit per-item selections.
    pub fn include_policy(self) -> Option<IncludePolicy> {
        match self {
            Self::MergePreferBase | Self::MergePreferCompare | Self::OverwriteWithCompare => {
                Some(IncludePolicy::ALL_CHANGES)
            }
            Self::MergeNewOnly => Some(IncludePolicy {
                added: true,
                modified: false,
                deleted: false,
            }),
            Self::MergeModifiedOnlyPreferBase | Self::MergeModifiedOnlyPreferCompare => {
                Some(IncludePolicy {
                    added: false,
                    modified: true,
                    deleted: false,
                })
            }
            Self::Ignore => None,
        }
    }
}

impl std::fmt::Display for ResolvedStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolvedStrategy {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| MergeError::InvalidStrategy(s.to_string()))
    }
}

impl TryFrom<String> for ResolvedStrategy {
    type Error = MergeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ResolvedStrategy> for String {
    fn from(strategy: ResolvedStrategy) -> Self {
        strategy.as_str().to_string()
    }
}

/// Resolve a strategy choice to the server strategy.
///
/// Returns `None` when a "prefer" strategy has no sub-option yet.
pub fn resolve_strategy(
    strategy: MergeStrategy,
    sub_option: Option<StrategySubOption>,
) -> Option<ResolvedStrategy> {
    use MergeStrategy as S;
    use ResolvedStrategy as R;
    use StrategySubOption as O;

    match (strategy, sub_option) {
        (S::MergePreferBase, Some(O::New)) => Some(R::MergeNewOnly),
        (S::MergePreferBase, Some(O::Modified)) => Some(R::MergeModifiedOnlyPreferBase),
        (S::MergePreferBase, Some(O::Both)) => Some(R::MergePreferBase),
        (S::MergePreferCompare, Some(O::New)) => Some(R::MergeNewOnly),
        (S::MergePreferCompare, Some(O::Modified)) => Some(R::MergeModifiedOnlyPreferCompare),
        (S::MergePreferCompare, Some(O::Both)) => Some(R::MergePreferCompare),
        (S::MergePreferBase | S::MergePreferCompare, None) => None,
        (S::OverwriteWithCompare, _) => Some(R::OverwriteWithCompare),
        (S::CustomPreferences, _) => Some(R::Ignore),
    }
}

/// Per-item strategy chosen under custom preferences.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemStrategy {
    MergePreferBase,
    MergePreferCompare,
    OverwriteWithCompare,
    Ignore,
}

impl ItemStrategy {
    pub const ALL: [ItemStrategy; 4] = [
        ItemStrategy::MergePreferBase,
        ItemStrategy::MergePreferCompare,
        ItemStrategy::OverwriteWithCompare,
        ItemStrategy::Ignore,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MergePreferBase => "merge_prefer_base",
            Self::MergePreferCompare => "merge_prefer_compare",
            Self::OverwriteWithCompare => "overwrite_with_compare",
            Self::Ignore => "ignore",
        }
    }
}

impl std::fmt::Display for ItemStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStrategy {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| MergeError::InvalidStrategy(s.to_string()))
    }
}

/// Which buckets of a classified diff a merge includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncludePolicy {
    pub added: bool,
    pub modified: bool,
    pub deleted: bool,
}

impl IncludePolicy {
    pub const ALL_CHANGES: IncludePolicy = IncludePolicy {
        added: true,
        modified: true,
        deleted: true,
    };

    /// The subset of `diff` this policy keeps.
    pub fn apply(self, diff: &ClassifiedDiff) -> ClassifiedDiff {
        ClassifiedDiff {
            added: if self.added { diff.added.clone() } else { Vec::new() },
            modified: if self.modified { diff.modified.clone() } else { Vec::new() },
            deleted: if self.deleted { diff.deleted.clone() } else { Vec::new() },
        }
    }
}

/// Filter one module's diff by a strategy name, as read from flags or a
/// saved summary. Unknown names are rejected.
pub fn filter_by_strategy_name(name: &str, diff: &ClassifiedDiff) -> Result<ClassifiedDiff, MergeError> {
    let strategy: ResolvedStrategy = name.parse()?;
    strategy
        .include_policy()
        .map(|policy| policy.apply(diff))
        .ok_or_else(|| MergeError::InvalidStrategy(name.to_string()))
}
