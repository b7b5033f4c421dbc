//! Bucketing of top-level diff records and summary counts.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{ChangeKind, DiffItem, DiffStatus, ItemType};

/// Top-level diff records grouped by change kind, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedDiff {
    #[serde(default)]
    pub added: Vec<DiffItem>,
    #[serde(default)]
    pub modified: Vec<DiffItem>,
    #[serde(default)]
    pub deleted: Vec<DiffItem>,
}

impl ClassifiedDiff {
    /// Bucket `items` by status. Records with an unrecognised status are
    /// skipped with a warning.
    pub fn classify<I: IntoIterator<Item = DiffItem>>(items: I) -> Self {
        let mut classified = Self::default();
        for item in items {
            match item.status {
                DiffStatus::CompareOnly => classified.added.push(item),
                DiffStatus::BaseOnly => classified.deleted.push(item),
                DiffStatus::Modified => classified.modified.push(item),
                DiffStatus::Unknown => {
                    warn!(uid = %item.uid, "skipping diff record with unknown status");
                }
            }
        }
        classified
    }

    pub fn bucket(&self, kind: ChangeKind) -> &[DiffItem] {
        match kind {
            ChangeKind::Added => &self.added,
            ChangeKind::Modified => &self.modified,
            ChangeKind::Deleted => &self.deleted,
        }
    }

    pub fn bucket_mut(&mut self, kind: ChangeKind) -> &mut Vec<DiffItem> {
        match kind {
            ChangeKind::Added => &mut self.added,
            ChangeKind::Modified => &mut self.modified,
            ChangeKind::Deleted => &mut self.deleted,
        }
    }

    pub fn total(&self) -> usize {
        self.added.len() + self.modified.len() + self.deleted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Only the records of one item type (used to split an `all` comparison).
    pub fn of_type(&self, item_type: ItemType) -> Self {
        let pick = |items: &[DiffItem]| {
            items
                .iter()
                .filter(|i| i.item_type == item_type)
                .cloned()
                .collect::<Vec<_>>()
        };
        Self {
            added: pick(&self.added),
            modified: pick(&self.modified),
            deleted: pick(&self.deleted),
        }
    }
}

/// Numeric overview of a comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchDiffSummary {
    pub base_branch: String,
    pub compare_branch: String,
    /// Differing items present in the base branch.
    pub base: usize,
    /// Differing items present in the compare branch.
    pub compare: usize,
    pub base_only: usize,
    pub compare_only: usize,
    pub modified: usize,
}

impl BranchDiffSummary {
    pub fn from_items(items: &[DiffItem], base_branch: &str, compare_branch: &str) -> Self {
        let count = |status: DiffStatus| items.iter().filter(|i| i.status == status).count();
        let base_only = count(DiffStatus::BaseOnly);
        let compare_only = count(DiffStatus::CompareOnly);
        let modified = count(DiffStatus::Modified);
        Self {
            base_branch: base_branch.to_string(),
            compare_branch: compare_branch.to_string(),
            base: base_only + modified,
            compare: compare_only + modified,
            base_only,
            compare_only,
            modified,
        }
    }
}
