//! Branch comparison: pagination, classification and field-level diffing.
//!
//! The diff subsystem is responsible for:
//! 1. **Fetching** -- following the comparison endpoint's pages ([`pager`]).
//! 2. **Classifying** -- bucketing items into added / modified / deleted ([`classifier`]).
//! 3. **Field diffing** -- recursive schema tree comparison ([`structural`]) and
//!    the per-item verbose view built on top of it ([`verbose`]).

pub mod classifier;
pub mod pager;
pub mod schema;
pub mod structural;
pub mod verbose;

pub use classifier::{BranchDiffSummary, ClassifiedDiff};
pub use pager::DiffPager;
pub use schema::{NodeKind, SchemaNode};
pub use structural::{deep_diff, deep_diff_under, FieldChange, FieldDiff};
pub use verbose::{fetch_verbose_diffs, prepare_branch_verbose_res, VerboseItemDiff};

use crate::api::BranchApi;
use crate::errors::DiffError;
use crate::models::{DiffItem, DiffModule};

/// The full result of comparing one module across two branches.
#[derive(Debug, Clone)]
pub struct BranchComparison {
    pub module: DiffModule,
    pub base_branch: String,
    pub compare_branch: String,
    pub items: Vec<DiffItem>,
    pub classified: ClassifiedDiff,
    pub summary: BranchDiffSummary,
}

impl BranchComparison {
    pub fn new(module: DiffModule, base_branch: &str, compare_branch: &str, items: Vec<DiffItem>) -> Self {
        let summary = BranchDiffSummary::from_items(&items, base_branch, compare_branch);
        let classified = ClassifiedDiff::classify(items.iter().cloned());
        Self {
            module,
            base_branch: base_branch.to_string(),
            compare_branch: compare_branch.to_string(),
            items,
            classified,
            summary,
        }
    }
}

/// Fetch and classify the differences of one module.
pub async fn compare_module<A: BranchApi + ?Sized>(
    api: &A,
    page_limit: u32,
    module: DiffModule,
    base_branch: &str,
    compare_branch: &str,
) -> Result<BranchComparison, DiffError> {
    let items = DiffPager::new(api, page_limit)
        .fetch(module, base_branch, compare_branch)
        .await?;
    Ok(BranchComparison::new(module, base_branch, compare_branch, items))
}
