//! Management API collaborators.
//!
//! The diff and merge subsystems only talk to the server through the
//! [`BranchApi`] and [`MergeApi`] traits; [`CmsClient`] is the HTTP
//! implementation used by the CLI.

pub mod client;
pub mod types;

use async_trait::async_trait;

use crate::errors::ApiError;
use crate::merge::MergeRequestPayload;
use crate::models::DiffModule;

pub use client::CmsClient;
pub use types::{
    BranchDifferences, ComparePage, Difference, DifferenceKey, FieldDiffResponse, MergeDetails,
    MergeQueueEntry, MergeQueueResponse, MergeResponse, ModifiedItemDiff, PropertyDiff,
};

/// Read access to branch comparison results.
#[async_trait]
pub trait BranchApi: Send + Sync {
    /// Fetch one page of top-level differences between two branches.
    async fn compare_branches(
        &self,
        base_branch: &str,
        compare_branch: &str,
        module: DiffModule,
        skip: u32,
        limit: u32,
    ) -> Result<ComparePage, ApiError>;

    /// Fetch the field-level differences of one modified item.
    async fn fetch_field_diff(
        &self,
        base_branch: &str,
        compare_branch: &str,
        module: DiffModule,
        uid: &str,
    ) -> Result<FieldDiffResponse, ApiError>;
}

/// Merge job submission and status polling.
#[async_trait]
pub trait MergeApi: Send + Sync {
    /// Submit a merge request; the server answers with the new job.
    async fn submit_merge(&self, payload: &MergeRequestPayload) -> Result<MergeResponse, ApiError>;

    /// Read the merge queue entry for a running job.
    async fn poll_merge_queue(&self, job_uid: &str) -> Result<MergeQueueResponse, ApiError>;
}
