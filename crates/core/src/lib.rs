//! branchmerge core library.
//!
//! This crate provides the building blocks for comparing two branches of a
//! stack's schema and reconciling them with a merge: configuration, the
//! management API client, paginated comparison and structural field diffs,
//! the merge settings wizard and merge job execution.

pub mod api;
pub mod config;
pub mod diff;
pub mod errors;
pub mod merge;
pub mod models;
pub mod render;

// Re-exports for convenience.
pub use api::{BranchApi, CmsClient, MergeApi};
pub use config::AppConfig;
pub use diff::{compare_module, deep_diff, BranchComparison, DiffPager};
pub use errors::CoreError;
pub use merge::{MergeExecutor, MergeSettings, MergeWizard};
