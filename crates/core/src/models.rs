//! Domain model types shared by the diff and merge subsystems.
//!
//! These types bridge the management API client, the diff engine and the
//! merge wizard.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DiffError;

// ---------------------------------------------------------------------------
// Modules
// ---------------------------------------------------------------------------

/// The part of a stack schema a comparison covers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DiffModule {
    ContentTypes,
    GlobalFields,
    All,
}

impl DiffModule {
    /// Modules a merge walks through, in processing order.
    pub const MERGEABLE: [DiffModule; 2] = [DiffModule::ContentTypes, DiffModule::GlobalFields];

    /// Path segment appended to the comparison endpoint, if any.
    pub fn path_segment(self) -> Option<&'static str> {
        match self {
            Self::ContentTypes => Some("content_types"),
            Self::GlobalFields => Some("global_fields"),
            Self::All => None,
        }
    }

    /// Human-readable label used in headings.
    pub fn label(self) -> &'static str {
        match self {
            Self::ContentTypes => "Content Types",
            Self::GlobalFields => "Global Fields",
            Self::All => "All",
        }
    }
}

impl std::fmt::Display for DiffModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContentTypes => write!(f, "content_types"),
            Self::GlobalFields => write!(f, "global_fields"),
            Self::All => write!(f, "all"),
        }
    }
}

impl FromStr for DiffModule {
    type Err = DiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "content_types" | "content-types" => Ok(Self::ContentTypes),
            "global_fields" | "global-fields" => Ok(Self::GlobalFields),
            "all" => Ok(Self::All),
            other => Err(DiffError::InvalidModule(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Diff items
// ---------------------------------------------------------------------------

/// The kind of top-level schema item a diff record refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    ContentType,
    GlobalField,
    #[serde(other)]
    Other,
}

impl ItemType {
    /// The comparison module that owns items of this type. Unknown types
    /// have no field-diff endpoint.
    pub fn module(self) -> Option<DiffModule> {
        match self {
            Self::ContentType => Some(DiffModule::ContentTypes),
            Self::GlobalField => Some(DiffModule::GlobalFields),
            Self::Other => None,
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContentType => write!(f, "content_type"),
            Self::GlobalField => write!(f, "global_field"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Where an item exists, as reported by the comparison endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    /// Only in the compare branch: an addition.
    CompareOnly,
    /// Only in the base branch: a deletion.
    BaseOnly,
    /// In both branches with differences.
    Modified,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CompareOnly => write!(f, "compare_only"),
            Self::BaseOnly => write!(f, "base_only"),
            Self::Modified => write!(f, "modified"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// One top-level difference between two branches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiffItem {
    pub uid: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub status: DiffStatus,
}

/// Bucket a change falls into once classified.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 3] = [ChangeKind::Added, ChangeKind::Modified, ChangeKind::Deleted];
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Modified => write!(f, "modified"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

// ---------------------------------------------------------------------------
// Merge jobs
// ---------------------------------------------------------------------------

/// Lifecycle status of a server-side merge job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum MergeJobStatus {
    InProgress,
    Complete,
    Failed,
    /// Anything the server sends outside the known lifecycle.
    Other(String),
}

impl From<String> for MergeJobStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "in_progress" | "in-progress" => Self::InProgress,
            "complete" => Self::Complete,
            "failed" => Self::Failed,
            _ => Self::Other(s),
        }
    }
}

impl From<MergeJobStatus> for String {
    fn from(status: MergeJobStatus) -> Self {
        status.to_string()
    }
}

impl std::fmt::Display for MergeJobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InProgress => write!(f, "in_progress"),
            Self::Complete => write!(f, "complete"),
            Self::Failed => write!(f, "failed"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A merge job as seen by the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergeJob {
    pub uid: String,
    pub status: MergeJobStatus,
}
