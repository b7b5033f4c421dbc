//! Response bodies of the branch comparison and merge endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diff::schema::SchemaNode;
use crate::models::{DiffItem, DiffStatus, MergeJob, MergeJobStatus};

/// One page of `GET /v3/stacks/branches_compare[/{module}]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparePage {
    #[serde(default)]
    pub diff: Vec<DiffItem>,
    /// Present while more pages remain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_url: Option<String>,
}

/// Body of `GET /v3/stacks/branches_compare/{module}/{uid}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDiffResponse {
    pub diff: ModifiedItemDiff,
}

/// Field-level comparison of one top-level item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifiedItemDiff {
    #[serde(default)]
    pub uid: Option<String>,
    pub status: DiffStatus,
    #[serde(default)]
    pub base_branch: Option<BranchDifferences>,
    #[serde(default)]
    pub compare_branch: Option<BranchDifferences>,
}

/// The differing entries reported for one side of a comparison.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchDifferences {
    #[serde(default)]
    pub differences: Vec<Difference>,
}

/// A single entry of a `differences` list.
///
/// Entries carrying a `display_name` are schema fields and can be diffed
/// structurally; everything else is an item-level property such as the
/// title or the singleton toggle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum Difference {
    Field(SchemaNode),
    Property(PropertyDiff),
}

/// An item-level property difference (`title`, `description`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDiff {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl TryFrom<Value> for Difference {
    type Error = serde_json::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        if value.get("display_name").is_some() {
            serde_json::from_value(value).map(Difference::Field)
        } else {
            serde_json::from_value(value).map(Difference::Property)
        }
    }
}

impl Serialize for Difference {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Field(node) => node.serialize(serializer),
            Self::Property(prop) => prop.serialize(serializer),
        }
    }
}

/// Alignment key of a [`Difference`]. Fields and properties live in
/// separate namespaces, so a `title` field never pairs with the `title`
/// property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifferenceKey<'a> {
    Field(&'a str),
    Property(&'a str),
}

impl Difference {
    /// Alignment key: the uid when there is one, otherwise the path.
    pub fn key(&self) -> DifferenceKey<'_> {
        match self {
            Self::Field(node) if !node.uid.is_empty() => DifferenceKey::Field(&node.uid),
            Self::Field(node) => DifferenceKey::Field(node.path.as_deref().unwrap_or_default()),
            Self::Property(prop) => DifferenceKey::Property(prop.uid.as_deref().unwrap_or(&prop.path)),
        }
    }
}

/// Body of `POST /v3/stacks/branches_merge`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeResponse {
    pub uid: String,
    pub merge_details: MergeDetails,
}

impl MergeResponse {
    pub fn job(&self) -> MergeJob {
        MergeJob {
            uid: self.uid.clone(),
            status: self.merge_details.status.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeDetails {
    pub status: MergeJobStatus,
}

/// Body of `GET /v3/stacks/branches_queue/{uid}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeQueueResponse {
    #[serde(default)]
    pub queue: Vec<MergeQueueEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeQueueEntry {
    pub merge_details: MergeDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<Value>>,
}
