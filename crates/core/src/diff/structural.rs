//! Recursive structural diff of two schema field trees.
//!
//! Given the base and compare versions of the same field, [`deep_diff`]
//! walks both trees depth-first and reports every added, deleted and
//! modified field under a dotted uid path (`seo.meta_title`). Only fields
//! present on both sides are descended into; a field that exists on one side
//! only is reported once at its own path.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::diff::schema::{NodeKind, SchemaNode};
use crate::models::ChangeKind;

/// A single field-level change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub path: String,
    pub uid: String,
    pub display_name: String,
    pub field_type: String,
}

impl FieldChange {
    fn from_node(node: &SchemaNode, path: String) -> Self {
        Self {
            path,
            uid: node.uid.clone(),
            display_name: node.display_name.clone(),
            field_type: node.data_type.clone(),
        }
    }
}

/// Field changes keyed by path. Within one diff a path appears at most once
/// per bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    pub added: BTreeMap<String, FieldChange>,
    pub modified: BTreeMap<String, FieldChange>,
    pub deleted: BTreeMap<String, FieldChange>,
}

impl FieldDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.modified.len() + self.deleted.len()
    }

    pub fn bucket(&self, kind: ChangeKind) -> &BTreeMap<String, FieldChange> {
        match kind {
            ChangeKind::Added => &self.added,
            ChangeKind::Modified => &self.modified,
            ChangeKind::Deleted => &self.deleted,
        }
    }

    /// Insert a change; a later record at the same path replaces the earlier one.
    pub fn record(&mut self, kind: ChangeKind, change: FieldChange) {
        let bucket = match kind {
            ChangeKind::Added => &mut self.added,
            ChangeKind::Modified => &mut self.modified,
            ChangeKind::Deleted => &mut self.deleted,
        };
        bucket.insert(change.path.clone(), change);
    }

    /// Fold another diff into this one.
    pub fn merge(&mut self, other: FieldDiff) {
        self.added.extend(other.added);
        self.modified.extend(other.modified);
        self.deleted.extend(other.deleted);
    }
}

/// Compare two versions of one schema field.
///
/// The top-level nodes are expected to share a uid. If they do not, they are
/// treated as unrelated fields: the base node is reported deleted and the
/// compare node added.
pub fn deep_diff(base: &SchemaNode, compare: &SchemaNode) -> FieldDiff {
    deep_diff_under("", base, compare)
}

/// [`deep_diff`] for fields nested below `parent_path`; every reported path
/// starts with it.
pub fn deep_diff_under(parent_path: &str, base: &SchemaNode, compare: &SchemaNode) -> FieldDiff {
    let mut diff = FieldDiff::default();
    if base.uid == compare.uid {
        diff_nodes(base, compare, parent_path, &mut diff);
    } else {
        diff.record(
            ChangeKind::Deleted,
            FieldChange::from_node(base, child_path(parent_path, &base.uid)),
        );
        diff.record(
            ChangeKind::Added,
            FieldChange::from_node(compare, child_path(parent_path, &compare.uid)),
        );
    }
    diff
}

pub(crate) fn child_path(parent: &str, uid: &str) -> String {
    if parent.is_empty() {
        uid.to_string()
    } else {
        format!("{}.{}", parent, uid)
    }
}

fn diff_nodes(base: &SchemaNode, compare: &SchemaNode, parent_path: &str, diff: &mut FieldDiff) {
    let path = child_path(parent_path, &base.uid);

    if !base.same_properties(compare) {
        trace!(path = %path, "field properties differ");
        diff.record(ChangeKind::Modified, FieldChange::from_node(compare, path.clone()));
    }

    match (&base.kind, &compare.kind) {
        (NodeKind::Composite(base_children), NodeKind::Composite(compare_children)) => {
            for base_child in base_children {
                match compare_children.iter().find(|c| c.uid == base_child.uid) {
                    Some(compare_child) => diff_nodes(base_child, compare_child, &path, diff),
                    None => diff.record(
                        ChangeKind::Deleted,
                        FieldChange::from_node(base_child, child_path(&path, &base_child.uid)),
                    ),
                }
            }
            for compare_child in compare_children {
                if !base_children.iter().any(|b| b.uid == compare_child.uid) {
                    diff.record(
                        ChangeKind::Added,
                        FieldChange::from_node(compare_child, child_path(&path, &compare_child.uid)),
                    );
                }
            }
        }
        (NodeKind::Composite(base_children), NodeKind::Leaf) => {
            for child in base_children {
                diff.record(
                    ChangeKind::Deleted,
                    FieldChange::from_node(child, child_path(&path, &child.uid)),
                );
            }
        }
        (NodeKind::Leaf, NodeKind::Composite(compare_children)) => {
            for child in compare_children {
                diff.record(
                    ChangeKind::Added,
                    FieldChange::from_node(child, child_path(&path, &child.uid)),
                );
            }
        }
        (NodeKind::Leaf, NodeKind::Leaf) => {}
    }
}
