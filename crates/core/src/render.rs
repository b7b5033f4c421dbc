//! Presentational records for comparison output.
//!
//! The CLI prints these as tables; nothing here formats text for a terminal.

use serde::Serialize;

use crate::diff::{ClassifiedDiff, FieldDiff, VerboseItemDiff};
use crate::models::{ChangeKind, DiffItem, ItemType};

/// One line of the compact view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompactRecord {
    pub kind: ChangeKind,
    pub title: String,
    pub uid: String,
    pub item_type: ItemType,
}

impl CompactRecord {
    fn new(kind: ChangeKind, item: &DiffItem) -> Self {
        Self {
            kind,
            title: item.title.clone(),
            uid: item.uid.clone(),
            item_type: item.item_type,
        }
    }
}

/// Leading marker for a change kind.
pub fn marker(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Added => "+",
        ChangeKind::Modified => "±",
        ChangeKind::Deleted => "-",
    }
}

/// Compact view: added, then modified, then deleted items.
pub fn compact_records(classified: &ClassifiedDiff) -> Vec<CompactRecord> {
    ChangeKind::ALL
        .iter()
        .flat_map(|&kind| classified.bucket(kind).iter().map(move |item| CompactRecord::new(kind, item)))
        .collect()
}

/// One field row of the verbose view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRow {
    pub kind: ChangeKind,
    pub display_name: String,
    pub path: String,
    pub field_type: String,
}

/// Verbose view of one modified item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerboseRecord {
    pub title: String,
    pub uid: String,
    pub item_type: ItemType,
    pub rows: Vec<FieldRow>,
}

/// Field rows ordered by path, then by change kind.
pub fn field_rows(diff: &FieldDiff) -> Vec<FieldRow> {
    let mut rows: Vec<FieldRow> = ChangeKind::ALL
        .iter()
        .flat_map(|&kind| {
            diff.bucket(kind).values().map(move |change| FieldRow {
                kind,
                display_name: change.display_name.clone(),
                path: change.path.clone(),
                field_type: change.field_type.clone(),
            })
        })
        .collect();
    rows.sort_by(|a, b| a.path.cmp(&b.path).then(a.kind.cmp(&b.kind)));
    rows
}

pub fn verbose_records(diffs: &[VerboseItemDiff]) -> Vec<VerboseRecord> {
    diffs
        .iter()
        .map(|d| VerboseRecord {
            title: d.item.title.clone(),
            uid: d.item.uid.clone(),
            item_type: d.item.item_type,
            rows: field_rows(&d.fields),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::FieldChange;
    use crate::models::DiffStatus;

    fn item(uid: &str, status: DiffStatus) -> DiffItem {
        DiffItem {
            uid: uid.into(),
            title: uid.to_uppercase(),
            item_type: ItemType::ContentType,
            status,
        }
    }

    #[test]
    fn test_compact_order() {
        let classified = ClassifiedDiff::classify(vec![
            item("gone", DiffStatus::BaseOnly),
            item("new", DiffStatus::CompareOnly),
            item("changed", DiffStatus::Modified),
        ]);
        let records = compact_records(&classified);
        let kinds: Vec<_> = records.iter().map(|r| (r.kind, r.uid.as_str())).collect();
        assert_eq!(
            kinds,
            vec![
                (ChangeKind::Added, "new"),
                (ChangeKind::Modified, "changed"),
                (ChangeKind::Deleted, "gone"),
            ]
        );
        assert_eq!(marker(records[2].kind), "-");
    }

    #[test]
    fn test_field_rows_sorted_by_path() {
        let mut diff = FieldDiff::default();
        for (kind, path) in [
            (ChangeKind::Deleted, "seo.b"),
            (ChangeKind::Added, "seo.a"),
            (ChangeKind::Modified, "author"),
        ] {
            diff.record(
                kind,
                FieldChange {
                    path: path.into(),
                    uid: path.rsplit('.').next().unwrap().into(),
                    display_name: path.into(),
                    field_type: "text".into(),
                },
            );
        }
        let paths: Vec<_> = field_rows(&diff).into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["author", "seo.a", "seo.b"]);
    }
}
