//! Field-level diff of modified top-level items.
//!
//! The field-diff endpoint reports, per branch, a flat list of differing
//! entries. [`prepare_branch_verbose_res`] aligns the two lists and turns
//! them into a [`FieldDiff`], re-diffing schema fields structurally and
//! describing item-level properties through [`WELL_KNOWN_FIELDS`].

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::api::types::{Difference, DifferenceKey, ModifiedItemDiff, PropertyDiff};
use crate::api::BranchApi;
use crate::diff::schema::SchemaNode;
use crate::diff::structural::{child_path, deep_diff_under, FieldChange, FieldDiff};
use crate::errors::DiffError;
use crate::models::{ChangeKind, DiffItem, DiffStatus};

/// Field type reported for item-level property changes.
pub const PROPERTY_FIELD_TYPE: &str = "metadata";

/// Prefix of the paths property changes are recorded under. Field uids never
/// start with `$`, so `$.title` cannot collide with a `title` field.
pub const PROPERTY_PATH_PREFIX: &str = "$.";

/// Path a property change is recorded under.
pub fn property_path(path: &str) -> String {
    format!("{}{}", PROPERTY_PATH_PREFIX, path)
}

/// How a well-known property is labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyLabel {
    Fixed(&'static str),
    /// Label picked by the boolean value of the property.
    Toggle { on: &'static str, off: &'static str },
}

/// An item-level property with a fixed presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WellKnownField {
    pub path: &'static str,
    pub label: PropertyLabel,
}

pub const WELL_KNOWN_FIELDS: &[WellKnownField] = &[
    WellKnownField {
        path: "title",
        label: PropertyLabel::Fixed("Display Name"),
    },
    WellKnownField {
        path: "description",
        label: PropertyLabel::Fixed("Description"),
    },
    WellKnownField {
        path: "options.singleton",
        label: PropertyLabel::Toggle {
            on: "Single",
            off: "Multiple",
        },
    },
];

/// Look up the presentation of a property path.
pub fn well_known_field(path: &str) -> Option<&'static WellKnownField> {
    WELL_KNOWN_FIELDS.iter().find(|f| f.path == path)
}

impl PropertyLabel {
    fn render(self, value: Option<&Value>) -> String {
        match self {
            Self::Fixed(label) => label.to_string(),
            Self::Toggle { on, off } => {
                if value.and_then(Value::as_bool).unwrap_or(false) {
                    on.to_string()
                } else {
                    off.to_string()
                }
            }
        }
    }
}

/// Describe a property change. `value` decides toggle labels.
fn property_change(prop: &PropertyDiff, value: Option<&Value>) -> FieldChange {
    let display_name = match well_known_field(&prop.path) {
        Some(field) => field.label.render(value),
        None => prop.path.clone(),
    };
    FieldChange {
        path: property_path(&prop.path),
        uid: prop.uid.clone().unwrap_or_else(|| prop.path.clone()),
        display_name,
        field_type: PROPERTY_FIELD_TYPE.to_string(),
    }
}

/// One-sided fields use the same `parent.uid` paths as [`deep_diff_under`].
fn field_change(node: &SchemaNode) -> FieldChange {
    FieldChange {
        path: child_path(node.parent_path(), &node.uid),
        uid: node.uid.clone(),
        display_name: node.display_name.clone(),
        field_type: node.data_type.clone(),
    }
}

fn one_sided(entry: &Difference) -> FieldChange {
    match entry {
        Difference::Field(node) => field_change(node),
        Difference::Property(prop) => property_change(prop, prop.value.as_ref()),
    }
}

/// Classify one aligned pair of entries into `diff`.
fn prepare_modified_diff(base: Option<&Difference>, compare: Option<&Difference>, diff: &mut FieldDiff) {
    match (base, compare) {
        (Some(Difference::Field(base_node)), Some(Difference::Field(compare_node))) => {
            diff.merge(deep_diff_under(compare_node.parent_path(), base_node, compare_node));
        }
        (Some(Difference::Property(_)), Some(Difference::Property(prop))) => {
            diff.record(ChangeKind::Modified, property_change(prop, prop.value.as_ref()));
        }
        // Keys are namespaced by kind, so a field never pairs with a property.
        (Some(base), Some(compare)) => {
            diff.record(ChangeKind::Deleted, one_sided(base));
            diff.record(ChangeKind::Added, one_sided(compare));
        }
        (Some(entry), None) => diff.record(ChangeKind::Deleted, one_sided(entry)),
        (None, Some(entry)) => diff.record(ChangeKind::Added, one_sided(entry)),
        (None, None) => {}
    }
}

/// Turn the raw field diff of one modified item into added / modified /
/// deleted field changes. Items whose status is not `modified` yield an
/// empty diff.
pub fn prepare_branch_verbose_res(item_diff: &ModifiedItemDiff) -> FieldDiff {
    let mut diff = FieldDiff::default();
    if item_diff.status != DiffStatus::Modified {
        return diff;
    }

    let empty = Vec::new();
    let base_entries = item_diff
        .base_branch
        .as_ref()
        .map(|b| &b.differences)
        .unwrap_or(&empty);
    let compare_entries = item_diff
        .compare_branch
        .as_ref()
        .map(|b| &b.differences)
        .unwrap_or(&empty);

    // Union by key, base entries first, each key visited once.
    let mut seen: Vec<DifferenceKey<'_>> = Vec::new();
    for entry in base_entries.iter().chain(compare_entries.iter()) {
        let key = entry.key();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);

        let base = base_entries.iter().find(|e| e.key() == key);
        let compare = compare_entries.iter().find(|e| e.key() == key);
        prepare_modified_diff(base, compare, &mut diff);
    }

    debug!(
        added = diff.added.len(),
        modified = diff.modified.len(),
        deleted = diff.deleted.len(),
        "prepared verbose diff"
    );
    diff
}

/// Field-level diff of one modified top-level item.
#[derive(Debug, Clone, PartialEq)]
pub struct VerboseItemDiff {
    pub item: DiffItem,
    pub fields: FieldDiff,
}

/// Fetch and prepare field diffs for every modified item, one request at a
/// time in input order. The first failure aborts the whole run.
#[instrument(skip(api, items), fields(count = items.len()))]
pub async fn fetch_verbose_diffs<A: BranchApi + ?Sized>(
    api: &A,
    base_branch: &str,
    compare_branch: &str,
    items: &[DiffItem],
) -> Result<Vec<VerboseItemDiff>, DiffError> {
    let mut results = Vec::with_capacity(items.len());
    for item in items.iter().filter(|i| i.status == DiffStatus::Modified) {
        let Some(module) = item.item_type.module() else {
            warn!(uid = %item.uid, "skipping item of unknown type");
            continue;
        };
        let response = api
            .fetch_field_diff(base_branch, compare_branch, module, &item.uid)
            .await?;
        results.push(VerboseItemDiff {
            item: item.clone(),
            fields: prepare_branch_verbose_res(&response.diff),
        });
    }
    info!(items = results.len(), "fetched field-level diffs");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    use crate::api::types::{ComparePage, FieldDiffResponse};
    use crate::errors::ApiError;
    use crate::models::DiffModule;

    /// Records every field-diff request it answers.
    #[derive(Default)]
    struct RecordingApi {
        fetched: Mutex<Vec<(DiffModule, String)>>,
    }

    #[async_trait]
    impl BranchApi for RecordingApi {
        async fn compare_branches(
            &self,
            _base_branch: &str,
            _compare_branch: &str,
            _module: DiffModule,
            _skip: u32,
            _limit: u32,
        ) -> Result<ComparePage, ApiError> {
            Err(ApiError::ParseError("not used".into()))
        }

        async fn fetch_field_diff(
            &self,
            _base_branch: &str,
            _compare_branch: &str,
            module: DiffModule,
            uid: &str,
        ) -> Result<FieldDiffResponse, ApiError> {
            self.fetched.lock().unwrap().push((module, uid.to_string()));
            Ok(serde_json::from_value(json!({
                "diff": {
                    "uid": uid,
                    "status": "modified",
                    "base_branch": { "differences": [] },
                    "compare_branch": { "differences": [ { "path": "description", "value": "New" } ] }
                }
            }))
            .unwrap())
        }
    }

    fn item_diff(base: Value, compare: Value) -> ModifiedItemDiff {
        serde_json::from_value(json!({
            "uid": "blog",
            "status": "modified",
            "base_branch": { "differences": base },
            "compare_branch": { "differences": compare }
        }))
        .unwrap()
    }

    #[test]
    fn test_title_change_uses_lookup_table() {
        let diff = prepare_branch_verbose_res(&item_diff(
            json!([{ "path": "title", "value": "Blog" }]),
            json!([{ "path": "title", "value": "Posts" }]),
        ));
        assert_eq!(diff.len(), 1);
        let change = &diff.modified["$.title"];
        assert_eq!(change.display_name, "Display Name");
        assert_eq!(change.field_type, PROPERTY_FIELD_TYPE);
    }

    #[test]
    fn test_singleton_label_follows_compare_value() {
        let diff = prepare_branch_verbose_res(&item_diff(
            json!([{ "path": "options.singleton", "value": true }]),
            json!([{ "path": "options.singleton", "value": false }]),
        ));
        assert_eq!(diff.modified["$.options.singleton"].display_name, "Multiple");

        let added = prepare_branch_verbose_res(&item_diff(
            json!([]),
            json!([{ "path": "options.singleton", "value": true }]),
        ));
        assert_eq!(added.added["$.options.singleton"].display_name, "Single");
    }

    #[test]
    fn test_added_description() {
        let diff = prepare_branch_verbose_res(&item_diff(
            json!([]),
            json!([{ "path": "description", "value": "All posts" }]),
        ));
        assert_eq!(diff.added["$.description"].display_name, "Description");
    }

    #[test]
    fn test_one_sided_fields() {
        let diff = prepare_branch_verbose_res(&item_diff(
            json!([{ "uid": "legacy", "display_name": "Legacy", "data_type": "text", "path": "legacy" }]),
            json!([{ "uid": "summary", "display_name": "Summary", "data_type": "text", "path": "summary" }]),
        ));
        assert_eq!(diff.deleted["legacy"].display_name, "Legacy");
        assert_eq!(diff.added["summary"].field_type, "text");
        assert!(diff.modified.is_empty());
    }

    #[test]
    fn test_fields_on_both_sides_are_deep_diffed() {
        let diff = prepare_branch_verbose_res(&item_diff(
            json!([{
                "uid": "seo", "display_name": "SEO", "data_type": "group", "path": "seo",
                "schema": [ { "uid": "keywords", "display_name": "Keywords", "data_type": "text" } ]
            }]),
            json!([{
                "uid": "seo", "display_name": "SEO", "data_type": "group", "path": "seo",
                "schema": [
                    { "uid": "keywords", "display_name": "Keywords", "data_type": "text", "multiple": true },
                    { "uid": "canonical", "display_name": "Canonical", "data_type": "text" }
                ]
            }]),
        ));
        assert!(diff.modified.contains_key("seo.keywords"));
        assert!(diff.added.contains_key("seo.canonical"));
        assert!(diff.deleted.is_empty());
    }

    #[test]
    fn test_non_modified_status_is_empty() {
        let mut raw = item_diff(json!([{ "path": "title" }]), json!([]));
        raw.status = DiffStatus::CompareOnly;
        assert!(prepare_branch_verbose_res(&raw).is_empty());
    }

    #[test]
    fn test_unknown_property_falls_back_to_path() {
        let diff = prepare_branch_verbose_res(&item_diff(
            json!([{ "path": "options.is_page", "value": false }]),
            json!([{ "path": "options.is_page", "value": true }]),
        ));
        assert_eq!(diff.modified["$.options.is_page"].display_name, "options.is_page");
    }

    #[test]
    fn test_title_property_and_title_field_both_reported() {
        let diff = prepare_branch_verbose_res(&item_diff(
            json!([
                { "path": "title", "value": "Blog" },
                { "uid": "title", "display_name": "Title", "data_type": "text", "path": "title", "mandatory": false }
            ]),
            json!([
                { "path": "title", "value": "Posts" },
                { "uid": "title", "display_name": "Title", "data_type": "text", "path": "title", "mandatory": true }
            ]),
        ));
        assert_eq!(diff.modified.len(), 2);
        assert_eq!(diff.modified["$.title"].display_name, "Display Name");
        let field = &diff.modified["title"];
        assert_eq!(field.display_name, "Title");
        assert_eq!(field.field_type, "text");
    }

    #[test]
    fn test_nested_entries_share_one_path_convention() {
        let nested = |extra: Value| {
            let mut entry = json!({
                "uid": "meta_title", "display_name": "Meta Title", "data_type": "text",
                "path": "seo.meta_title"
            });
            if let (Some(map), Some(extra)) = (entry.as_object_mut(), extra.as_object()) {
                map.extend(extra.clone());
            }
            entry
        };

        let modified = prepare_branch_verbose_res(&item_diff(
            json!([nested(json!({ "mandatory": false }))]),
            json!([nested(json!({ "mandatory": true }))]),
        ));
        assert!(modified.modified.contains_key("seo.meta_title"));

        let added = prepare_branch_verbose_res(&item_diff(json!([]), json!([nested(json!({}))])));
        assert!(added.added.contains_key("seo.meta_title"));
    }

    #[test]
    fn test_field_and_property_never_pair() {
        let diff = prepare_branch_verbose_res(&item_diff(
            json!([{ "path": "description", "value": "Old" }]),
            json!([{ "uid": "description", "display_name": "Description", "data_type": "text" }]),
        ));
        assert!(diff.modified.is_empty());
        assert!(diff.deleted.contains_key("$.description"));
        assert_eq!(diff.added["description"].field_type, "text");
    }

    #[tokio::test]
    async fn test_unknown_item_types_are_not_fetched() {
        let items: Vec<DiffItem> = serde_json::from_value(json!([
            { "uid": "blog", "title": "Blog", "type": "content_type", "status": "modified" },
            { "uid": "home", "title": "Home", "type": "entry", "status": "modified" },
            { "uid": "seo", "title": "SEO", "type": "global_field", "status": "modified" },
            { "uid": "hero", "title": "Hero", "type": "global_field", "status": "compare_only" }
        ]))
        .unwrap();

        let api = RecordingApi::default();
        let diffs = fetch_verbose_diffs(&api, "main", "dev", &items).await.unwrap();

        assert_eq!(diffs.len(), 2);
        assert_eq!(
            *api.fetched.lock().unwrap(),
            vec![
                (DiffModule::ContentTypes, "blog".to_string()),
                (DiffModule::GlobalFields, "seo".to_string()),
            ]
        );
    }
}
