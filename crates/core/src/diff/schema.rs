//! Schema field trees as returned by the management API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One field of a content type or global field schema.
///
/// Composite fields (groups, global field references) carry their children
/// in [`NodeKind::Composite`]; everything else is a [`NodeKind::Leaf`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSchemaNode", into = "RawSchemaNode")]
pub struct SchemaNode {
    pub uid: String,
    pub display_name: String,
    pub data_type: String,
    /// Server-side location of the field. Not part of the comparison.
    pub path: Option<String>,
    /// Every other property of the field (`mandatory`, `field_metadata`, ...).
    pub props: Map<String, Value>,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Leaf,
    Composite(Vec<SchemaNode>),
}

#[derive(Serialize, Deserialize)]
struct RawSchemaNode {
    uid: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema: Option<Vec<SchemaNode>>,
    #[serde(flatten)]
    props: Map<String, Value>,
}

impl From<RawSchemaNode> for SchemaNode {
    fn from(raw: RawSchemaNode) -> Self {
        Self {
            uid: raw.uid,
            display_name: raw.display_name,
            data_type: raw.data_type,
            path: raw.path,
            props: raw.props,
            kind: match raw.schema {
                Some(children) => NodeKind::Composite(children),
                None => NodeKind::Leaf,
            },
        }
    }
}

impl From<SchemaNode> for RawSchemaNode {
    fn from(node: SchemaNode) -> Self {
        Self {
            uid: node.uid,
            display_name: node.display_name,
            data_type: node.data_type,
            path: node.path,
            schema: match node.kind {
                NodeKind::Composite(children) => Some(children),
                NodeKind::Leaf => None,
            },
            props: node.props,
        }
    }
}

impl SchemaNode {
    /// A leaf field with no extra properties.
    pub fn leaf(uid: impl Into<String>, display_name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: display_name.into(),
            data_type: data_type.into(),
            path: None,
            props: Map::new(),
            kind: NodeKind::Leaf,
        }
    }

    /// A composite field holding `children`.
    pub fn composite(
        uid: impl Into<String>,
        display_name: impl Into<String>,
        data_type: impl Into<String>,
        children: Vec<SchemaNode>,
    ) -> Self {
        Self {
            kind: NodeKind::Composite(children),
            ..Self::leaf(uid, display_name, data_type)
        }
    }

    /// Builder-style helper to set one extra property.
    pub fn with_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    pub fn children(&self) -> Option<&[SchemaNode]> {
        match &self.kind {
            NodeKind::Composite(children) => Some(children),
            NodeKind::Leaf => None,
        }
    }

    /// Dotted location of the enclosing field, derived from `path`. Empty for
    /// top-level fields and when `path` does not end in the uid.
    pub fn parent_path(&self) -> &str {
        self.path
            .as_deref()
            .and_then(|p| p.strip_suffix(self.uid.as_str()))
            .and_then(|p| p.strip_suffix('.'))
            .unwrap_or_default()
    }

    /// Whether the node's own properties match, ignoring `schema` and `path`.
    pub fn same_properties(&self, other: &SchemaNode) -> bool {
        self.uid == other.uid
            && self.display_name == other.display_name
            && self.data_type == other.data_type
            && self.props == other.props
    }
}
