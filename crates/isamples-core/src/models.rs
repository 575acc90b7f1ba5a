//! Facet-pivot data model.
//!
//! [`FacetPivotNode`] mirrors one entry of a Solr `facet.pivot` response:
//!
//! ```json
//! { "field": "source", "value": "SESAR", "count": 5, "pivot": [ ... ] }
//! ```
//!
//! Nodes deserialize straight from the wire JSON. The `pivot` key is
//! optional; Solr omits it on the deepest level.

use serde::{Deserialize, Deserializer, Serialize};

/// One node of a nested facet-pivot tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetPivotNode {
    /// Dimension (Solr field) this node's value belongs to.
    pub field: String,
    /// Raw facet value as reported by the server.
    #[serde(deserialize_with = "deserialize_facet_value")]
    pub value: String,
    /// Documents matching the ancestor values and this value.
    pub count: u64,
    /// Child nodes for the next dimension. Empty on leaves.
    #[serde(rename = "pivot", default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FacetPivotNode>,
}

impl FacetPivotNode {
    /// Create a leaf node.
    pub fn new(field: impl Into<String>, value: impl Into<String>, count: u64) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            count,
            children: Vec::new(),
        }
    }

    /// Attach child nodes, replacing any existing ones.
    pub fn with_children(mut self, children: Vec<FacetPivotNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Solr reports facet values of numeric and boolean fields as JSON
/// numbers and booleans; keep their textual form.
fn deserialize_facet_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!(
            "facet value must be a string, number or boolean, got {}",
            other
        ))),
    }
}
