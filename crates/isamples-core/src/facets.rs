//! Flat facet counts.
//!
//! Solr reports `facet.field` results under `facet_counts.facet_fields`
//! as one alternating list per field:
//!
//! ```json
//! { "source": ["SESAR", 4688386, "OPENCONTEXT", 1064831, "GEOME", 605448] }
//! ```
//!
//! [`parse_facet_fields`] pairs those up, keeping the server's order.
//! Values are reported verbatim, without normalization.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FacetError {
    #[error("malformed facet response for field '{field}': {reason}")]
    Malformed { field: String, reason: String },
}

/// Ordered `(value, count)` pairs for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldCounts {
    pub field: String,
    pub counts: Vec<(String, u64)>,
}

impl FieldCounts {
    pub fn get(&self, value: &str) -> Option<u64> {
        self.counts
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, c)| *c)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|(_, c)| c).sum()
    }
}

impl Serialize for FieldCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (value, count) in &self.counts {
            map.serialize_entry(value, count)?;
        }
        map.end()
    }
}

/// Facet counts for every requested field, in request order.
///
/// Serializes as `{field: {value: count}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetCounts {
    pub fields: Vec<FieldCounts>,
}

impl FacetCounts {
    pub fn field(&self, name: &str) -> Option<&FieldCounts> {
        self.fields.iter().find(|f| f.field == name)
    }
}

impl Serialize for FacetCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for f in &self.fields {
            map.serialize_entry(&f.field, f)?;
        }
        map.end()
    }
}

/// Parse `facet_counts.facet_fields` for `fields` out of a select response.
///
/// A field missing from the response gets an empty count list.
pub fn parse_facet_fields<S: AsRef<str>>(
    response: &Value,
    fields: &[S],
) -> Result<FacetCounts, FacetError> {
    let facet_fields = response
        .get("facet_counts")
        .and_then(|f| f.get("facet_fields"));

    let mut out = Vec::with_capacity(fields.len());
    for field in fields {
        let field = field.as_ref();
        let malformed = |reason: String| FacetError::Malformed {
            field: field.to_string(),
            reason,
        };

        let counts = match facet_fields.and_then(|f| f.get(field)) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(flat)) => {
                if flat.len() % 2 != 0 {
                    return Err(malformed(format!(
                        "expected value/count pairs, got {} entries",
                        flat.len()
                    )));
                }
                flat.chunks(2)
                    .map(|pair| {
                        let value = match &pair[0] {
                            Value::String(s) => s.clone(),
                            Value::Number(n) => n.to_string(),
                            Value::Bool(b) => b.to_string(),
                            other => {
                                return Err(malformed(format!("invalid facet value {}", other)))
                            }
                        };
                        let count = pair[1]
                            .as_u64()
                            .ok_or_else(|| malformed(format!("invalid count {}", pair[1])))?;
                        Ok((value, count))
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
            Some(other) => return Err(malformed(format!("expected array, got {}", other))),
        };

        out.push(FieldCounts {
            field: field.to_string(),
            counts,
        });
    }

    Ok(FacetCounts { fields: out })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response() -> Value {
        json!({
            "response": {"numFound": 100},
            "facet_counts": {
                "facet_fields": {
                    "source": ["SESAR", 60, "GEOME", 30, "OPENCONTEXT", 10],
                    "hasMaterialCategory": ["Rock", 70, "Soil", 0]
                }
            }
        })
    }

    #[test]
    fn test_pairs_in_server_order() {
        let counts = parse_facet_fields(&response(), &["source"]).unwrap();
        let source = counts.field("source").unwrap();
        assert_eq!(
            source.counts,
            vec![
                ("SESAR".to_string(), 60),
                ("GEOME".to_string(), 30),
                ("OPENCONTEXT".to_string(), 10),
            ]
        );
        assert_eq!(source.total(), 100);
        assert_eq!(source.get("GEOME"), Some(30));
        assert_eq!(source.get("geome"), None);
    }

    #[test]
    fn test_request_order_and_missing_field() {
        let counts =
            parse_facet_fields(&response(), &["hasMaterialCategory", "registrant", "source"])
                .unwrap();
        let names: Vec<_> = counts.fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, vec!["hasMaterialCategory", "registrant", "source"]);
        assert!(counts.field("registrant").unwrap().counts.is_empty());
        assert_eq!(counts.field("hasMaterialCategory").unwrap().get("Soil"), Some(0));
    }

    #[test]
    fn test_no_facet_counts() {
        let counts = parse_facet_fields(&json!({}), &["source"]).unwrap();
        assert!(counts.field("source").unwrap().counts.is_empty());
    }

    #[test]
    fn test_odd_length_is_malformed() {
        let resp = json!({"facet_counts": {"facet_fields": {"source": ["SESAR", 1, "GEOME"]}}});
        let err = parse_facet_fields(&resp, &["source"]).unwrap_err();
        assert!(err.to_string().contains("source"));
    }

    #[test]
    fn test_bad_count_is_malformed() {
        let resp = json!({"facet_counts": {"facet_fields": {"source": ["SESAR", "many"]}}});
        assert!(parse_facet_fields(&resp, &["source"]).is_err());
    }

    #[test]
    fn test_serialize_nested_map() {
        let counts = parse_facet_fields(&response(), &["source"]).unwrap();
        let text = serde_json::to_string(&counts).unwrap();
        assert_eq!(text, r#"{"source":{"SESAR":60,"GEOME":30,"OPENCONTEXT":10}}"#);
    }
}
