//! Solr select parameters.
//!
//! [`SelectQuery`] collects the parameters the iSamples client sends to
//! `thing/select`, in insertion order and with repeated keys preserved
//! (Solr reads `fq` and `facet.field` as multi-valued).
//!
//! ```rust
//! use isamples_core::query::SelectQuery;
//!
//! let q = SelectQuery::new("*:*").facet_pivot(&["source", "hasMaterialCategory"]);
//! assert!(q
//!     .params()
//!     .contains(&("facet.pivot".to_string(), "source,hasMaterialCategory".to_string())));
//! ```

use crate::pivot::pivot_key;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    params: Vec<(String, String)>,
}

impl SelectQuery {
    /// Start a query for `q` that returns no documents (`rows=0`).
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            params: vec![
                ("q".to_string(), q.into()),
                ("rows".to_string(), "0".to_string()),
            ],
        }
    }

    pub fn rows(mut self, rows: u64) -> Self {
        self.set("rows", rows.to_string());
        self
    }

    /// Add a filter query. Repeatable.
    pub fn filter(mut self, fq: impl Into<String>) -> Self {
        self.params.push(("fq".to_string(), fq.into()));
        self
    }

    /// Restrict returned fields (`fl`, comma-joined).
    pub fn field_list<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        let fl = fields
            .iter()
            .map(|f| f.as_ref())
            .collect::<Vec<_>>()
            .join(",");
        self.set("fl", fl);
        self
    }

    /// Request flat facet counts for each field, zero counts included.
    pub fn facet_fields<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        self.enable_facets();
        for f in fields {
            self.params
                .push(("facet.field".to_string(), f.as_ref().to_string()));
        }
        self
    }

    /// Request a pivot facet across `dimensions`, zero counts included.
    pub fn facet_pivot<S: AsRef<str>>(mut self, dimensions: &[S]) -> Self {
        self.enable_facets();
        self.params
            .push(("facet.pivot".to_string(), pivot_key(dimensions)));
        self
    }

    /// Append an arbitrary parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Percent-encoded `k=v&k=v` form of the parameters.
    ///
    /// Used both as the GET query string and as the POST body.
    pub fn encode(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Length in bytes of [`encode`](Self::encode).
    pub fn encoded_len(&self) -> usize {
        self.encode().len()
    }

    fn set(&mut self, key: &str, value: String) {
        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.params.push((key.to_string(), value)),
        }
    }

    fn enable_facets(&mut self) {
        if self.get("facet").is_none() {
            self.params.push(("facet".to_string(), "true".to_string()));
            self.params
                .push(("facet.mincount".to_string(), "0".to_string()));
        }
    }
}
