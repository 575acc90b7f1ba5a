//! GET/POST selection for select requests.
//!
//! Long Solr queries (many `fq`/`facet.field` values, large `fl` lists)
//! overflow URL limits on the server's HTTP front end. The client sends a
//! form-encoded POST instead once the encoded parameters exceed
//! [`TransportPolicy::post_threshold_bytes`].

use serde::{Deserialize, Serialize};

use crate::query::SelectQuery;

/// Content type for POSTed select parameters.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
}

impl RequestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportPolicy {
    /// Largest encoded parameter size still sent as a GET.
    #[serde(default = "default_post_threshold")]
    pub post_threshold_bytes: usize,
}

fn default_post_threshold() -> usize {
    2048
}

impl Default for TransportPolicy {
    fn default() -> Self {
        Self {
            post_threshold_bytes: default_post_threshold(),
        }
    }
}

impl TransportPolicy {
    pub fn method_for(&self, query: &SelectQuery) -> RequestMethod {
        if query.encoded_len() > self.post_threshold_bytes {
            RequestMethod::Post
        } else {
            RequestMethod::Get
        }
    }
}
