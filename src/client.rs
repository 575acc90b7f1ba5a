//! HTTP client for the iSamples central Solr index.
//!
//! [`IsbClient`] wraps a `reqwest::Client` with the base URL, headers and
//! timeout from [`ServerConfig`], and a [`TransportPolicy`] that decides per
//! request whether select parameters travel as a GET query string or a
//! form-encoded POST body.
//!
//! # Endpoints
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | [`field_names`](IsbClient::field_names) | `thing/select/info` | schema field names |
//! | [`record_count`](IsbClient::record_count) | `thing/select` | `numFound` for a query |
//! | [`facets`](IsbClient::facets) | `thing/select` | flat facet counts |
//! | [`pivot`](IsbClient::pivot) | `thing/select` | N-dimensional pivot table |
//!
//! Requests are not retried and carry no credentials.

use anyhow::{bail, Context, Result};
use isamples_core::facets::{parse_facet_fields, FacetCounts};
use isamples_core::pivot::{extract_pivot_nodes, materialize_pivot, PivotError, PivotTable};
use isamples_core::query::SelectQuery;
use isamples_core::transport::{RequestMethod, TransportPolicy, FORM_CONTENT_TYPE};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;

const SELECT_PATH: &str = "thing/select";
const INFO_PATH: &str = "thing/select/info";

/// Longest slice of an error body included in error messages.
const MAX_ERROR_BODY: usize = 512;

pub struct IsbClient {
    base: Url,
    http: reqwest::Client,
    policy: TransportPolicy,
}

/// Trim spaces and slashes from both ends, then end with exactly one `/`
/// so relative endpoint paths join underneath it.
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim_matches(|c: char| c == ' ' || c == '/');
    let url = Url::parse(&format!("{}/", trimmed))
        .with_context(|| format!("invalid iSamples server URL: '{}'", raw))?;
    Ok(url)
}

impl IsbClient {
    pub fn new(server: &ServerConfig, policy: TransportPolicy) -> Result<Self> {
        let base = normalize_base_url(&server.url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(server.timeout_secs))
            .user_agent(server.user_agent.clone())
            .default_headers(headers)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { base, http, policy })
    }

    /// Run a select query, choosing GET or POST by encoded size.
    pub async fn select(&self, query: &SelectQuery) -> Result<Value> {
        let mut url = self.base.join(SELECT_PATH)?;
        let encoded = query.encode();
        let method = self.policy.method_for(query);
        debug!(
            method = method.as_str(),
            encoded_len = encoded.len(),
            threshold = self.policy.post_threshold_bytes,
            "select transport"
        );

        let request = match method {
            RequestMethod::Get => {
                url.set_query(Some(&encoded));
                self.http.get(url)
            }
            RequestMethod::Post => self
                .http
                .post(url)
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(encoded),
        };
        self.send(request).await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let response = request
            .send()
            .await
            .context("request to iSamples server failed")?;

        let status = response.status();
        let url = response.url().clone();
        info!(url = %url, status = status.as_u16(), "isamples response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            warn!(url = %url, status = status.as_u16(), "isamples request failed");
            bail!("iSamples server returned {} for {}: {}", status, url, body);
        }

        response
            .json::<Value>()
            .await
            .with_context(|| format!("invalid JSON in response from {}", url))
    }

    /// Field names from the Solr schema, sorted.
    pub async fn field_names(&self) -> Result<Vec<String>> {
        let url = self.base.join(INFO_PATH)?;
        let response = self.send(self.http.get(url)).await?;
        let mut fields: Vec<String> = response
            .get("schema")
            .and_then(|s| s.get("fields"))
            .and_then(|f| f.as_object())
            .map(|obj| obj.keys().cloned().collect())
            .unwrap_or_default();
        fields.sort();
        Ok(fields)
    }

    /// Number of records matching `q`.
    pub async fn record_count(&self, q: &str) -> Result<u64> {
        let response = self.select(&SelectQuery::new(q)).await?;
        response
            .get("response")
            .and_then(|r| r.get("numFound"))
            .and_then(|n| n.as_u64())
            .context("response has no response.numFound")
    }

    /// Flat facet counts for `fields` over the records matching `q`.
    pub async fn facets<S: AsRef<str>>(&self, q: &str, fields: &[S]) -> Result<FacetCounts> {
        let query = SelectQuery::new(q).facet_fields(fields);
        let response = self.select(&query).await?;
        Ok(parse_facet_fields(&response, fields)?)
    }

    /// Pivot table of counts across `dimensions` for the records matching `q`.
    ///
    /// The dimension count is checked before any request is sent.
    pub async fn pivot<S: AsRef<str>>(&self, q: &str, dimensions: &[S]) -> Result<PivotTable> {
        if dimensions.len() < 2 {
            return Err(PivotError::InvalidArgument(format!(
                "at least two dimensions required for pivot, got {}",
                dimensions.len()
            ))
            .into());
        }
        let query = SelectQuery::new(q).facet_pivot(dimensions);
        let response = self.select(&query).await?;
        let nodes = extract_pivot_nodes(&response, dimensions)?;
        Ok(materialize_pivot(&nodes, dimensions)?)
    }
}
