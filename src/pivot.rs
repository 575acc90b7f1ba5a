//! Pivot tables: live from the server, or offline from a saved response.
//!
//! `isb pivot` fetches a `facet.pivot` over the requested dimensions and
//! materializes it. `isb materialize` does the same from a JSON file on
//! disk, which may hold either a full select response or the bare pivot
//! node array.

use anyhow::{Context, Result};
use isamples_core::pivot::{extract_pivot_nodes, materialize_pivot, PivotTable};
use isamples_core::FacetPivotNode;
use serde_json::Value;
use std::path::Path;

use crate::client::IsbClient;
use crate::config::Config;
use crate::render::render_pivot_table;

/// Read pivot nodes for `dimensions` from a JSON file.
pub fn load_pivot_nodes<S: AsRef<str>>(path: &Path, dimensions: &[S]) -> Result<Vec<FacetPivotNode>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pivot file: {}", path.display()))?;
    let json: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON in {}", path.display()))?;

    let nodes = match json {
        Value::Array(_) => serde_json::from_value(json)
            .with_context(|| format!("Invalid pivot node array in {}", path.display()))?,
        other => extract_pivot_nodes(&other, dimensions)?,
    };
    Ok(nodes)
}

/// Materialize a saved response without contacting the server.
pub fn materialize_file<S: AsRef<str>>(path: &Path, dimensions: &[S]) -> Result<PivotTable> {
    let nodes = load_pivot_nodes(path, dimensions)?;
    Ok(materialize_pivot(&nodes, dimensions)?)
}

fn print_table(table: &PivotTable, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(table)?);
    } else {
        print!("{}", render_pivot_table(table));
    }
    Ok(())
}

pub async fn run_pivot(config: &Config, q: &str, dimensions: &[String], json: bool) -> Result<()> {
    let client = IsbClient::new(&config.server, config.transport)?;
    let table = client.pivot(q, dimensions).await?;
    print_table(&table, json)
}

pub fn run_materialize(path: &Path, dimensions: &[String], json: bool) -> Result<()> {
    let table = materialize_file(path, dimensions)?;
    print_table(&table, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use isamples_core::PivotError;
    use std::io::Write;

    fn write_json(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_full_response_file() {
        let f = write_json(
            r#"{"facet_counts": {"facet_pivot": {"source,material": [
                {"field": "source", "value": "SESAR", "count": 5, "pivot": [
                    {"field": "material", "value": "Rock", "count": 3},
                    {"field": "material", "value": "Soil", "count": 2}
                ]}
            ]}}}"#,
        );
        let table = materialize_file(f.path(), &["source", "material"]).unwrap();
        assert_eq!(table.shape(), &[1, 2]);
        assert_eq!(table.count(&["SESAR", "Soil"]), Some(2));
    }

    #[test]
    fn test_bare_array_file() {
        let f = write_json(
            r#"[{"field": "source", "value": "GEOME", "count": 1, "pivot": [
                {"field": "material", "value": "Rock", "count": 1}
            ]}]"#,
        );
        let table = materialize_file(f.path(), &["source", "material"]).unwrap();
        assert_eq!(table.total(), 1);
    }

    #[test]
    fn test_mismatched_dimensions_file() {
        let f = write_json(
            r#"[{"field": "source", "value": "GEOME", "count": 1, "pivot": [
                {"field": "material", "value": "Rock", "count": 1}
            ]}]"#,
        );
        let err = materialize_file(f.path(), &["source", "registrant"]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PivotError>(),
            Some(PivotError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_invalid_json_file() {
        let f = write_json("{not json");
        let err = materialize_file(f.path(), &["a", "b"]).unwrap_err();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
