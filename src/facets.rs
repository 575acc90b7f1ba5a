//! `isb facets`: flat facet counts for one or more fields.

use anyhow::{bail, Result};

use crate::client::IsbClient;
use crate::config::Config;
use crate::render::render_facets;

pub async fn run_facets(config: &Config, q: &str, fields: &[String], json: bool) -> Result<()> {
    if fields.is_empty() {
        bail!("at least one --field is required");
    }
    let client = IsbClient::new(&config.server, config.transport)?;
    let counts = client.facets(q, fields).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
    } else {
        print!("{}", render_facets(&counts));
    }
    Ok(())
}
