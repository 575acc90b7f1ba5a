//! `isb fields` and `isb count`.

use anyhow::Result;

use crate::client::IsbClient;
use crate::config::Config;

pub async fn run_fields(config: &Config) -> Result<()> {
    let client = IsbClient::new(&config.server, config.transport)?;
    for field in client.field_names().await? {
        println!("{}", field);
    }
    Ok(())
}

pub async fn run_count(config: &Config, q: &str) -> Result<()> {
    let client = IsbClient::new(&config.server, config.transport)?;
    println!("{}", client.record_count(q).await?);
    Ok(())
}
