//! Store management commands.

use anyhow::Context;
use console::style;

use crate::cli::icons::{dim_arrow, info, success, warn};
use crate::config::Settings;
use crate::store::build_store;

/// Create the index, recreating it when `force` is set.
pub async fn cmd_index_init(settings: &Settings, force: bool) -> anyhow::Result<()> {
    let store = build_store(&settings.store)?;
    if force {
        println!("{} Recreating {} index", warn(), store.name());
    }
    store.prepare(force).await?;
    println!("{} Index ready ({})", success(), store.name());
    Ok(())
}

pub async fn cmd_index_health(settings: &Settings) -> anyhow::Result<()> {
    let store = build_store(&settings.store)?;
    let status = store.health().await?;
    println!("{} {}: {}", info(), store.name(), status);
    Ok(())
}

pub async fn cmd_get(settings: &Settings, id: &str) -> anyhow::Result<()> {
    let store = build_store(&settings.store)?;
    match store.get(id).await? {
        Some(document) => println!("{}", serde_json::to_string_pretty(&document)?),
        None => anyhow::bail!("Document not found: {}", id),
    }
    Ok(())
}

pub async fn cmd_delete(settings: &Settings, id: &str) -> anyhow::Result<()> {
    let store = build_store(&settings.store)?;
    if store.delete(id).await? {
        println!("{} Deleted {}", success(), id);
    } else {
        println!("{} No document with id {}", warn(), id);
    }
    Ok(())
}

/// Pass a JSON query to the store and list the hits.
pub async fn cmd_search(settings: &Settings, query: &str) -> anyhow::Result<()> {
    let query: serde_json::Value =
        serde_json::from_str(query).context("Search query must be valid JSON")?;
    let store = build_store(&settings.store)?;
    let hits = store.search(&query).await?;

    println!("{} {} hits", info(), hits.total);
    for hit in &hits.hits {
        let title = hit.source["title"].as_str().unwrap_or("");
        let score = hit
            .score
            .map(|s| format!("{:.2}", s))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {} {} {} {}",
            dim_arrow(),
            style(&hit.id).bold(),
            style(score).dim(),
            title
        );
    }
    Ok(())
}
