//! The `check-config` command.

use crate::cli::icons::{dim_arrow, info, success};
use crate::config::Settings;
use crate::reference::ReferenceData;

/// Load every reference dataset and print its size.
pub async fn cmd_check_config(settings: &Settings) -> anyhow::Result<()> {
    match &settings.source_path {
        Some(path) => println!("{} Config: {}", info(), path.display()),
        None => println!("{} Config: built-in defaults", info()),
    }
    println!(
        "{} Reference data: {}",
        info(),
        settings.reference_dir.display()
    );

    let dir = settings.reference_dir.clone();
    let data = tokio::task::spawn_blocking(move || ReferenceData::load(&dir)).await??;

    println!("{} Reference data is valid", success());
    println!(
        "  {} First names:  {}",
        dim_arrow(),
        data.names.first_names().len()
    );
    println!(
        "  {} Last names:   {}",
        dim_arrow(),
        data.names.last_names().len()
    );
    println!("  {} Places:       {}", dim_arrow(), data.places.len());
    println!("  {} Themes:       {}", dim_arrow(), data.themes.len());
    println!(
        "  {} Store:        {:?} at {}",
        dim_arrow(),
        settings.store.kind,
        settings.store.url
    );
    Ok(())
}
