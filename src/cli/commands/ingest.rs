//! The `ingest` command.

use std::sync::Arc;

use console::style;
use tokio::sync::mpsc;

use crate::cli::icons::{dim_arrow, error, info, skipped, success, warn};
use crate::cli::progress::spawn_event_handler;
use crate::config::Settings;
use crate::reference::ReferenceData;
use crate::services::{CancelFlag, Pipeline, PipelineEvent, RunOptions, RunSummary};
use crate::store::build_store;
use crate::utils::format_duration;

/// Command-line overrides for a run.
pub struct IngestArgs {
    pub batch_size: Option<usize>,
    pub workers: Option<usize>,
    pub force_reindex: bool,
    pub local_only: bool,
    pub limit: Option<usize>,
}

impl IngestArgs {
    fn options(&self, settings: &Settings) -> RunOptions {
        let defaults = RunOptions::from_settings(&settings.pipeline);
        RunOptions {
            batch_size: self.batch_size.unwrap_or(defaults.batch_size),
            max_workers: self.workers.unwrap_or(defaults.max_workers),
            force_reindex: self.force_reindex,
            local_only: self.local_only,
            limit: self.limit.filter(|&l| l > 0),
        }
    }
}

/// Run the ingestion pipeline and print its summary.
pub async fn cmd_ingest(
    settings: &Settings,
    reference: Arc<ReferenceData>,
    args: IngestArgs,
) -> anyhow::Result<()> {
    let options = args.options(settings);
    let store = build_store(&settings.store)?;

    println!(
        "{} Store: {} | batch size {} | {} workers",
        info(),
        store.name(),
        options.batch_size,
        options.max_workers
    );
    if options.force_reindex {
        println!("  {} Recreating index before ingesting", warn());
    }

    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!(
                "{} Interrupted, stopping after the current batch",
                warn()
            );
            flag.cancel();
        }
    });

    let (event_tx, event_rx) = mpsc::channel::<PipelineEvent>(100);
    let event_handler = spawn_event_handler(event_rx);

    // The pipeline owns the only sender; dropping it ends the handler.
    let summary = {
        let pipeline = Pipeline::new(settings, reference, store)?.with_events(event_tx);
        pipeline.ingest(&options, &cancel).await?
    };
    let _ = event_handler.await;

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let stats = &summary.stats;
    println!();
    if summary.cancelled {
        println!(
            "{} Run cancelled: {} items not started",
            warn(),
            summary.unstarted()
        );
    }
    println!(
        "{} Finished in {}",
        success(),
        format_duration(summary.elapsed)
    );
    println!("  {} Total:     {}", dim_arrow(), stats.total);
    println!(
        "  {} Processed: {}",
        dim_arrow(),
        style(stats.processed).green()
    );
    println!("  {} Failed:    {}", dim_arrow(), style(stats.errors).red());
    println!(
        "  {} Skipped:   {}",
        dim_arrow(),
        style(stats.skipped).yellow()
    );
    println!("  {} Downloads: {}", dim_arrow(), summary.downloads);

    if stats.errors_detail.is_empty() {
        return;
    }
    println!();
    println!("{} Problems:", error());
    for (identifier, reason) in stats.displayed_errors() {
        println!("  {} {}: {}", skipped(), identifier, reason);
    }
    let hidden = stats.errors_detail.len() - stats.displayed_errors().len();
    if hidden > 0 {
        println!("  {} ... and {} more", dim_arrow(), hidden);
    }
}
