//! Console progress for ingestion runs.

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::icons::{dim_arrow, error, info, skipped, success};
use crate::services::PipelineEvent;
use crate::utils::format_size;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}) {msg}";

fn batch_bar(items: usize, batch: usize, batches: usize) -> ProgressBar {
    let pb = ProgressBar::new(items as u64);
    if let Ok(style) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(format!("batch {}/{}", batch, batches));
    pb
}

/// Print a line without tearing the active bar.
fn print_above(pb: Option<&ProgressBar>, line: String) {
    match pb {
        Some(pb) => pb.suspend(|| eprintln!("{}", line)),
        None => eprintln!("{}", line),
    }
}

/// Render pipeline events until the sender side is dropped. One bar per
/// batch; failures and skips are printed above it.
pub fn spawn_event_handler(mut event_rx: mpsc::Receiver<PipelineEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut batches = 0;
        let mut bar: Option<ProgressBar> = None;

        while let Some(event) = event_rx.recv().await {
            match event {
                PipelineEvent::RunStarted {
                    total_items,
                    batches: count,
                } => {
                    batches = count;
                    println!(
                        "{} Ingesting {} items in {} batches",
                        info(),
                        total_items,
                        count
                    );
                }
                PipelineEvent::BatchStarted { batch, items } => {
                    bar = Some(batch_bar(items, batch, batches));
                }
                PipelineEvent::ItemStarted { identifier } => {
                    if let Some(pb) = &bar {
                        pb.set_message(identifier);
                    }
                }
                PipelineEvent::Downloaded { identifier, bytes } => {
                    print_above(
                        bar.as_ref(),
                        format!(
                            "  {} Downloaded {} ({})",
                            dim_arrow(),
                            identifier,
                            format_size(bytes)
                        ),
                    );
                }
                PipelineEvent::ItemCompleted { .. } => {
                    if let Some(pb) = &bar {
                        pb.inc(1);
                    }
                }
                PipelineEvent::ItemSkipped { identifier, reason } => {
                    print_above(
                        bar.as_ref(),
                        format!("  {} {}: {}", skipped(), identifier, reason),
                    );
                    if let Some(pb) = &bar {
                        pb.inc(1);
                    }
                }
                PipelineEvent::ItemFailed { identifier, error: e } => {
                    print_above(
                        bar.as_ref(),
                        format!("  {} {}: {}", error(), identifier, e),
                    );
                    if let Some(pb) = &bar {
                        pb.inc(1);
                    }
                }
                PipelineEvent::BatchCompleted {
                    batch,
                    processed,
                    errors,
                    skipped: skipped_count,
                } => {
                    if let Some(pb) = bar.take() {
                        pb.finish_and_clear();
                    }
                    println!(
                        "{} Batch {}/{}: {} processed, {} failed, {} skipped",
                        success(),
                        batch,
                        batches,
                        processed,
                        errors,
                        skipped_count
                    );
                }
            }
        }

        if let Some(pb) = bar.take() {
            pb.finish_and_clear();
        }
    })
}
