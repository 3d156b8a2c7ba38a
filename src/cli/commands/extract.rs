//! Single-file commands: `validate` and `extract`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use console::style;

use crate::cli::icons::{dim_arrow, error, info, success};
use crate::config::Settings;
use crate::extraction::EntityExtractor;
use crate::models::{EnrichedDocument, WorkItem};
use crate::pdf::TextExtractor;
use crate::reference::ReferenceData;
use crate::services::pipeline::{enrich, Extraction};
use crate::utils::format_size;

/// Entities listed per kind in the human summary.
const SHOWN_PER_KIND: usize = 5;

/// Exit non-zero unless `pdf` passes validation.
pub async fn cmd_validate(settings: &Settings, pdf: &Path) -> anyhow::Result<()> {
    let extractor = TextExtractor::from_settings(&settings.pdf);
    let path = pdf.to_path_buf();
    let result = tokio::task::spawn_blocking(move || extractor.check(&path)).await?;

    match result {
        Ok(pages) => {
            println!(
                "{} {} is a valid PDF ({} pages)",
                success(),
                pdf.display(),
                pages
            );
            Ok(())
        }
        Err(e) => {
            println!("{} {}: {}", error(), pdf.display(), e);
            anyhow::bail!("{} failed validation", pdf.display())
        }
    }
}

/// Extract one file and print a summary, the JSON document or page text.
pub async fn cmd_extract(
    settings: &Settings,
    reference: Arc<ReferenceData>,
    pdf: &Path,
    json: bool,
    pages: bool,
) -> anyhow::Result<()> {
    let extractor = TextExtractor::from_settings(&settings.pdf);
    let path = pdf.to_path_buf();

    if pages {
        let pages = tokio::task::spawn_blocking(move || extractor.extract_pages(&path))
            .await?
            .with_context(|| format!("Failed to extract {}", pdf.display()))?;
        for page in pages {
            println!("{}", style(format!("--- page {} ---", page.number)).dim());
            println!("{}", page.text);
        }
        return Ok(());
    }

    let engine = EntityExtractor::new(reference, settings.extraction.clone());
    let document = tokio::task::spawn_blocking(move || build_document(&extractor, &engine, path))
        .await?
        .with_context(|| format!("Failed to extract {}", pdf.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        print_document(&document);
    }
    Ok(())
}

fn build_document(
    extractor: &TextExtractor,
    engine: &EntityExtractor,
    path: PathBuf,
) -> anyhow::Result<EnrichedDocument> {
    let (text, metadata) = extractor.analyze(&path)?;
    let entities = engine.extract_all(&text.text);
    let item = WorkItem::from_local_file(&path);
    let id = item
        .document_id()
        .unwrap_or_else(|| metadata.filename.clone());
    Ok(enrich(
        id,
        &item,
        &path,
        Extraction {
            text,
            metadata,
            entities,
        },
    ))
}

fn print_document(doc: &EnrichedDocument) {
    let meta = &doc.pdf_metadata;
    let stats = &doc.text_statistics;

    println!("{} {}", info(), style(&doc.title).bold());
    println!("  {} Id:       {}", dim_arrow(), doc.id);
    println!("  {} Author:   {}", dim_arrow(), doc.author);
    if let Some(year) = doc.year {
        println!("  {} Year:     {}", dim_arrow(), year);
    }
    if let Some(region) = &doc.region {
        println!("  {} Region:   {}", dim_arrow(), region);
    }
    println!(
        "  {} File:     {} ({}, {} pages)",
        dim_arrow(),
        meta.filename,
        format_size(meta.file_size_bytes),
        meta.page_count
    );
    println!(
        "  {} Text:     {} chars, {} words via {}",
        dim_arrow(),
        stats.char_count,
        stats.word_count,
        doc.extraction_method.as_str()
    );

    let entities = &doc.entities;
    println!();
    println!("{} Dates ({})", success(), entities.dates.len());
    for date in entities.dates.iter().take(SHOWN_PER_KIND) {
        let years = match date.year_end {
            Some(end) => format!("{}-{}", date.year, end),
            None => date.year.to_string(),
        };
        println!(
            "  {} {} \"{}\" ({}, {:.2})",
            dim_arrow(),
            years,
            date.source_span,
            date.kind.as_str(),
            date.confidence
        );
    }

    println!("{} Names ({})", success(), entities.names.len());
    for name in entities.names.iter().take(SHOWN_PER_KIND) {
        println!(
            "  {} {} ({:.2})",
            dim_arrow(),
            name.full_name,
            name.confidence
        );
    }

    println!("{} Places ({})", success(), entities.places.len());
    for place in entities.places.iter().take(SHOWN_PER_KIND) {
        println!(
            "  {} {}, {} ({}, {:.2})",
            dim_arrow(),
            place.location,
            place.region,
            place.match_kind.as_str(),
            place.confidence
        );
    }

    println!("{} Themes ({})", success(), entities.themes.len());
    for theme in entities.themes.iter().take(SHOWN_PER_KIND) {
        println!(
            "  {} {} ({:.2}): {}",
            dim_arrow(),
            theme.category,
            theme.relevance_score,
            theme.matched_keywords.join(", ")
        );
    }
}
