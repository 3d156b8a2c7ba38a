//! histdoc - historical document ingestion and entity extraction.
//!
//! This library provides the core functionality for turning scanned historical
//! PDFs into enriched, searchable records. It can be used as a standalone
//! library or through the `histdoc` CLI.

pub mod cli;
pub mod config;
pub mod extraction;
pub mod models;
pub mod pdf;
pub mod reference;
pub mod services;
pub mod store;
pub mod utils;
