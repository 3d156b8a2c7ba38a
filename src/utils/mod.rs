//! Shared utility functions.
//!
//! - `atomic`: temp-file-and-rename writes
//! - `filename`: filesystem-safe names and deterministic document ids
//! - `format`: human-readable formatting (sizes, etc.)

mod atomic;
mod filename;
mod format;

pub use atomic::write_atomic;
pub use filename::{document_id, sanitize_filename};
pub use format::{format_duration, format_size};
