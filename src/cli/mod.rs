//! Command-line interface for histdoc.

mod commands;
mod icons;
mod progress;

pub use commands::{is_verbose, run};
