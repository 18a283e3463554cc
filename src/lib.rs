//! callfix: targeted call-site argument patcher
//!
//! This library exposes the patching engine and its file wrapper for the
//! binary at src/main.rs and for the property-based tests.

pub mod cli;
pub mod config;
pub mod diff_formatter;
pub mod error_helpers;
pub mod file_processor;
pub mod logger;
pub mod patcher;

// Re-export commonly used types for convenience
pub use file_processor::{ChangeType, FileDiff, LinePatcher};
pub use patcher::{Insertion, PatchOutcome, PatchRule, join_lines, patch_lines, split_lines};
