//! Data models for import targets and per-file results.

mod import_target;

pub use import_target::{FailureStage, FileOutcome, ImportSummary, ImportTarget};
