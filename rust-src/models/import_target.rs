//! Import target and outcome models.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::data::extract_collection_name;


/// A source file paired with the collection it replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTarget {
    pub path: PathBuf,
    pub collection: String,
}


impl ImportTarget {
    /// Build a target from a file path, or `None` when the file name does not
    /// follow the `<name>.json` / `<anything>.<name>.json` convention.
    pub fn from_path(path: &Path) -> Option<Self> {
        let collection = extract_collection_name(path)?;
        Some(Self {
            path: path.to_path_buf(),
            collection,
        })
    }

    /// Final path segment, for display.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}


/// Step of the per-file pipeline at which a file was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Read,
    Parse,
    Clear,
    Insert,
    Timeout,
}


impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Read => "read",
            Self::Parse => "parse",
            Self::Clear => "clear",
            Self::Insert => "insert",
            Self::Timeout => "timeout",
        };
        f.write_str(s)
    }
}


/// Result of processing one file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Imported {
        collection: String,
        cleared: u64,
        inserted: usize,
    },
    Skipped {
        path: PathBuf,
    },
    Failed {
        collection: String,
        stage: FailureStage,
        error: String,
    },
}


/// Totals across a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
    pub documents: usize,
}


impl ImportSummary {
    /// Fold one file's outcome into the totals.
    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Imported { inserted, .. } => {
                self.imported += 1;
                self.documents += inserted;
            }
            FileOutcome::Skipped { .. } => self.skipped += 1,
            FileOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn total_files(&self) -> usize {
        self.imported + self.skipped + self.failed
    }
}
