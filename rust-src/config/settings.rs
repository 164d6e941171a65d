//! Import settings, constants, and source file resolution.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::data::ExtJsonMode;


/// Suffix a file must carry to be imported.
pub const JSON_SUFFIX: &str = ".json";

/// Deadline for the clear+insert pair of a single file (seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;


/// Everything one import run needs, resolved from flags and environment.
#[derive(Debug, Clone)]
pub struct ImportSettings {
    pub uri: String,
    pub database: String,
    pub path: PathBuf,
    pub timeout: Duration,
    pub mode: ExtJsonMode,
}


/// Load a `.env` file from the working directory, if there is one.
///
/// Returns the path that was loaded, or `None` when there is no file.
/// Variables already set in the process environment win over the file.
pub fn load_dotenv() -> Result<Option<PathBuf>> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e).context("Failed to load .env file"),
    }
}


/// Resolve the configured path into the list of files to import.
///
/// A directory yields its immediate children ending in `.json`, sorted by
/// name. A regular file yields itself; its name is checked later when the
/// collection is derived. A missing or unreadable path is an error.
pub fn resolve_json_files(path: &Path) -> Result<Vec<PathBuf>> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Invalid JSON path: {}", path.display()))?;

    if !metadata.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let entries = std::fs::read_dir(path)
        .with_context(|| format!("Failed to read directory: {}", path.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry in {}: {e}", path.display());
                continue;
            }
        };

        let file = entry.path();
        if file.is_file() && has_json_suffix(&file) {
            files.push(file);
        }
    }

    files.sort();
    Ok(files)
}


fn has_json_suffix(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map_or(false, |n| n.ends_with(JSON_SUFFIX))
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_constants() {
        assert_eq!(JSON_SUFFIX, ".json");
        assert_eq!(DEFAULT_TIMEOUT_SECS, 30);
    }

    #[test]
    fn test_directory_lists_json_children_sorted() {
        let tmp_dir = TempDir::new().unwrap();
        fs::write(tmp_dir.path().join("users.json"), "[]").unwrap();
        fs::write(tmp_dir.path().join("a.orders.json"), "[]").unwrap();
        fs::write(tmp_dir.path().join("notes.txt"), "x").unwrap();
        fs::write(tmp_dir.path().join("upper.JSON"), "[]").unwrap();

        let files = resolve_json_files(tmp_dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.orders.json", "users.json"]);
    }

    #[test]
    fn test_directory_does_not_recurse() {
        let tmp_dir = TempDir::new().unwrap();
        let nested = tmp_dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("inner.json"), "[]").unwrap();
        fs::create_dir(tmp_dir.path().join("dir.json")).unwrap();

        assert!(resolve_json_files(tmp_dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_single_file_is_returned_as_is() {
        let tmp_dir = TempDir::new().unwrap();
        let file = tmp_dir.path().join("dump.txt");
        fs::write(&file, "{}").unwrap();

        assert_eq!(resolve_json_files(&file).unwrap(), vec![file]);
    }

    #[test]
    fn test_has_json_suffix() {
        assert!(has_json_suffix(Path::new("/x/users.json")));
        assert!(!has_json_suffix(Path::new("/x/users.json.bak")));
    }

    #[test]
    fn test_missing_path_is_error() {
        let tmp_dir = TempDir::new().unwrap();
        let missing = tmp_dir.path().join("nope");

        let err = resolve_json_files(&missing).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON path"));
    }
}
