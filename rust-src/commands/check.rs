//! Validate seed files without touching the database.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use crate::config::resolve_json_files;
use crate::data::{parse_records, ExtJsonMode};
use crate::models::ImportTarget;


/// What an import would do with one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCheck {
    pub path: PathBuf,
    pub collection: Option<String>,
    pub records: Option<usize>,
    pub error: Option<String>,
}


impl FileCheck {
    pub fn is_ok(&self) -> bool {
        self.collection.is_some() && self.error.is_none()
    }
}


/// Run the check command.
pub fn run(path: &Path, mode: ExtJsonMode, json: bool) -> Result<()> {
    let files = resolve_json_files(path)?;
    let checks = check_files(&files, mode);

    if json {
        println!("{}", serde_json::to_string_pretty(&checks)?);
        return Ok(());
    }

    for check in &checks {
        let name = check
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match (&check.collection, check.records, &check.error) {
            (None, _, _) => {
                println!("\x1b[33m- {name}: skipped (unrecognized file name)\x1b[0m");
            }
            (Some(coll), _, Some(err)) => {
                println!("\x1b[31mx {name} -> {coll}: {err}\x1b[0m");
            }
            (Some(coll), records, None) => {
                println!("\x1b[32m+\x1b[0m {name} -> {coll} ({} records)", records.unwrap_or(0));
            }
        }
    }

    let ok = checks.iter().filter(|c| c.is_ok()).count();
    println!("\n{ok} of {} file(s) ready to import", checks.len());

    Ok(())
}


/// Resolve names and parse each file, collecting one report per file.
pub fn check_files(files: &[PathBuf], mode: ExtJsonMode) -> Vec<FileCheck> {
    files.iter().map(|file| check_file(file, mode)).collect()
}


fn check_file(path: &Path, mode: ExtJsonMode) -> FileCheck {
    let mut check = FileCheck {
        path: path.to_path_buf(),
        collection: None,
        records: None,
        error: None,
    };

    let Some(target) = ImportTarget::from_path(path) else {
        return check;
    };
    check.collection = Some(target.collection);

    let parsed = std::fs::read(path)
        .map_err(|e| format!("failed to read file: {e}"))
        .and_then(|data| parse_records(&data, mode).map_err(|e| e.to_string()));

    match parsed {
        Ok(docs) => check.records = Some(docs.len()),
        Err(e) => check.error = Some(e),
    }

    check
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_check_reports_each_file() {
        let tmp_dir = TempDir::new().unwrap();
        fs::write(tmp_dir.path().join("users.json"), "{\"a\":1}\n{\"a\":2}\n").unwrap();
        fs::write(tmp_dir.path().join("x.orders.json"), "[{\"a\":").unwrap();
        fs::write(tmp_dir.path().join(".json"), "[]").unwrap();

        let files = resolve_json_files(tmp_dir.path()).unwrap();
        let checks = check_files(&files, ExtJsonMode::Canonical);

        // Sorted: ".json", "users.json", "x.orders.json"
        assert_eq!(checks.len(), 3);
        assert_eq!(checks[0].collection, None);
        assert!(!checks[0].is_ok());

        assert_eq!(checks[1].collection.as_deref(), Some("users"));
        assert_eq!(checks[1].records, Some(2));
        assert!(checks[1].is_ok());

        assert_eq!(checks[2].collection.as_deref(), Some("orders"));
        assert!(checks[2].error.as_deref().unwrap().contains("JSON array"));
    }

    #[test]
    fn test_check_serializes_to_json() {
        let check = FileCheck {
            path: PathBuf::from("users.json"),
            collection: Some("users".to_string()),
            records: Some(3),
            error: None,
        };

        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["collection"], "users");
        assert_eq!(json["records"], 3);
        assert!(json["error"].is_null());
    }
}
