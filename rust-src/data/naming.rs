//! Collection name derivation from source file names.

use std::path::Path;

use crate::config::JSON_SUFFIX;


/// Derive the destination collection from a file path.
///
/// `users.json` maps to `users` and `dump.2024.orders.json` maps to `orders`:
/// the segment just before the trailing `json` segment wins. Returns `None`
/// for names without the suffix and for names whose collection segment is
/// empty (`.json`, `a..json`).
pub fn extract_collection_name(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    if !name.ends_with(JSON_SUFFIX) {
        return None;
    }

    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() < 2 {
        return None;
    }

    let collection = parts[parts.len() - 2];
    if collection.is_empty() {
        return None;
    }

    Some(collection.to_string())
}
