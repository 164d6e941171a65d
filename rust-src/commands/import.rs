//! Import seed files into their collections, replacing existing contents.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use bson::Document;

use crate::config::{resolve_json_files, ImportSettings};
use crate::data::{parse_records, ExtJsonMode};
use crate::models::{FailureStage, FileOutcome, ImportSummary, ImportTarget};
use crate::storage::{DocumentStore, MongoStore};


/// Run the import command.
///
/// Resolving the path and connecting are fatal; every per-file problem is
/// logged and the run moves on to the next file.
pub async fn run(settings: ImportSettings) -> Result<()> {
    let files = resolve_json_files(&settings.path)?;

    let store = MongoStore::connect(&settings.uri, &settings.database).await?;
    log::info!(
        "Connected to {}; {} file(s) to import",
        store.database_name(),
        files.len()
    );

    let summary = run_import(&store, &files, settings.mode, settings.timeout).await;
    store.shutdown().await;

    println!(
        "All imports completed: {} file(s), {} imported ({} docs), {} skipped, {} failed",
        summary.total_files(),
        summary.imported,
        summary.documents,
        summary.skipped,
        summary.failed
    );

    Ok(())
}


/// Import each file in turn and total the outcomes.
pub async fn run_import<S: DocumentStore>(
    store: &S,
    files: &[PathBuf],
    mode: ExtJsonMode,
    timeout: Duration,
) -> ImportSummary {
    let mut summary = ImportSummary::default();

    for file in files {
        let outcome = import_file(store, file, mode, timeout).await;
        summary.record(&outcome);
    }

    summary
}


/// Read, parse, clear, and insert a single file.
pub async fn import_file<S: DocumentStore>(
    store: &S,
    path: &Path,
    mode: ExtJsonMode,
    timeout: Duration,
) -> FileOutcome {
    let Some(target) = ImportTarget::from_path(path) else {
        log::warn!("Skipping unrecognized file: {}", path.display());
        return FileOutcome::Skipped {
            path: path.to_path_buf(),
        };
    };

    log::info!("Importing {} -> collection: {}", target.file_name(), target.collection);

    let data = match tokio::fs::read(&target.path).await {
        Ok(data) => data,
        Err(e) => {
            log::error!("Failed to read file: {} ({e})", path.display());
            return failed(&target, FailureStage::Read, e.to_string());
        }
    };

    // Parse fully before touching the collection
    let docs = match parse_records(&data, mode) {
        Ok(docs) => docs,
        Err(e) => {
            log::error!("Failed to parse Extended JSON in {}: {e}", path.display());
            return failed(&target, FailureStage::Parse, e.to_string());
        }
    };

    let replace = replace_collection(store, &target.collection, docs);
    match tokio::time::timeout(timeout, replace).await {
        Ok(Ok((cleared, inserted))) => {
            log::info!("Inserted {inserted} docs into {}", target.collection);
            FileOutcome::Imported {
                collection: target.collection,
                cleared,
                inserted,
            }
        }
        Ok(Err((stage, e))) => {
            log::error!("Import into {} failed at {stage}: {e:#}", target.collection);
            failed(&target, stage, format!("{e:#}"))
        }
        Err(_) => {
            log::error!(
                "Import into {} timed out after {}s",
                target.collection,
                timeout.as_secs_f64()
            );
            failed(
                &target,
                FailureStage::Timeout,
                format!("timed out after {timeout:?}"),
            )
        }
    }
}


/// Delete everything in the collection, then insert the new documents.
async fn replace_collection<S: DocumentStore>(
    store: &S,
    collection: &str,
    docs: Vec<Document>,
) -> Result<(u64, usize), (FailureStage, anyhow::Error)> {
    let cleared = store
        .clear_collection(collection)
        .await
        .map_err(|e| (FailureStage::Clear, e))?;

    let inserted = store
        .insert_documents(collection, docs)
        .await
        .map_err(|e| (FailureStage::Insert, e))?;

    Ok((cleared, inserted))
}


fn failed(target: &ImportTarget, stage: FailureStage, error: String) -> FileOutcome {
    FileOutcome::Failed {
        collection: target.collection.clone(),
        stage,
        error,
    }
}
