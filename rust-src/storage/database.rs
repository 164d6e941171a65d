//! MongoDB operations for replacing collection contents.

use anyhow::{Context, Result};
use bson::{doc, Document};
use mongodb::{Client, Database};


/// The two operations an import needs from a document database.
///
/// `clear_collection` must complete before `insert_documents` is called for
/// the same collection.
pub trait DocumentStore {
    /// Delete every document in the collection. Returns how many were removed.
    async fn clear_collection(&self, collection: &str) -> Result<u64>;

    /// Insert the documents in order. Returns how many were inserted.
    async fn insert_documents(&self, collection: &str, docs: Vec<Document>) -> Result<usize>;
}


/// A connected MongoDB database.
pub struct MongoStore {
    client: Client,
    db: Database,
}


impl MongoStore {
    /// Connect and verify the server answers a `ping`.
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .context("Mongo connect error: invalid connection string")?;

        let db = client.database(database);
        db.run_command(doc! { "ping": 1 })
            .await
            .context("Mongo connect error: server did not respond to ping")?;

        log::debug!("Connected to database {database}");
        Ok(Self { client, db })
    }

    pub fn database_name(&self) -> &str {
        self.db.name()
    }

    /// Close the connection pool. Consumes the store.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
    }
}


impl DocumentStore for MongoStore {
    async fn clear_collection(&self, collection: &str) -> Result<u64> {
        let result = self
            .db
            .collection::<Document>(collection)
            .delete_many(doc! {})
            .await
            .with_context(|| format!("Failed to clear collection {collection}"))?;
        Ok(result.deleted_count)
    }

    async fn insert_documents(&self, collection: &str, docs: Vec<Document>) -> Result<usize> {
        // The driver rejects empty batches
        if docs.is_empty() {
            return Ok(0);
        }

        let result = self
            .db
            .collection::<Document>(collection)
            .insert_many(docs)
            .await
            .with_context(|| format!("Failed to insert into {collection}"))?;
        Ok(result.inserted_ids.len())
    }
}
