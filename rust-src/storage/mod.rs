//! Storage layer: the document database the seed files are loaded into.

mod database;

pub use database::{DocumentStore, MongoStore};
