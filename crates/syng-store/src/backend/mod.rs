use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Map, Value};
use syng_types::RecordId;

mod file;

pub use file::{FileCollection, FileDb};

/// Raw stored record. Always carries an `_id` once inserted.
pub type Document = Map<String, Value>;

pub const ID_FIELD: &str = "_id";

/// Record selector understood by every backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    All,
    Id(RecordId),
}

impl Filter {
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Id(id) => record_id(doc) == Some(*id),
        }
    }
}

pub fn record_id(doc: &Document) -> Option<RecordId> {
    doc.get(ID_FIELD).and_then(Value::as_u64).map(RecordId)
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("I/O error on collection {collection}: {source}")]
    Io {
        collection: String,
        #[source]
        source: io::Error,
    },

    #[error("Collection {collection} is corrupt at line {line}: {reason}")]
    Corrupt {
        collection: String,
        line: usize,
        reason: String,
    },

    #[error("Record is not a JSON object")]
    NotAnObject,

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One named collection of documents
#[async_trait::async_trait]
pub trait Collection: Send + Sync {
    fn name(&self) -> &str;

    /// Store a new record, returning it with its assigned `_id`
    async fn insert(&self, record: Document) -> Result<Document, BackendError>;

    /// Remove every matching record, returning how many were removed
    async fn remove(&self, filter: Filter) -> Result<usize, BackendError>;

    /// All records in insertion order
    async fn find_all(&self) -> Result<Vec<Document>, BackendError>;

    async fn find_one(&self, filter: Filter) -> Result<Option<Document>, BackendError>;

    /// Replace the first matching record, keeping its `_id`.
    /// Returns the number of replaced records.
    async fn update(&self, filter: Filter, record: Document) -> Result<usize, BackendError>;
}

/// Embedded document database: a directory of named collections
#[async_trait::async_trait]
pub trait DocumentDb: Send + Sync {
    /// Open (or reuse) a handle to a collection. Does not touch the disk.
    fn collection(&self, name: &str) -> Arc<dyn Collection>;

    /// Drop cached state so the next access re-reads from storage
    async fn reload(&self);

    /// Forget a cached handle
    fn forget(&self, name: &str);

    fn collection_path(&self, name: &str) -> PathBuf;

    /// Create the storage location if missing
    async fn ensure_storage(&self) -> io::Result<()>;

    async fn collection_exists(&self, name: &str) -> io::Result<bool>;

    /// Create an empty collection. Fails with `AlreadyExists` if present.
    async fn create_collection(&self, name: &str) -> io::Result<()>;

    /// Delete a collection and everything in it
    async fn drop_collection(&self, name: &str) -> io::Result<()>;
}
