use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use syng_config::persist::write_atomic;
use tokio::fs::{self, OpenOptions};
use tokio::sync::Mutex as AsyncMutex;

use super::{BackendError, Collection, Document, DocumentDb, Filter, ID_FIELD, record_id};

/// File-backed database: every collection is a file named after it inside
/// `dir`, holding one JSON record per line.
pub struct FileDb {
    dir: PathBuf,
    collections: Mutex<HashMap<String, Arc<FileCollection>>>,
}

impl FileDb {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            collections: Mutex::new(HashMap::new()),
        }
    }

    fn open_collections(&self) -> Vec<Arc<FileCollection>> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl DocumentDb for FileDb {
    fn collection(&self, name: &str) -> Arc<dyn Collection> {
        let mut collections = self.collections.lock().unwrap_or_else(PoisonError::into_inner);
        let collection = collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(FileCollection::new(name, self.dir.join(name))));

        collection.clone()
    }

    async fn reload(&self) {
        let collections = self.open_collections();
        tracing::debug!("Reloading {} open collections", collections.len());

        for collection in collections {
            collection.invalidate().await;
        }
    }

    fn forget(&self, name: &str) {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }

    fn collection_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    async fn ensure_storage(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    async fn collection_exists(&self, name: &str) -> io::Result<bool> {
        fs::try_exists(self.collection_path(name)).await
    }

    async fn create_collection(&self, name: &str) -> io::Result<()> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.collection_path(name))
            .await?;

        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> io::Result<()> {
        fs::remove_file(self.collection_path(name)).await?;
        self.forget(name);
        Ok(())
    }
}

struct Loaded {
    docs: Vec<Document>,
    next_id: u64,
}

/// Reads are served from a cache kept until [`FileCollection::invalidate`].
/// Writes re-read the file under the collection lock and replace it whole,
/// so records added by another session keep their ids and are never dropped.
pub struct FileCollection {
    name: String,
    path: PathBuf,
    state: AsyncMutex<Option<Loaded>>,
}

impl FileCollection {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            state: AsyncMutex::new(None),
        }
    }

    pub async fn invalidate(&self) {
        *self.state.lock().await = None;
    }

    fn io_error(&self, source: io::Error) -> BackendError {
        BackendError::Io {
            collection: self.name.clone(),
            source,
        }
    }

    async fn loaded<'a>(&self, slot: &'a mut Option<Loaded>) -> Result<&'a mut Loaded, BackendError> {
        let loaded = match slot.take() {
            Some(loaded) => loaded,
            None => self.read_file().await?,
        };

        Ok(slot.insert(loaded))
    }

    /// Replace the cache with what is on disk right now
    async fn reloaded<'a>(&self, slot: &'a mut Option<Loaded>) -> Result<&'a mut Loaded, BackendError> {
        *slot = None;
        let loaded = self.read_file().await?;
        Ok(slot.insert(loaded))
    }

    async fn read_file(&self) -> Result<Loaded, BackendError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(self.io_error(e)),
        };

        let mut docs = Vec::new();
        let mut next_id = 1;

        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let corrupt = |reason: String| BackendError::Corrupt {
                collection: self.name.clone(),
                line: idx + 1,
                reason,
            };

            let doc: Document = serde_json::from_str(line).map_err(|e| corrupt(e.to_string()))?;
            let id = record_id(&doc).ok_or_else(|| corrupt("record has no numeric _id".to_string()))?;

            next_id = next_id.max(id.0 + 1);
            docs.push(doc);
        }

        tracing::trace!("Read {} records from {}", docs.len(), self.path.display());
        Ok(Loaded { docs, next_id })
    }

    async fn rewrite(&self, docs: &[Document]) -> Result<(), BackendError> {
        let mut contents = Vec::new();
        for doc in docs {
            serde_json::to_writer(&mut contents, doc)?;
            contents.push(b'\n');
        }

        write_atomic(self.path.clone(), contents)
            .await
            .map_err(|e| self.io_error(e))
    }
}

#[async_trait::async_trait]
impl Collection for FileCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert(&self, mut record: Document) -> Result<Document, BackendError> {
        let mut state = self.state.lock().await;
        let loaded = self.reloaded(&mut state).await?;

        let id = loaded.next_id;
        record.insert(ID_FIELD.to_string(), Value::from(id));

        let mut docs = loaded.docs.clone();
        docs.push(record.clone());
        self.rewrite(&docs).await?;

        loaded.next_id = id + 1;
        loaded.docs = docs;

        tracing::trace!("Inserted record {id} into {}", self.name);
        Ok(record)
    }

    async fn remove(&self, filter: Filter) -> Result<usize, BackendError> {
        let mut state = self.state.lock().await;
        let loaded = self.reloaded(&mut state).await?;

        let (removed, kept): (Vec<Document>, Vec<Document>) =
            loaded.docs.iter().cloned().partition(|doc| filter.matches(doc));

        if removed.is_empty() {
            return Ok(0);
        }

        self.rewrite(&kept).await?;
        loaded.docs = kept;

        Ok(removed.len())
    }

    async fn find_all(&self) -> Result<Vec<Document>, BackendError> {
        let mut state = self.state.lock().await;
        let loaded = self.loaded(&mut state).await?;

        Ok(loaded.docs.clone())
    }

    /// Looks at the file, not the cache. Lookups come right before an update.
    async fn find_one(&self, filter: Filter) -> Result<Option<Document>, BackendError> {
        let mut state = self.state.lock().await;
        let loaded = self.reloaded(&mut state).await?;

        Ok(loaded.docs.iter().find(|doc| filter.matches(doc)).cloned())
    }

    async fn update(&self, filter: Filter, mut record: Document) -> Result<usize, BackendError> {
        let mut state = self.state.lock().await;
        let loaded = self.reloaded(&mut state).await?;

        let Some(idx) = loaded.docs.iter().position(|doc| filter.matches(doc)) else {
            return Ok(0);
        };

        if let Some(id) = loaded.docs[idx].get(ID_FIELD).cloned() {
            record.insert(ID_FIELD.to_string(), id);
        }

        let mut docs = loaded.docs.clone();
        docs[idx] = record;
        self.rewrite(&docs).await?;
        loaded.docs = docs;

        Ok(1)
    }
}
