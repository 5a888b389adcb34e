//! Error paths, driven by a file backend with switchable faults

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use syng_store::{
    BackendError, Collection, CollectionStore, Document, DocumentDb, FileDb, Filter,
    LocalSettings, StoreError,
};
use syng_types::{ListTarget, NewEntry};
use tempfile::TempDir;

#[derive(Default)]
struct Faults {
    create: AtomicBool,
    drop: AtomicBool,
    writes: AtomicBool,
}

fn injected() -> io::Error {
    io::Error::other("injected failure")
}

struct FaultyDb {
    inner: FileDb,
    faults: Arc<Faults>,
}

#[async_trait::async_trait]
impl DocumentDb for FaultyDb {
    fn collection(&self, name: &str) -> Arc<dyn Collection> {
        Arc::new(FaultyCollection {
            inner: self.inner.collection(name),
            faults: self.faults.clone(),
        })
    }

    async fn reload(&self) {
        self.inner.reload().await
    }

    fn forget(&self, name: &str) {
        self.inner.forget(name)
    }

    fn collection_path(&self, name: &str) -> PathBuf {
        self.inner.collection_path(name)
    }

    async fn ensure_storage(&self) -> io::Result<()> {
        self.inner.ensure_storage().await
    }

    async fn collection_exists(&self, name: &str) -> io::Result<bool> {
        self.inner.collection_exists(name).await
    }

    async fn create_collection(&self, name: &str) -> io::Result<()> {
        if self.faults.create.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.create_collection(name).await
    }

    async fn drop_collection(&self, name: &str) -> io::Result<()> {
        if self.faults.drop.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.drop_collection(name).await
    }
}

struct FaultyCollection {
    inner: Arc<dyn Collection>,
    faults: Arc<Faults>,
}

impl FaultyCollection {
    fn check_write(&self) -> Result<(), BackendError> {
        if self.faults.writes.load(Ordering::SeqCst) {
            return Err(BackendError::Io {
                collection: self.inner.name().to_string(),
                source: injected(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Collection for FaultyCollection {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn insert(&self, record: Document) -> Result<Document, BackendError> {
        self.check_write()?;
        self.inner.insert(record).await
    }

    async fn remove(&self, filter: Filter) -> Result<usize, BackendError> {
        self.check_write()?;
        self.inner.remove(filter).await
    }

    async fn find_all(&self) -> Result<Vec<Document>, BackendError> {
        self.inner.find_all().await
    }

    async fn find_one(&self, filter: Filter) -> Result<Option<Document>, BackendError> {
        self.inner.find_one(filter).await
    }

    async fn update(&self, filter: Filter, record: Document) -> Result<usize, BackendError> {
        self.check_write()?;
        self.inner.update(filter, record).await
    }
}

async fn open(dir: &TempDir) -> CollectionStore<FaultyDb> {
    let db = FaultyDb {
        inner: FileDb::new(dir.path().join("db").join("syng")),
        faults: Arc::new(Faults::default()),
    };
    let settings = LocalSettings::new(dir.path().join("local_settings.json"));
    CollectionStore::with_db(db, settings).await
}

fn word() -> NewEntry {
    NewEntry::new("茶", "茶", "chá", vec!["tea".to_string()], vec![2])
}

#[tokio::test]
async fn test_failed_file_creation_leaves_registry_untouched() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir).await;
    store.db().faults.create.store(true, Ordering::SeqCst);

    let result = store.create_user_list("HSK1").await;

    assert!(matches!(result, Err(StoreError::Io { .. })));
    assert!(store.user_list_names().await.unwrap().is_empty());
    assert!(store.loaded_lists().await.is_empty());
}

#[tokio::test]
async fn test_failed_file_deletion_keeps_list() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir).await;
    store.create_user_list("HSK1").await.unwrap();
    store.add_to_user_list("HSK1", word()).await.unwrap();
    store.db().faults.drop.store(true, Ordering::SeqCst);

    let result = store.remove_user_list("HSK1").await;

    assert!(matches!(result, Err(StoreError::Io { .. })));
    assert_eq!(store.user_list_names().await.unwrap(), vec!["HSK1"]);
    assert_eq!(store.user_list_content("HSK1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_backend_write_errors_are_surfaced() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir).await;
    let saved = store.add_to_bookmarks(word()).await.unwrap();
    store.db().faults.writes.store(true, Ordering::SeqCst);

    assert!(matches!(
        store.add_to_bookmarks(word()).await,
        Err(StoreError::Backend(_))
    ));
    assert!(matches!(
        store.remove_from_bookmarks(saved.id).await,
        Err(StoreError::Backend(_))
    ));
    assert!(matches!(
        store
            .update_notes(&ListTarget::Bookmarks, saved.id, "x")
            .await,
        Err(StoreError::Backend(_))
    ));

    let bookmarks = store.bookmarks().await.unwrap();
    assert_eq!(bookmarks, vec![saved]);
}
