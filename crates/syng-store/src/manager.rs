use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use serde_json::Value;
use syng_config::Config;
use syng_types::{BOOKMARKS, ListName, ListTarget, NameError, NewEntry, RecordId, VocabEntry};
use tokio::sync::Mutex;

use crate::backend::{BackendError, Collection, Document, DocumentDb, FileDb, Filter};
use crate::error::StoreError;
use crate::registry::ListRegistry;
use crate::settings::LocalSettings;

const NOTES_FIELD: &str = "notes";

/// Registry plus the handles opened from it. Only touched under one lock.
struct Lists {
    registry: ListRegistry,
    handles: HashMap<ListName, Arc<dyn Collection>>,
}

impl Lists {
    /// Re-read the registry and open a handle for every list whose
    /// collection exists. Lists that disappeared are dropped.
    async fn refresh<D: DocumentDb>(&mut self, db: &D) -> Result<(), StoreError> {
        let names = self.registry.names().await?;
        let mut handles = HashMap::with_capacity(names.len());

        for raw in names {
            let name = match ListName::parse(&raw) {
                Ok(name) => name,
                Err(e) => {
                    tracing::warn!("Skipping invalid user list {raw:?} in registry: {e}");
                    continue;
                }
            };

            match db.collection_exists(name.as_str()).await {
                Ok(true) => {
                    let handle = self
                        .handles
                        .remove(&name)
                        .unwrap_or_else(|| db.collection(name.as_str()));
                    handles.insert(name, handle);
                }
                Ok(false) => {
                    tracing::warn!(
                        "User list {name} is registered but {} is missing, skipping",
                        db.collection_path(name.as_str()).display()
                    );
                }
                Err(e) => {
                    tracing::warn!("Could not check the database file for user list {name}: {e}");
                }
            }
        }

        for dropped in self.handles.keys() {
            tracing::debug!("User list {dropped} is no longer registered");
        }

        self.handles = handles;
        Ok(())
    }

    fn get(&self, raw: &str) -> Result<Arc<dyn Collection>, StoreError> {
        ListName::parse(raw)
            .ok()
            .and_then(|name| self.handles.get(&name).cloned())
            .ok_or_else(|| {
                tracing::warn!("The user list {raw:?} is not defined in the database manager");
                StoreError::NotRegistered(raw.to_string())
            })
    }
}

/// Bookmarks and user vocabulary lists on top of a [`DocumentDb`].
///
/// Every operation that reads or changes the set of user lists runs under a
/// single lock, so the registry and the open handles never disagree.
pub struct CollectionStore<D: DocumentDb = FileDb> {
    db: D,
    bookmarks: Arc<dyn Collection>,
    lists: Mutex<Lists>,
}

impl CollectionStore<FileDb> {
    pub async fn open(config: &Config) -> Self {
        let db = FileDb::new(config.db_dir());
        let settings = LocalSettings::new(config.settings_file());
        Self::with_db(db, settings).await
    }
}

impl<D: DocumentDb> CollectionStore<D> {
    /// Opening never fails. Storage or registry problems are logged here and
    /// surface again from the first operation that needs them.
    pub async fn with_db(db: D, settings: LocalSettings) -> Self {
        if let Err(e) = db.ensure_storage().await {
            tracing::error!("There was an unexpected error while creating the database directory: {e}");
        }

        let bookmarks = db.collection(BOOKMARKS);
        let mut lists = Lists {
            registry: ListRegistry::new(settings),
            handles: HashMap::new(),
        };

        if let Err(e) = lists.refresh(&db).await {
            tracing::error!("There was an error loading the user data lists: {e}");
        }

        tracing::info!("Collection store opened with {} user lists", lists.handles.len());

        Self {
            db,
            bookmarks,
            lists: Mutex::new(lists),
        }
    }

    pub fn db(&self) -> &D {
        &self.db
    }

    /// Names in the persisted registry, including ones whose file is missing
    pub async fn user_list_names(&self) -> Result<Vec<String>, StoreError> {
        self.lists.lock().await.registry.names().await
    }

    /// Lists with an open handle, sorted by name
    pub async fn loaded_lists(&self) -> Vec<ListName> {
        let lists = self.lists.lock().await;
        let mut names: Vec<ListName> = lists.handles.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn create_user_list(&self, name: &str) -> Result<ListName, StoreError> {
        let name = ListName::parse(name).map_err(|e| match e {
            NameError::Reserved(name) => {
                tracing::warn!("Cannot create user list {name}: name is reserved");
                StoreError::Collision(name)
            }
            other => other.into(),
        })?;

        let mut lists = self.lists.lock().await;

        if lists.registry.contains(name.as_str()).await? {
            tracing::warn!("User list {name} is already registered. Cannot create user list.");
            return Err(StoreError::Collision(name.to_string()));
        }

        match self.db.create_collection(name.as_str()).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                tracing::warn!("The file for {name} already exists. Cannot create user list.");
                return Err(StoreError::Collision(name.to_string()));
            }
            Err(e) => {
                tracing::error!("There was an error writing the new user list {name} to a file: {e}");
                return Err(StoreError::io(format!("Failed to create user list {name}"))(e));
            }
        }

        if let Err(e) = lists.registry.append(&name).await {
            tracing::error!("Failed to register user list {name}, removing its file: {e}");
            if let Err(cleanup) = self.db.drop_collection(name.as_str()).await {
                tracing::error!("Could not remove the file of unregistered list {name}: {cleanup}");
            }
            return Err(e);
        }

        lists
            .handles
            .insert(name.clone(), self.db.collection(name.as_str()));

        tracing::info!("Created user list {name}");
        Ok(name)
    }

    /// Deletes the file first, then the registry entry. A name left registered
    /// without a file (the registry write failed last time) is only unregistered.
    pub async fn remove_user_list(&self, name: &str) -> Result<(), StoreError> {
        let mut lists = self.lists.lock().await;
        let registered = lists.registry.contains(name).await?;

        match lists.get(name) {
            Ok(_) => {
                let list = ListName::parse(name)?;
                self.db.drop_collection(list.as_str()).await.map_err(|e| {
                    tracing::error!("There was an error removing the user list database file for {list}: {e}");
                    StoreError::io(format!("Failed to remove user list {list}"))(e)
                })?;
                lists.handles.remove(&list);
            }
            Err(_) if registered => {
                tracing::warn!("User list {name} is registered without a database file, unregistering it");
            }
            Err(e) => return Err(e),
        }

        if let Err(e) = lists.registry.remove(name).await {
            tracing::error!(
                "The file of user list {name} was deleted but it is still registered, remove it again to unregister: {e}"
            );
            return Err(e);
        }

        tracing::info!("Removed user list {name}");
        Ok(())
    }

    pub async fn add_to_user_list(&self, name: &str, entry: NewEntry) -> Result<VocabEntry, StoreError> {
        let mut lists = self.lists.lock().await;
        lists.refresh(&self.db).await?;
        let collection = lists.get(name)?;

        insert_entry(collection.as_ref(), entry).await
    }

    /// Completes once the backend has acknowledged the removal
    pub async fn remove_from_user_list(&self, name: &str, id: RecordId) -> Result<usize, StoreError> {
        let lists = self.lists.lock().await;
        let collection = lists.get(name)?;

        remove_entries(collection.as_ref(), Filter::Id(id)).await
    }

    /// Always re-reads storage so lists changed by another session show up
    pub async fn user_list_content(&self, name: &str) -> Result<Vec<VocabEntry>, StoreError> {
        self.db.reload().await;

        let mut lists = self.lists.lock().await;
        lists.refresh(&self.db).await?;
        let collection = lists.get(name)?;

        read_entries(collection.as_ref()).await
    }

    pub async fn add_to_bookmarks(&self, entry: NewEntry) -> Result<VocabEntry, StoreError> {
        let stored = insert_entry(self.bookmarks.as_ref(), entry).await?;
        tracing::info!("Successfully added {} to bookmarks", stored.simplified);
        Ok(stored)
    }

    pub async fn remove_from_bookmarks(&self, id: RecordId) -> Result<usize, StoreError> {
        remove_entries(self.bookmarks.as_ref(), Filter::Id(id)).await
    }

    pub async fn clear_bookmarks(&self) -> Result<usize, StoreError> {
        remove_entries(self.bookmarks.as_ref(), Filter::All).await
    }

    /// Always re-reads storage before returning
    pub async fn bookmarks(&self) -> Result<Vec<VocabEntry>, StoreError> {
        self.db.reload().await;
        read_entries(self.bookmarks.as_ref()).await
    }

    /// Replace the notes of one entry, leaving every other field as stored.
    /// Returns the backend's update count.
    pub async fn update_notes(
        &self,
        target: &ListTarget,
        id: RecordId,
        notes: &str,
    ) -> Result<usize, StoreError> {
        match target {
            ListTarget::Bookmarks => update_notes_in(self.bookmarks.as_ref(), id, notes).await,
            ListTarget::Named(name) => {
                let lists = self.lists.lock().await;
                let collection = lists.get(name.as_str())?;
                update_notes_in(collection.as_ref(), id, notes).await
            }
        }
    }
}

fn log_backend(
    action: &'static str,
    collection: &dyn Collection,
) -> impl FnOnce(BackendError) -> StoreError + use<> {
    let name = collection.name().to_string();
    move |e| {
        tracing::error!("There was an error while {action} {name}: {e}");
        StoreError::Backend(e)
    }
}

fn to_record(entry: &NewEntry) -> Result<Document, StoreError> {
    match serde_json::to_value(entry).map_err(BackendError::from)? {
        Value::Object(mut record) => {
            record.insert(NOTES_FIELD.to_string(), Value::String(String::new()));
            Ok(record)
        }
        _ => Err(BackendError::NotAnObject.into()),
    }
}

fn decode(collection: &dyn Collection, record: Document) -> Result<VocabEntry, StoreError> {
    serde_json::from_value(Value::Object(record)).map_err(|source| {
        tracing::error!("Malformed entry in {}: {source}", collection.name());
        StoreError::MalformedEntry {
            collection: collection.name().to_string(),
            source,
        }
    })
}

async fn insert_entry(collection: &dyn Collection, entry: NewEntry) -> Result<VocabEntry, StoreError> {
    let record = to_record(&entry)?;
    let stored = collection
        .insert(record)
        .await
        .map_err(log_backend("adding a word to", collection))?;

    tracing::debug!("Added {} to {}", entry.simplified, collection.name());
    decode(collection, stored)
}

async fn remove_entries(collection: &dyn Collection, filter: Filter) -> Result<usize, StoreError> {
    let removed = collection
        .remove(filter)
        .await
        .map_err(log_backend("removing words from", collection))?;

    tracing::debug!("Removed {removed} entries from {} ({filter:?})", collection.name());
    Ok(removed)
}

async fn read_entries(collection: &dyn Collection) -> Result<Vec<VocabEntry>, StoreError> {
    collection
        .find_all()
        .await
        .map_err(log_backend("reading", collection))?
        .into_iter()
        .map(|record| decode(collection, record))
        .collect()
}

async fn update_notes_in(collection: &dyn Collection, id: RecordId, notes: &str) -> Result<usize, StoreError> {
    let not_found = || {
        tracing::warn!("There was a problem updating the notes: no entry {id} in {}", collection.name());
        StoreError::EntryNotFound {
            collection: collection.name().to_string(),
            id,
        }
    };

    let mut record = collection
        .find_one(Filter::Id(id))
        .await
        .map_err(log_backend("looking up notes in", collection))?
        .ok_or_else(not_found)?;

    record.insert(NOTES_FIELD.to_string(), Value::String(notes.to_string()));

    let updated = collection
        .update(Filter::Id(id), record)
        .await
        .map_err(log_backend("updating notes in", collection))?;

    if updated == 0 {
        return Err(not_found());
    }

    Ok(updated)
}
