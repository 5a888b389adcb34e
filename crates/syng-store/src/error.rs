use std::io;
use std::path::PathBuf;

use syng_types::{NameError, RecordId};

use crate::backend::BackendError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error(
        "Cannot create user list \"{0}\" because a list with that name already exists. Please choose a different name."
    )]
    Collision(String),

    #[error("The user list \"{0}\" is not defined in the database manager")]
    NotRegistered(String),

    #[error(transparent)]
    InvalidName(#[from] NameError),

    #[error("Database error: {0}")]
    Backend(#[from] BackendError),

    #[error("The saved user list registry is malformed: {0}")]
    RegistryFormat(#[source] serde_json::Error),

    #[error("Local settings file {path} is malformed: {source}")]
    SettingsFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No entry with id {id} in {collection}")]
    EntryNotFound { collection: String, id: RecordId },

    #[error("Stored entry in {collection} is malformed: {source}")]
    MalformedEntry {
        collection: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(context: impl Into<String>) -> impl FnOnce(io::Error) -> Self {
        let context = context.into();
        move |source| Self::Io { context, source }
    }
}
