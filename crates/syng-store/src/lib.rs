pub mod backend;
pub mod error;
pub mod manager;
pub mod registry;
pub mod settings;

pub use backend::{BackendError, Collection, Document, DocumentDb, FileDb, Filter};
pub use error::StoreError;
pub use manager::CollectionStore;
pub use registry::{ListRegistry, USER_LISTS_KEY};
pub use settings::LocalSettings;
