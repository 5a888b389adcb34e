use syng_config::{Config, PreferenceError, Preferences};
use syng_store::CollectionStore;

pub struct AppState {
    pub config: Config,
    pub store: CollectionStore,
}

impl AppState {
    pub async fn new(config: Config) -> Self {
        let store = CollectionStore::open(&config).await;
        Self { config, store }
    }

    /// Preferences are only read when asked for; loading writes the defaults
    /// file on first run.
    pub async fn preferences(&self) -> Result<Preferences, PreferenceError> {
        Preferences::load(self.config.preferences_file()).await
    }
}
