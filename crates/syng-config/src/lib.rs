use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub mod persist;
pub mod preferences;

pub use preferences::{PreferenceError, Preferences};

/// Folder created under the platform data directory
pub const APP_DIR_NAME: &str = "Syng";

fn default_log_filter() -> String {
    "syng=info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of everything Syng persists
    pub data_dir: PathBuf,
    /// `tracing_subscriber` filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Build from environment, falling back to platform defaults
    pub fn new() -> Self {
        let data_dir = env::var_os("SYNG_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let log_filter = env::var("SYNG_LOG").unwrap_or_else(|_| default_log_filter());

        Self {
            data_dir,
            log_filter,
        }
    }

    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Directory holding one file per collection
    pub fn db_dir(&self) -> PathBuf {
        self.data_dir.join("db").join("syng")
    }

    /// Local key-value settings area (holds the user list registry)
    pub fn settings_file(&self) -> PathBuf {
        self.data_dir.join("local_settings.json")
    }

    pub fn preferences_file(&self) -> PathBuf {
        self.data_dir.join("preferences.json")
    }
}

fn default_data_dir() -> PathBuf {
    dirs_next::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
