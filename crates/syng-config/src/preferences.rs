//! User preferences stored as a JSON file in the data directory.
//!
//! Every property is stored as
//! `{ "<name>": { "value": <any>, "requiresRestart": <bool> } }`.
//! Properties missing from the file are filled in from the built-in defaults.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::fs;

use crate::persist::write_atomic;

#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error("Preferences file {path} contains invalid JSON: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not write preferences to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Requested preference {0} does not exist")]
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    pub value: Value,
    #[serde(rename = "requiresRestart", default)]
    pub requires_restart: bool,
}

impl Preference {
    fn new(value: Value, requires_restart: bool) -> Self {
        Self {
            value,
            requires_restart,
        }
    }
}

pub struct Preferences {
    path: PathBuf,
    entries: BTreeMap<String, Preference>,
}

impl Preferences {
    pub fn defaults() -> BTreeMap<String, Preference> {
        BTreeMap::from([
            ("characterSet".to_string(), Preference::new(json!("simplified"), false)),
            ("pronunciationStyle".to_string(), Preference::new(json!("pinyin"), false)),
            ("theme".to_string(), Preference::new(json!("light"), true)),
            ("fontSize".to_string(), Preference::new(json!(16), false)),
            ("showToneColors".to_string(), Preference::new(json!(true), false)),
        ])
    }

    /// Load preferences from `path`.
    ///
    /// A missing file falls back to the defaults, which are then written out
    /// so later changes have somewhere to go.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, PreferenceError> {
        let path = path.into();

        match fs::read_to_string(&path).await {
            Ok(content) => {
                let mut entries: BTreeMap<String, Preference> = serde_json::from_str(&content)
                    .map_err(|source| {
                        tracing::error!("Invalid JSON in preferences file {}: {}", path.display(), source);
                        PreferenceError::InvalidJson {
                            path: path.clone(),
                            source,
                        }
                    })?;

                for (name, preference) in Self::defaults() {
                    entries.entry(name).or_insert(preference);
                }

                tracing::debug!("Loaded {} preferences from {}", entries.len(), path.display());
                Ok(Self { path, entries })
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("No preferences file at {}, writing defaults", path.display());
                let prefs = Self {
                    path,
                    entries: Self::defaults(),
                };
                prefs.save().await?;
                Ok(prefs)
            }
            Err(source) => {
                tracing::error!("Failed to read preferences {}: {}", path.display(), source);
                Err(PreferenceError::Io { path, source })
            }
        }
    }

    pub fn entries(&self) -> &BTreeMap<String, Preference> {
        &self.entries
    }

    pub fn get(&self, property: &str) -> Result<&Value, PreferenceError> {
        self.entries
            .get(property)
            .map(|p| &p.value)
            .ok_or_else(|| PreferenceError::Unknown(property.to_string()))
    }

    /// Set and persist a preference. Returns true when the change only takes
    /// effect after a restart.
    pub async fn set(&mut self, property: &str, value: Value) -> Result<bool, PreferenceError> {
        let Some(preference) = self.entries.get_mut(property) else {
            tracing::warn!("Attempted to set unknown preference {property}");
            return Err(PreferenceError::Unknown(property.to_string()));
        };

        preference.value = value;
        let requires_restart = preference.requires_restart;
        self.save().await?;

        Ok(requires_restart)
    }

    pub async fn save(&self) -> Result<(), PreferenceError> {
        let io_err = |source| PreferenceError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let json = serde_json::to_vec_pretty(&self.entries)
            .map_err(|e| io_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;

        write_atomic(self.path.clone(), json).await.map_err(|e| {
            tracing::error!("Cannot save preferences to {}: {}", self.path.display(), e);
            io_err(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let prefs = Preferences::load(&path).await.unwrap();

        assert_eq!(prefs.get("characterSet").unwrap(), &json!("simplified"));
        assert!(path.exists());

        let written: BTreeMap<String, Preference> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, Preferences::defaults());
    }

    #[tokio::test]
    async fn test_existing_file_is_merged_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(
            &path,
            r#"{"fontSize":{"value":20,"requiresRestart":false},"custom":{"value":"x"}}"#,
        )
        .unwrap();

        let prefs = Preferences::load(&path).await.unwrap();

        assert_eq!(prefs.get("fontSize").unwrap(), &json!(20));
        assert_eq!(prefs.get("custom").unwrap(), &json!("x"));
        assert_eq!(prefs.get("theme").unwrap(), &json!("light"));
    }

    #[tokio::test]
    async fn test_invalid_json_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = Preferences::load(&path).await;

        assert!(matches!(result, Err(PreferenceError::InvalidJson { .. })));
    }

    #[tokio::test]
    async fn test_set_persists_and_reports_restart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        let mut prefs = Preferences::load(&path).await.unwrap();

        assert!(prefs.set("theme", json!("dark")).await.unwrap());
        assert!(!prefs.set("fontSize", json!(18)).await.unwrap());

        let reloaded = Preferences::load(&path).await.unwrap();
        assert_eq!(reloaded.get("theme").unwrap(), &json!("dark"));
        assert_eq!(reloaded.get("fontSize").unwrap(), &json!(18));
    }

    #[tokio::test]
    async fn test_save_replaces_file_without_leftovers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        let mut prefs = Preferences::load(&path).await.unwrap();

        prefs.set("fontSize", json!(22)).await.unwrap();

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1, "only preferences.json remains");
        let written: BTreeMap<String, Preference> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["fontSize"].value, json!(22));
    }

    #[tokio::test]
    async fn test_unknown_property() {
        let dir = TempDir::new().unwrap();
        let mut prefs = Preferences::load(dir.path().join("p.json")).await.unwrap();

        assert!(matches!(prefs.get("nope"), Err(PreferenceError::Unknown(_))));
        assert!(matches!(
            prefs.set("nope", json!(1)).await,
            Err(PreferenceError::Unknown(_))
        ));
    }
}
