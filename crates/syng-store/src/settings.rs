use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use syng_config::persist::write_atomic;
use tokio::fs;

use crate::error::StoreError;

/// Persistent string key-value area, stored as one JSON object
pub struct LocalSettings {
    path: PathBuf,
}

impl LocalSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut values = self.read_all().await?;
        Ok(values.remove(key))
    }

    pub async fn set(&self, key: &str, value: impl Into<String>) -> Result<(), StoreError> {
        let mut values = self.read_all().await?;
        values.insert(key.to_string(), value.into());
        self.write_all(&values).await
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                tracing::error!("Failed to read local settings {}: {}", self.path.display(), e);
                return Err(StoreError::io(format!(
                    "Failed to read local settings {}",
                    self.path.display()
                ))(e));
            }
        };

        serde_json::from_str(&content).map_err(|source| {
            tracing::error!("Local settings {} are not valid JSON: {}", self.path.display(), source);
            StoreError::SettingsFormat {
                path: self.path.clone(),
                source,
            }
        })
    }

    async fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let context = format!("Failed to write local settings {}", self.path.display());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(StoreError::io(context.clone()))?;
        }

        let json = serde_json::to_vec_pretty(values).map_err(|source| StoreError::SettingsFormat {
            path: self.path.clone(),
            source,
        })?;

        write_atomic(self.path.clone(), json).await.map_err(|e| {
            tracing::error!("{context}: {e}");
            StoreError::io(context)(e)
        })
    }
}
