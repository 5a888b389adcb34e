use syng_types::ListName;

use crate::error::StoreError;
use crate::settings::LocalSettings;

/// Settings key holding the JSON array of user list names
pub const USER_LISTS_KEY: &str = "userLists";

/// Ordered, persisted set of user list names
pub struct ListRegistry {
    settings: LocalSettings,
}

impl ListRegistry {
    pub fn new(settings: LocalSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &LocalSettings {
        &self.settings
    }

    /// Registered names in creation order. Initializes an empty registry
    /// when none has been saved yet.
    pub async fn names(&self) -> Result<Vec<String>, StoreError> {
        match self.settings.get(USER_LISTS_KEY).await? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                tracing::error!("Could not parse the saved user lists: {e}");
                StoreError::RegistryFormat(e)
            }),
            None => {
                self.write(&[]).await?;
                Ok(Vec::new())
            }
        }
    }

    pub async fn contains(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.names().await?.iter().any(|n| n == name))
    }

    pub async fn append(&self, name: &ListName) -> Result<(), StoreError> {
        let mut names = self.names().await?;
        if names.iter().any(|n| n == name.as_str()) {
            tracing::warn!("User list {name} is already registered");
            return Ok(());
        }

        names.push(name.to_string());
        self.write(&names).await
    }

    /// Returns false when the name was not registered
    pub async fn remove(&self, name: &str) -> Result<bool, StoreError> {
        let mut names = self.names().await?;
        let before = names.len();
        names.retain(|n| n != name);

        if names.len() == before {
            return Ok(false);
        }

        self.write(&names).await?;
        Ok(true)
    }

    async fn write(&self, names: &[String]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(names).map_err(StoreError::RegistryFormat)?;
        self.settings.set(USER_LISTS_KEY, raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry(dir: &TempDir) -> ListRegistry {
        ListRegistry::new(LocalSettings::new(dir.path().join("local_settings.json")))
    }

    #[tokio::test]
    async fn test_first_read_initializes_empty_registry() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);

        assert!(registry.names().await.unwrap().is_empty());
        assert_eq!(
            registry.settings().get(USER_LISTS_KEY).await.unwrap().as_deref(),
            Some("[]")
        );
    }

    #[tokio::test]
    async fn test_append_keeps_order_and_skips_duplicates() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);

        for name in ["HSK1", "HSK2", "HSK1"] {
            registry.append(&ListName::parse(name).unwrap()).await.unwrap();
        }

        assert_eq!(registry.names().await.unwrap(), vec!["HSK1", "HSK2"]);
    }

    #[tokio::test]
    async fn test_remove_only_touches_named_entry() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        registry.append(&ListName::parse("a").unwrap()).await.unwrap();
        registry.append(&ListName::parse("b").unwrap()).await.unwrap();

        assert!(!registry.remove("missing").await.unwrap());
        assert!(registry.remove("a").await.unwrap());
        assert_eq!(registry.names().await.unwrap(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_malformed_registry_value() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        registry.settings().set(USER_LISTS_KEY, "{oops").await.unwrap();

        assert!(matches!(
            registry.names().await,
            Err(StoreError::RegistryFormat(_))
        ));
    }
}
