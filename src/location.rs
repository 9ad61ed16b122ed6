use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug)]
pub enum LocationError {
    #[error("failed to write settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persisted location record. Field names match the on-disk JSON produced by
/// earlier deployments, so existing `user_settings.json` files keep working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSettings {
    pub cidade: String,
    pub estado: String,
    pub latitude: f64,
    pub longitude: f64,
    pub cep: String,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            cidade: "Natal".to_string(),
            estado: "RN".to_string(),
            latitude: -5.880287730015802,
            longitude: -35.24775350308109,
            cep: "59000-000".to_string(),
        }
    }
}

/// Owns the single process-wide location record. Loaded once at startup and
/// overwritten wholesale on every successful update; a failed update leaves
/// both the file and the in-memory record unchanged.
#[derive(Debug)]
pub struct LocationStore {
    path: PathBuf,
    settings: RwLock<LocationSettings>,
}

impl LocationStore {
    /// Reads the settings file, falling back to defaults when it is missing
    /// or unreadable.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = Self::read_file(&path).unwrap_or_else(|e| {
            tracing::warn!("using default location settings: {e}");
            LocationSettings::default()
        });

        Self {
            path,
            settings: RwLock::new(settings),
        }
    }

    fn read_file(path: &Path) -> Result<LocationSettings, LocationError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub async fn current(&self) -> LocationSettings {
        self.settings.read().await.clone()
    }

    /// Persists the new record, then swaps it in memory. The write lock is
    /// held across both steps so concurrent updates cannot leave the file and
    /// the in-memory record holding different versions. A write failure keeps
    /// the previous record active.
    pub async fn replace(&self, settings: LocationSettings) -> Result<(), LocationError> {
        let mut guard = self.settings.write().await;
        let raw = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&self.path, raw)?;

        *guard = settings;
        tracing::info!("location settings updated: {}/{}", guard.cidade, guard.estado);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Named coordinates saved for drone flight checks. In-memory only; the set
/// resets with the process, like the rest of the runtime alert state.
#[derive(Debug, Default)]
pub struct DroneSiteRegistry {
    sites: RwLock<BTreeMap<String, Coordinates>>,
}

impl DroneSiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves or overwrites a named site. Returns true when the name was new.
    pub async fn add(&self, name: &str, coords: Coordinates) -> bool {
        self.sites
            .write()
            .await
            .insert(name.to_string(), coords)
            .is_none()
    }

    pub async fn get(&self, name: &str) -> Option<Coordinates> {
        self.sites.read().await.get(name).copied()
    }

    /// Site names in listing order.
    pub async fn names(&self) -> Vec<String> {
        self.sites.read().await.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocationStore::load(dir.path().join("user_settings.json"));

        let settings = store.settings.blocking_read().clone();
        assert_eq!(settings, LocationSettings::default());
        assert_eq!(settings.cidade, "Natal");
    }

    #[tokio::test]
    async fn test_replace_persists_whole_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_settings.json");

        let store = LocationStore::load(&path);
        let updated = LocationSettings {
            cidade: "Recife".to_string(),
            estado: "PE".to_string(),
            latitude: -8.05,
            longitude: -34.88,
            cep: "50000-000".to_string(),
        };
        store.replace(updated.clone()).await.unwrap();

        assert_eq!(store.current().await, updated);
        // A fresh store sees the persisted record.
        let reloaded = LocationStore::load(&path);
        assert_eq!(reloaded.current().await, updated);
    }

    #[tokio::test]
    async fn test_concurrent_replaces_keep_file_and_memory_consistent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_settings.json");
        let store = std::sync::Arc::new(LocationStore::load(&path));

        let record = |cidade: &str| LocationSettings {
            cidade: cidade.to_string(),
            ..LocationSettings::default()
        };
        let a = tokio::spawn({
            let store = std::sync::Arc::clone(&store);
            let settings = record("Recife");
            async move { store.replace(settings).await }
        });
        let b = tokio::spawn({
            let store = std::sync::Arc::clone(&store);
            let settings = record("Fortaleza");
            async move { store.replace(settings).await }
        });
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        // Whichever update landed last, disk and memory agree.
        let on_disk: LocationSettings =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, store.current().await);
    }

    #[tokio::test]
    async fn test_drone_site_registry_add_and_overwrite() {
        let registry = DroneSiteRegistry::new();
        let park = Coordinates {
            latitude: -5.8802,
            longitude: -35.2477,
        };

        assert!(registry.add("Parque", park).await);
        assert_eq!(registry.get("Parque").await, Some(park));
        assert!(registry.get("Praia").await.is_none());

        let moved = Coordinates {
            latitude: -6.0,
            longitude: -35.0,
        };
        assert!(!registry.add("Parque", moved).await);
        assert_eq!(registry.get("Parque").await, Some(moved));
        assert_eq!(registry.names().await, vec!["Parque"]);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = LocationStore::load(&path);
        assert_eq!(
            store.settings.blocking_read().clone(),
            LocationSettings::default()
        );
    }
}
