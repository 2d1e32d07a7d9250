use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tak_sync::PreferenceStore;

/// Viewer preferences kept in a single JSON object on disk.
pub struct JsonPreferenceStore {
    path: PathBuf,
}

impl JsonPreferenceStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> std::io::Result<BTreeMap<String, Value>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&contents).map_err(std::io::Error::other)
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn load(&self) -> BTreeMap<String, Value> {
        match self.read() {
            Ok(preferences) => preferences,
            Err(e) => {
                tracing::warn!("Failed to read preferences {:?}: {}", self.path, e);
                BTreeMap::new()
            }
        }
    }

    fn set(&mut self, key: &str, value: &Value) -> std::io::Result<()> {
        // an unreadable file is replaced rather than blocking every write
        let mut preferences = self.read().unwrap_or_default();
        preferences.insert(key.to_string(), value.clone());

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(&preferences).map_err(std::io::Error::other)?;
        std::fs::write(&self.path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonPreferenceStore::new(dir.path().join("preferences.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_set_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");
        let mut store = JsonPreferenceStore::new(path.clone());

        store.set("themeID", &json!("retro")).unwrap();
        store.set("showEval", &json!(false)).unwrap();
        store.set("themeID", &json!("classic")).unwrap();

        let reopened = JsonPreferenceStore::new(path);
        let preferences = reopened.load();
        assert_eq!(preferences.len(), 2);
        assert_eq!(preferences.get("themeID"), Some(&json!("classic")));
        assert_eq!(preferences.get("showEval"), Some(&json!(false)));
    }

    #[test]
    fn test_corrupt_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "{ not json").unwrap();

        let mut store = JsonPreferenceStore::new(path);
        assert!(store.load().is_empty());

        store.set("axisLabels", &json!(true)).unwrap();
        assert_eq!(store.load().get("axisLabels"), Some(&json!(true)));
    }
}
