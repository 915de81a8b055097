//! Persisted-layout storage.
//!
//! The core reads and writes window/tab metadata through a small async
//! key/value contract; freeze state and surface handles are never
//! persisted, so every restored browser window starts `Active`.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use mirador_common::MiradorError;

use crate::windows::WindowStore;

/// Key under which the window layout snapshot lives.
pub const LAYOUT_KEY: &str = "workspace/windows";

#[async_trait]
pub trait LayoutStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, MiradorError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), MiradorError>;
    async fn remove(&self, key: &str) -> Result<(), MiradorError>;
}

/// In-memory store; the default for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LayoutStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, MiradorError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), MiradorError> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), MiradorError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// One JSON object per file, read and rewritten whole. Layout traffic is a
/// handful of small writes per user action, so simplicity wins over
/// incremental IO.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    async fn read_map(&self) -> Result<HashMap<String, Value>, MiradorError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| MiradorError::Persistence(format!("corrupt layout file: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_map(&self, map: &HashMap<String, Value>) -> Result<(), MiradorError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(map)
            .map_err(|e| MiradorError::Persistence(e.to_string()))?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl LayoutStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, MiradorError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_map().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), MiradorError> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), value);
        self.write_map(&map).await
    }

    async fn remove(&self, key: &str) -> Result<(), MiradorError> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await?;
        if map.remove(key).is_some() {
            self.write_map(&map).await?;
        }
        Ok(())
    }
}

/// Save the window layout snapshot.
pub async fn save_windows(
    store: &dyn LayoutStore,
    windows: &WindowStore,
) -> Result<(), MiradorError> {
    store.set(LAYOUT_KEY, windows.to_value()).await
}

/// Load the window layout snapshot, if one was saved.
pub async fn load_windows(store: &dyn LayoutStore) -> Result<Option<WindowStore>, MiradorError> {
    let Some(value) = store.get(LAYOUT_KEY).await? else {
        return Ok(None);
    };
    match WindowStore::from_value(value) {
        Ok(windows) => {
            debug!(count = windows.len(), "restored window layout");
            Ok(Some(windows))
        }
        Err(e) => Err(MiradorError::Persistence(format!(
            "layout snapshot does not parse: {e}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirador_common::{Rect, WindowKind};

    fn sample_windows() -> WindowStore {
        let mut store = WindowStore::new();
        let id = store.open(
            WindowKind::Browser,
            Rect {
                x: 20.0,
                y: 30.0,
                width: 800.0,
                height: 600.0,
            },
        );
        store.focus(id);
        store.open(
            WindowKind::Notes,
            Rect {
                x: 900.0,
                y: 30.0,
                width: 300.0,
                height: 400.0,
            },
        );
        store
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryStore::new();
        store
            .set("k", serde_json::json!({"v": 1}))
            .await
            .unwrap();
        assert_eq!(
            store.get("k").await.unwrap(),
            Some(serde_json::json!({"v": 1}))
        );
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_and_load_windows() {
        let store = MemoryStore::new();
        let windows = sample_windows();
        save_windows(&store, &windows).await.unwrap();

        let restored = load_windows(&store).await.unwrap().unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.focused(), windows.focused());
    }

    #[tokio::test]
    async fn load_with_nothing_saved_is_none() {
        let store = MemoryStore::new();
        assert!(load_windows(&store).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn json_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("layout.json"));

        let windows = sample_windows();
        save_windows(&store, &windows).await.unwrap();

        // A fresh store over the same file sees the data.
        let store2 = JsonFileStore::new(dir.path().join("layout.json"));
        let restored = load_windows(&store2).await.unwrap().unwrap();
        assert_eq!(restored.len(), 2);
    }

    #[tokio::test]
    async fn json_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nope.json"));
        assert_eq!(store.get("anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn json_file_store_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("layout.json"));
        store.set("a", serde_json::json!(1)).await.unwrap();
        store.set("b", serde_json::json!(2)).await.unwrap();
        store.remove("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.get("b").await.unwrap(), Some(serde_json::json!(2)));
    }
}
