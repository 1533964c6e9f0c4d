use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::Context;
use async_trait::async_trait;

/// String key → string value persistence. One entry per day plus a few
/// global preferences.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn put(&self, key: &str, value: String) -> anyhow::Result<()>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}

/// One `<key>.json` file per entry under a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub async fn new(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("create data dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        anyhow::ensure!(valid, "invalid storage key {key:?}");
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
        }
    }

    async fn put(&self, key: &str, value: String) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        // readers only ever see a complete file
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("rename into {}", path.display()))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
        }
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}


#[cfg(test)]
mod storage_tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_put_get_delete() {
        let store = MemoryStore::new();
        assert_eq!(store.get("2026-10-16").await.unwrap(), None);
        store.put("2026-10-16", "{}".into()).await.unwrap();
        assert_eq!(store.get("2026-10-16").await.unwrap().as_deref(), Some("{}"));
        store.delete("2026-10-16").await.unwrap();
        assert_eq!(store.get("2026-10-16").await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_round_trips_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested")).await.unwrap();

        assert_eq!(store.get("color-mode").await.unwrap(), None);
        store.put("color-mode", "dark".into()).await.unwrap();
        assert_eq!(store.get("color-mode").await.unwrap().as_deref(), Some("dark"));
        assert!(dir.path().join("nested/color-mode.json").exists());

        store.delete("color-mode").await.unwrap();
        store.delete("color-mode").await.unwrap();
        assert_eq!(store.get("color-mode").await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).await.unwrap();
        assert!(store.get("../etc/passwd").await.is_err());
        assert!(store.put("", "x".into()).await.is_err());
    }
}
