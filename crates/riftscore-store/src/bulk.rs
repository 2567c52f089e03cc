//! Filesystem bulk storage
//!
//! Each segment is one pretty-printed JSON array at `<root>/<key>`. Writes
//! go to a sibling temp file that is renamed into place, so readers never
//! observe a half-written segment.

use std::path::{Component, Path, PathBuf};

use serde_json::Value;
use tokio::fs;

use riftscore_core::ports::IBulkStorage;

use crate::StoreError;

const TEMP_SUFFIX: &str = ".partial";

/// `IBulkStorage` rooted at a local directory
#[derive(Debug, Clone)]
pub struct FsBulkStorage {
    root: PathBuf,
}

impl FsBulkStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a `/`-separated key to a path under the root.
    fn resolve(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let valid = !key.is_empty()
            && !key.contains('\\')
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn key_of(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(parts.join("/"))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait::async_trait]
impl IBulkStorage for FsBulkStorage {
    async fn put_segment(&self, key: &str, docs: &[Value]) -> anyhow::Result<String> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }

        let body = serde_json::to_vec_pretty(docs)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;

        let mut temp = path.clone().into_os_string();
        temp.push(TEMP_SUFFIX);
        let temp = PathBuf::from(temp);

        fs::write(&temp, &body)
            .await
            .map_err(|e| io_error(&temp, e))?;
        fs::rename(&temp, &path)
            .await
            .map_err(|e| io_error(&path, e))?;

        tracing::debug!(
            segment = key,
            documents = docs.len(),
            bytes = body.len(),
            "Stored segment"
        );
        Ok(format!("file://{}", path.display()))
    }

    async fn get_segment(&self, key: &str) -> anyhow::Result<Vec<Value>> {
        let path = self.resolve(key)?;
        let bytes = fs::read(&path).await.map_err(|e| io_error(&path, e))?;
        let docs = serde_json::from_slice(&bytes).map_err(|e| {
            StoreError::SerializationError(format!("Segment {} is not a JSON array: {}", key, e))
        })?;
        Ok(docs)
    }

    async fn list_segments(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        let start = match prefix.rsplit_once('/') {
            Some((dir, _)) if !dir.is_empty() => self.resolve(dir)?,
            _ => self.root.clone(),
        };
        if !fs::try_exists(&start).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let mut pending = vec![start];
        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await.map_err(|e| io_error(&dir, e))?;
            while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&dir, e))? {
                let path = entry.path();
                let file_type = entry.file_type().await.map_err(|e| io_error(&path, e))?;
                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }
                let is_segment = path.extension().is_some_and(|ext| ext == "json");
                if !is_segment {
                    continue;
                }
                if let Some(key) = self.key_of(&path) {
                    if key.starts_with(prefix) {
                        keys.push(key);
                    }
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}
