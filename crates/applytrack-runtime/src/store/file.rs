//! Document store persisted as JSON files.
//!
//! `users/u1/insights/latest` lives at `<root>/users/u1/insights/latest.json`.

use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{Document, DocumentPath, DocumentStore, Patch, StoreError};

/// File-backed document store.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_for(&self, path: &DocumentPath) -> PathBuf {
        let mut file = self.root.clone();
        let segments = path.segments();
        let (last, parents) = match segments.split_last() {
            Some(split) => split,
            None => return file,
        };
        for segment in parents {
            file.push(segment);
        }
        file.push(format!("{last}.json"));
        file
    }

    async fn read(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let file = self.file_for(path);
        let bytes = match tokio::fs::read(&file).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(doc)) => Ok(Some(doc)),
            Ok(_) => Err(StoreError::Decode {
                path: path.to_string(),
                reason: "stored value is not an object".to_string(),
            }),
            Err(e) => Err(StoreError::Decode {
                path: path.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn write(&self, path: &DocumentPath, doc: &Document) -> Result<(), StoreError> {
        let file = self.file_for(path);
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(doc).map_err(|e| StoreError::Encode(e.to_string()))?;

        // Readers never observe a partially written file.
        let tmp = file.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &file).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        self.read(path).await
    }

    async fn set(&self, path: &DocumentPath, doc: Document) -> Result<(), StoreError> {
        self.write(path, &doc).await
    }

    async fn update(&self, path: &DocumentPath, patch: Patch) -> Result<(), StoreError> {
        let mut doc = self
            .read(path)
            .await?
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        patch.apply(&mut doc);
        self.write(path, &doc).await
    }

    fn name(&self) -> &str {
        "file"
    }
}
