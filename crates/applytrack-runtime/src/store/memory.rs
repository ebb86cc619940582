//! In-process document store.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::{Document, DocumentPath, DocumentStore, Patch, StoreError};

/// Document store backed by a map. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<DocumentPath, Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        Ok(self.documents.read().get(path).cloned())
    }

    async fn set(&self, path: &DocumentPath, doc: Document) -> Result<(), StoreError> {
        self.documents.write().insert(path.clone(), doc);
        Ok(())
    }

    async fn update(&self, path: &DocumentPath, patch: Patch) -> Result<(), StoreError> {
        let mut documents = self.documents.write();
        let doc = documents
            .get_mut(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        patch.apply(doc);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
