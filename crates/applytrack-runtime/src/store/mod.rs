//! Document store abstraction.
//!
//! Documents are flat JSON field maps addressed by hierarchical paths
//! (`users/{uid}/insights/latest`). Writes either overwrite a whole
//! document (`set`) or patch named fields (`update`). There are no
//! transactions: concurrent writers race and the last write wins.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::config::StoreSettings;

/// A stored document: a flat field map.
pub type Document = Map<String, Value>;

/// Errors from a document store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid document path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Failed to encode document: {0}")]
    Encode(String),

    #[error("Failed to decode document at {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Hierarchical address of a document: alternating collection/document ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl DocumentPath {
    /// Build a path from segments.
    ///
    /// Segments must be non-empty, contain no `/`, and come in
    /// collection/document pairs.
    pub fn new<I, S>(segments: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        let joined = segments.join("/");

        if segments.is_empty() || segments.len() % 2 != 0 {
            return Err(StoreError::InvalidPath {
                path: joined,
                reason: "expected collection/document pairs".to_string(),
            });
        }

        for segment in &segments {
            if segment.is_empty() || segment.contains('/') || segment == "." || segment == ".." {
                return Err(StoreError::InvalidPath {
                    path: joined,
                    reason: format!("bad segment '{}'", segment),
                });
            }
        }

        Ok(Self { segments })
    }

    /// `users/{uid}/insights/latest`
    pub fn user_insights(user_id: &str) -> Result<Self, StoreError> {
        Self::new(["users", user_id, "insights", "latest"])
    }

    /// `users/{uid}/applications/{aid}/summary/latest`
    pub fn application_summary(user_id: &str, application_id: &str) -> Result<Self, StoreError> {
        Self::new([
            "users",
            user_id,
            "applications",
            application_id,
            "summary",
            "latest",
        ])
    }

    /// `ai_rate_limits/{YYYY-MM-DD}`
    pub fn rate_limits(day: &str) -> Result<Self, StoreError> {
        Self::new(["ai_rate_limits", day])
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// One field operation in an `update`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    /// Replace the field.
    Set(Value),

    /// Append values not already present in the array field.
    ArrayUnion(Vec<Value>),
}

/// Named-field patch applied by [`DocumentStore::update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    fields: Vec<(String, FieldOp)>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((field.into(), FieldOp::Set(value.into())));
        self
    }

    pub fn array_union(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.fields.push((field.into(), FieldOp::ArrayUnion(values)));
        self
    }

    /// Apply to a document in place.
    pub fn apply(&self, doc: &mut Document) {
        for (field, op) in &self.fields {
            match op {
                FieldOp::Set(value) => {
                    doc.insert(field.clone(), value.clone());
                }
                FieldOp::ArrayUnion(values) => {
                    let slot = doc
                        .entry(field.clone())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    if !slot.is_array() {
                        *slot = Value::Array(Vec::new());
                    }
                    if let Value::Array(items) = slot {
                        for value in values {
                            if !items.contains(value) {
                                items.push(value.clone());
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Remote document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document; `None` if it does not exist.
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError>;

    /// Overwrite a document.
    async fn set(&self, path: &DocumentPath, doc: Document) -> Result<(), StoreError>;

    /// Patch named fields of an existing document.
    ///
    /// Fails with [`StoreError::NotFound`] if the document does not exist.
    async fn update(&self, path: &DocumentPath, patch: Patch) -> Result<(), StoreError>;

    /// Backend name for logs.
    fn name(&self) -> &str;
}

/// Serialize a typed record into a document.
pub fn to_document<T: Serialize>(record: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(record).map_err(|e| StoreError::Encode(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Encode(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Deserialize a document into a typed record.
pub fn from_document<T: DeserializeOwned>(
    path: &DocumentPath,
    doc: Document,
) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(doc)).map_err(|e| StoreError::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

/// Open the backend described by the settings.
pub fn open_store(settings: &StoreSettings) -> Arc<dyn DocumentStore> {
    match settings {
        StoreSettings::Memory => Arc::new(MemoryStore::new()),
        StoreSettings::File { root } => Arc::new(FileStore::new(root.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_validation() {
        assert!(DocumentPath::new(["users", "u1"]).is_ok());
        assert!(DocumentPath::new(["users"]).is_err());
        assert!(DocumentPath::new(Vec::<String>::new()).is_err());
        assert!(DocumentPath::new(["users", "a/b"]).is_err());
        assert!(DocumentPath::new(["users", ""]).is_err());
        assert!(DocumentPath::new(["users", ".."]).is_err());

        let path = DocumentPath::application_summary("u1", "app-9").unwrap();
        assert_eq!(path.to_string(), "users/u1/applications/app-9/summary/latest");
    }

    #[test]
    fn test_patch_set_and_array_union() {
        let mut doc = to_document(&json!({"failedModels": ["a"], "date": "2025-01-01"})).unwrap();

        Patch::new()
            .array_union("failedModels", vec![json!("a"), json!("b")])
            .set("lastUpdated", "later")
            .apply(&mut doc);

        assert_eq!(doc["failedModels"], json!(["a", "b"]));
        assert_eq!(doc["lastUpdated"], json!("later"));
        assert_eq!(doc["date"], json!("2025-01-01"));
    }

    #[test]
    fn test_array_union_creates_missing_field() {
        let mut doc = Document::new();
        Patch::new()
            .array_union("tags", vec![json!("x"), json!("x")])
            .apply(&mut doc);
        assert_eq!(doc["tags"], json!(["x"]));
    }

    #[test]
    fn test_to_document_rejects_non_objects() {
        assert!(matches!(to_document(&json!([1, 2])), Err(StoreError::Encode(_))));
    }
}
