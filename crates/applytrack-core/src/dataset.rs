//! Loading application and note lists from YAML/JSON files.
//!
//! The tracker's CRUD layer lives elsewhere; these files are how the CLI
//! and tests hand plain `Application`/`Note` lists to the runtime.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::types::{Application, Note};

/// Errors that can occur when loading a dataset.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read dataset file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Dataset validation failed: {0}")]
    ValidationError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// A user's applications as stored in a dataset file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationBook {
    #[serde(default)]
    pub applications: Vec<Application>,
}

/// Notes for one application as stored in a dataset file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteBook {
    #[serde(default)]
    pub notes: Vec<Note>,
}

/// Shared parse/validate entry points for dataset files.
pub trait Dataset: DeserializeOwned + Sized {
    /// Check invariants after deserialization.
    fn validate(&self) -> Result<(), DatasetError>;

    /// Parse from YAML.
    fn from_yaml(yaml: &str) -> Result<Self, DatasetError> {
        let book: Self = serde_yaml::from_str(yaml)?;
        book.validate()?;
        Ok(book)
    }

    /// Parse from JSON.
    fn from_json(json: &str) -> Result<Self, DatasetError> {
        let book: Self = serde_json::from_str(json)?;
        book.validate()?;
        Ok(book)
    }

    /// Load from a file, picking the format from the extension.
    ///
    /// `.json` is parsed as JSON; anything else as YAML (a superset).
    fn from_file(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Loading dataset file");
        let contents = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }
}

impl Dataset for ApplicationBook {
    fn validate(&self) -> Result<(), DatasetError> {
        for (index, app) in self.applications.iter().enumerate() {
            if app.company_name.trim().is_empty() {
                return Err(DatasetError::MissingField(format!(
                    "applications[{index}].companyName"
                )));
            }
            if app.role.trim().is_empty() {
                return Err(DatasetError::MissingField(format!("applications[{index}].role")));
            }
        }
        validate_unique_ids(self.applications.iter().map(|a| a.id.as_str()), "application")
    }
}

impl Dataset for NoteBook {
    fn validate(&self) -> Result<(), DatasetError> {
        for (index, note) in self.notes.iter().enumerate() {
            if note.content.trim().is_empty() {
                return Err(DatasetError::MissingField(format!("notes[{index}].content")));
            }
        }
        validate_unique_ids(self.notes.iter().map(|n| n.id.as_str()), "note")
    }
}

fn validate_unique_ids<'a>(
    ids: impl Iterator<Item = &'a str>,
    kind: &str,
) -> Result<(), DatasetError> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            return Err(DatasetError::MissingField(format!("{kind} id")));
        }
        if !seen.insert(id) {
            return Err(DatasetError::ValidationError(format!(
                "Duplicate {kind} ID: {id}"
            )));
        }
    }
    Ok(())
}
