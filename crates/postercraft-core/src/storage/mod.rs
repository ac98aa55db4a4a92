//! Project persistence.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::canvas::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Project not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async storage operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

fn default_name() -> String {
    "Untitled".to_string()
}

/// A saved project: a named document with timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    #[serde(default = "default_name")]
    pub name: String,
    pub document: Document,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(id: String, name: String, document: Document) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            document,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a stored record. Missing canvas settings are backfilled; a record
    /// whose document lacks an `elements` array is rejected.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Fresh project id.
pub fn new_project_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Trait for project storage backends.
///
/// A failed call never touches the editor's document; callers get a
/// [`StorageError`] and decide what to show.
pub trait ProjectStorage: Send + Sync {
    /// All usable projects, most recently updated first. Unreadable records
    /// are skipped.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<Project>>>;

    /// Save under `id` (or a fresh id when `None`). Returns the id used.
    /// Overwriting keeps the original creation time.
    fn save(
        &self,
        id: Option<&str>,
        name: &str,
        document: &Document,
    ) -> BoxFuture<'_, StorageResult<String>>;

    /// Full project record.
    fn get(&self, id: &str) -> BoxFuture<'_, StorageResult<Project>>;

    /// Delete a project. Deleting a missing project is not an error.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// The project's document.
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Document>> {
        let project = self.get(id);
        Box::pin(async move { project.await.map(|p| p.document) })
    }
}
