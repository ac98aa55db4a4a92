//! In-memory storage implementation.

use super::{BoxFuture, Project, ProjectStorage, StorageError, StorageResult, new_project_id};
use crate::canvas::Document;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    projects: RwLock<HashMap<String, Project>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl ProjectStorage for MemoryStorage {
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<Project>>> {
        Box::pin(async move {
            let projects = self.projects.read().map_err(lock_error)?;
            let mut list: Vec<Project> = projects.values().cloned().collect();
            list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(list)
        })
    }

    fn save(
        &self,
        id: Option<&str>,
        name: &str,
        document: &Document,
    ) -> BoxFuture<'_, StorageResult<String>> {
        let id = id.map(str::to_string).unwrap_or_else(new_project_id);
        let name = name.to_string();
        let document = document.clone();
        Box::pin(async move {
            let mut projects = self.projects.write().map_err(lock_error)?;
            match projects.get_mut(&id) {
                Some(existing) => {
                    existing.name = name;
                    existing.document = document;
                    existing.updated_at = Utc::now();
                }
                None => {
                    projects.insert(id.clone(), Project::new(id.clone(), name, document));
                }
            }
            Ok(id)
        })
    }

    fn get(&self, id: &str) -> BoxFuture<'_, StorageResult<Project>> {
        let id = id.to_string();
        Box::pin(async move {
            let projects = self.projects.read().map_err(lock_error)?;
            projects.get(&id).cloned().ok_or(StorageError::NotFound(id))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut projects = self.projects.write().map_err(lock_error)?;
            projects.remove(&id);
            Ok(())
        })
    }
}
