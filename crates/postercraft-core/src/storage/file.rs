//! File-based storage implementation.

use super::{BoxFuture, Project, ProjectStorage, StorageError, StorageResult, new_project_id};
use crate::canvas::Document;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

/// File-based storage: one JSON file per project in a base directory.
pub struct FileStorage {
    /// Base directory for project storage.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location
    /// (`<local data dir>/postercraft/projects`).
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("postercraft").join("projects"))
    }

    /// Get the file path for a project ID.
    fn project_path(&self, id: &str) -> PathBuf {
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_id))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn read_project(path: &Path, id: &str) -> StorageResult<Project> {
        if !path.exists() {
            return Err(StorageError::NotFound(id.to_string()));
        }
        let json = fs::read_to_string(path)
            .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        Project::from_json(&json).map_err(|e| {
            StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}

impl ProjectStorage for FileStorage {
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<Project>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }
            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let mut projects = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().map(|e| e != "json").unwrap_or(true) {
                    continue;
                }
                let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
                match Self::read_project(&path, stem) {
                    Ok(project) => projects.push(project),
                    Err(e) => log::warn!("skipping unreadable project: {e}"),
                }
            }
            projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(projects)
        })
    }

    fn save(
        &self,
        id: Option<&str>,
        name: &str,
        document: &Document,
    ) -> BoxFuture<'_, StorageResult<String>> {
        let id = id.map(str::to_string).unwrap_or_else(new_project_id);
        let path = self.project_path(&id);
        let name = name.to_string();
        let document = document.clone();
        Box::pin(async move {
            let project = match Self::read_project(&path, &id) {
                Ok(mut existing) => {
                    existing.name = name;
                    existing.document = document;
                    existing.updated_at = Utc::now();
                    existing
                }
                Err(_) => Project::new(id.clone(), name, document),
            };
            let json = project
                .to_json()
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            fs::write(&path, json).map_err(|e| {
                log::error!("failed to save project {id}: {e}");
                StorageError::Io(format!("Failed to write {}: {}", path.display(), e))
            })?;
            log::info!("saved project {id} to {}", path.display());
            Ok(id)
        })
    }

    fn get(&self, id: &str) -> BoxFuture<'_, StorageResult<Project>> {
        let path = self.project_path(id);
        let id = id.to_string();
        Box::pin(async move { Self::read_project(&path, &id) })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.project_path(id);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }
}
