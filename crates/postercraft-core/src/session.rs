//! Project session: an editor bound to a storage backend.
//!
//! Tracks which project is open and whether the document has changed since
//! it was last saved or opened. Storage failures are returned to the caller
//! and never touch the editor's document.

use crate::canvas::{CanvasSettings, Document};
use crate::editor::Editor;
use crate::storage::{Project, ProjectStorage, StorageResult};
use std::sync::Arc;

/// Name given to projects that were never named.
pub const DEFAULT_PROJECT_NAME: &str = "Untitled";

/// An editor together with the project it is editing.
pub struct ProjectSession<S: ProjectStorage> {
    /// Storage backend.
    storage: Arc<S>,
    editor: Editor,
    /// Project id being edited, `None` until first saved or opened.
    current_id: Option<String>,
    name: String,
    /// Document as of the last successful save/open/new.
    saved: Document,
}

impl<S: ProjectStorage> ProjectSession<S> {
    pub fn new(storage: Arc<S>, editor: Editor) -> Self {
        let saved = editor.document().clone();
        Self {
            storage,
            editor,
            current_id: None,
            name: DEFAULT_PROJECT_NAME.to_string(),
            saved,
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn project_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Check if the document has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        *self.editor.document() != self.saved
    }

    /// Save under the current id (a fresh one on first save).
    pub async fn save(&mut self) -> StorageResult<String> {
        let document = self.editor.document().clone();
        let result = self
            .storage
            .save(self.current_id.as_deref(), &self.name, &document)
            .await;
        match result {
            Ok(id) => {
                self.current_id = Some(id.clone());
                self.saved = document;
                Ok(id)
            }
            Err(e) => {
                log::error!("failed to save project '{}': {e}", self.name);
                Err(e)
            }
        }
    }

    /// Save as a new project with the given name.
    pub async fn save_as(&mut self, name: impl Into<String>) -> StorageResult<String> {
        let name = name.into();
        let document = self.editor.document().clone();
        match self.storage.save(None, &name, &document).await {
            Ok(id) => {
                self.current_id = Some(id.clone());
                self.name = name;
                self.saved = document;
                Ok(id)
            }
            Err(e) => {
                log::error!("failed to save project '{name}': {e}");
                Err(e)
            }
        }
    }

    /// Open a stored project, replacing the document and its history.
    pub async fn open(&mut self, id: &str) -> StorageResult<()> {
        let project = self.storage.get(id).await.inspect_err(|e| {
            log::error!("failed to open project {id}: {e}");
        })?;
        let Project { id, name, document, .. } = project;
        self.editor.load_state(document);
        self.saved = self.editor.document().clone();
        self.current_id = Some(id);
        self.name = name;
        log::info!("opened project '{}'", self.name);
        Ok(())
    }

    /// Start a fresh, unsaved project. Canvas settings carry over unless given.
    pub fn new_project(&mut self, settings: Option<CanvasSettings>) {
        self.editor.reset_history(settings);
        self.saved = self.editor.document().clone();
        self.current_id = None;
        self.name = DEFAULT_PROJECT_NAME.to_string();
    }

    /// Delete a stored project. Deleting the open project detaches the
    /// session from it; the document stays in the editor.
    pub async fn delete(&mut self, id: &str) -> StorageResult<()> {
        self.storage.delete(id).await.inspect_err(|e| {
            log::error!("failed to delete project {id}: {e}");
        })?;
        if self.current_id.as_deref() == Some(id) {
            self.current_id = None;
        }
        Ok(())
    }

    pub async fn list(&self) -> StorageResult<Vec<Project>> {
        self.storage.list().await
    }
}
