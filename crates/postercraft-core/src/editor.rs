//! The editing session: history-backed document plus selection and clipboard.

use crate::canvas::{CanvasSettings, Document};
use crate::config::EditorConfig;
use crate::history::History;
use crate::id::{ElementId, IdGenerator, RandomIds, SplitMix64};
use crate::layout::{FallbackMetrics, TextMeasurer};
use crate::limits::{self, clamp};
use crate::patch::{clamp_size, clamp_text_width};
use crate::selection::{Clipboard, Selection};
use crate::shapes::Element;
use crate::shortcuts::EditorAction;
use kurbo::{Point, Size};
use std::sync::Arc;

/// Owns the document history and every piece of per-session editing state.
///
/// All document mutations go through the history: discrete operations are
/// single undo steps, live updates only touch the present and are expected to
/// be wrapped in [`Editor::begin_interaction`] / [`Editor::end_interaction`].
pub struct Editor {
    pub(crate) history: History<Document>,
    pub(crate) selection: Selection,
    pub(crate) clipboard: Option<Clipboard>,
    pub(crate) ids: Box<dyn IdGenerator>,
    pub(crate) placement: SplitMix64,
    pub(crate) config: EditorConfig,
    /// Wraps text to derive its height; should match the renderer's fonts.
    pub(crate) measurer: Arc<dyn TextMeasurer>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("elements", &self.document().len())
            .field("past", &self.history.past_len())
            .field("future", &self.history.future_len())
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

impl Editor {
    /// Editor with random UUID ids.
    pub fn new(config: EditorConfig) -> Self {
        Self::with_ids(config, Box::new(RandomIds))
    }

    /// Editor with an injected id source (seeded in tests).
    pub fn with_ids(config: EditorConfig, ids: Box<dyn IdGenerator>) -> Self {
        let history = History::with_limit(Document::new(), config.history_limit);
        Self {
            history,
            selection: Selection::default(),
            clipboard: None,
            ids,
            placement: SplitMix64::new(config.placement_seed),
            config,
            measurer: Arc::new(FallbackMetrics),
        }
    }

    /// Measure text with `measurer` (typically the export font book) so
    /// text heights, snapping and grouping agree with rendered output.
    ///
    /// The present document is re-laid out in place; history entries
    /// recorded before the switch keep their old heights.
    pub fn with_text_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.measurer = measurer;
        let measurer = &*self.measurer;
        let changed = self.history.update_present_only(|doc| doc.relayout_text(measurer));
        log::debug!("re-laid out {changed} text element(s)");
        self
    }

    pub fn text_measurer(&self) -> &dyn TextMeasurer {
        &*self.measurer
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The present document.
    pub fn document(&self) -> &Document {
        self.history.present()
    }

    pub fn history(&self) -> &History<Document> {
        &self.history
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.document().get(id)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.history.undo();
        if changed {
            self.prune_selection();
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.history.redo();
        if changed {
            self.prune_selection();
        }
        changed
    }

    /// Start a continuous gesture (drag, resize, rotate).
    pub fn begin_interaction(&mut self) {
        self.history.begin_interaction();
    }

    /// Finish a gesture; it becomes one undo step if anything changed.
    pub fn end_interaction(&mut self) -> bool {
        self.history.end_interaction()
    }

    /// Abandon a gesture, restoring the state from before it began.
    pub fn cancel_interaction(&mut self) -> bool {
        self.history.cancel_interaction()
    }

    /// Replace the history with an empty document ("new project").
    /// Canvas settings are kept unless `settings` is given.
    pub fn reset_history(&mut self, settings: Option<CanvasSettings>) {
        let settings = settings.unwrap_or_else(|| self.document().canvas_settings.clone());
        self.history.reset(Document::with_settings(settings));
        self.selection.clear();
        log::debug!("history reset");
    }

    /// Replace the history with a loaded document. Loading is not undoable.
    pub fn load_state(&mut self, mut document: Document) {
        log::debug!("loading document with {} elements", document.len());
        document.relayout_text(&*self.measurer);
        self.history.reset(document);
        self.selection.clear();
    }

    // --- live updates (present only) ---

    pub fn update_position(&mut self, id: ElementId, position: Point) -> bool {
        self.update_live(id, |e| e.set_position(position))
    }

    pub fn update_rotation(&mut self, id: ElementId, degrees: f64) -> bool {
        self.update_live(id, |e| e.set_rotation(degrees))
    }

    /// Resize. Text only has a wrap width, so its height component is ignored.
    pub fn update_size(&mut self, id: ElementId, size: Size) -> bool {
        self.update_live(id, |e| match e {
            Element::Text(t) => t.width = clamp_text_width(size.width),
            Element::Image(i) => i.size = clamp_size(size),
            Element::Shape(s) => s.size = clamp_size(size),
            Element::Group(g) => g.size = clamp_size(size),
        })
    }

    pub fn update_text_width(&mut self, id: ElementId, width: f64) -> bool {
        self.update_live(id, |e| {
            if let Element::Text(t) = e {
                t.width = clamp_text_width(width);
            }
        })
    }

    fn update_live(&mut self, id: ElementId, update: impl FnOnce(&mut Element)) -> bool {
        let measurer = &*self.measurer;
        self.history.update_present_only(|doc| match doc.get_mut(id) {
            Some(element) => {
                update(element);
                if let Some(text) = element.as_text_mut() {
                    text.relayout(measurer);
                }
                true
            }
            None => false,
        })
    }

    // --- canvas ---

    /// Replace canvas settings as one undo step. Dimensions are clamped.
    pub fn update_canvas_settings(&mut self, mut settings: CanvasSettings) -> bool {
        let size = &mut settings.canvas_size;
        size.width = clamp(size.width, limits::CANVAS_DIMENSION);
        size.height = clamp(size.height, limits::CANVAS_DIMENSION);
        settings.grid.size = clamp(settings.grid.size, limits::GRID_SIZE);
        if settings == self.document().canvas_settings {
            return false;
        }
        self.history.push_edit(|doc| doc.canvas_settings = settings);
        true
    }

    /// Dispatch a keyboard action. Returns whether the document or selection
    /// changed. Save/Open belong to the host and are never handled here.
    pub fn apply_action(&mut self, action: EditorAction) -> bool {
        match action {
            EditorAction::DeleteSelection => {
                let ids = self.selection.ids().to_vec();
                self.delete_selected(&ids)
            }
            EditorAction::Undo => self.undo(),
            EditorAction::Redo => self.redo(),
            EditorAction::Copy => self.copy(),
            EditorAction::Paste => self.paste().is_some(),
            EditorAction::Duplicate => self.duplicate().is_some(),
            EditorAction::Group => self.group_selected().is_some(),
            EditorAction::Ungroup => self.ungroup_selected().is_some(),
            EditorAction::ScaleUp => self.scale_selected(self.config.scale_step_up),
            EditorAction::ScaleDown => self.scale_selected(self.config.scale_step_down),
            EditorAction::Nudge { dx, dy, large } => {
                let step = if large {
                    self.config.nudge_step_large
                } else {
                    self.config.nudge_step
                };
                self.move_selected(dx as f64 * step, dy as f64 * step)
            }
            EditorAction::Escape => {
                let had = !self.selection.is_empty();
                self.selection.clear();
                had
            }
            EditorAction::Save | EditorAction::Open => {
                log::debug!("{action:?} is handled by the host");
                false
            }
        }
    }

    pub(crate) fn next_id(&mut self) -> ElementId {
        self.ids.next_id()
    }

    /// Drop selected ids that no longer exist in the present document.
    pub(crate) fn prune_selection(&mut self) {
        let doc = self.history.present();
        self.selection.retain(|id| doc.contains(id));
    }
}
