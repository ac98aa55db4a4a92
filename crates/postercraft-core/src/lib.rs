//! Postercraft Core Library
//!
//! Editable-document engine for the Postercraft poster designer: the element
//! model, text layout, undo/redo history, element operations, selection and
//! grouping, and project persistence.

pub mod canvas;
pub mod config;
pub mod editor;
pub mod geometry;
pub mod history;
pub mod id;
pub mod layout;
pub mod limits;
pub mod ops;
pub mod patch;
pub mod selection;
pub mod session;
pub mod shapes;
pub mod shortcuts;
pub mod snap;
pub mod storage;

pub use canvas::{
    Background, CanvasPreset, CanvasSettings, CanvasSize, Document, GradientDirection, GridSettings,
};
pub use config::EditorConfig;
pub use editor::Editor;
pub use history::{History, MAX_UNDO_HISTORY, Snapshot};
pub use id::{ElementId, IdGenerator, RandomIds, SeededIds};
pub use layout::{
    FallbackMetrics, FontSpec, LayoutLine, TextLayout, TextMeasurer, layout_text, wrap_paragraph,
};
pub use ops::{ImageInput, LayerMove};
pub use patch::{CommonPatch, ElementPatch, ImagePatch, ShapePatch, TextPatch};
pub use selection::{Clipboard, Selection};
pub use session::ProjectSession;
pub use shapes::{
    Element, ElementTrait, FontStyle, FontWeight, Group, Image, ImageFilters, SerializableColor,
    Shape, ShapeType, Text, TextAlign, TextShadow,
};
pub use shortcuts::{EditorAction, Key, KeyChord, ShortcutRegistry, action_for};
pub use snap::{CenterSnap, SnapResult, canvas_center_snap, snap_to_grid};
pub use storage::{FileStorage, MemoryStorage, Project, ProjectStorage, StorageError, StorageResult};
