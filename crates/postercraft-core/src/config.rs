//! Editor tuning knobs.

use crate::history::MAX_UNDO_HISTORY;
use serde::{Deserialize, Serialize};

/// Editor configuration. Every field has a default, so partial JSON is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo entries kept before the oldest is evicted.
    pub history_limit: usize,
    /// Largest side of a freshly added image.
    pub image_max_dimension: f64,
    /// Offset applied to pasted elements.
    pub paste_offset: f64,
    /// Pasted top-left never goes beyond `canvas - paste_margin`.
    pub paste_margin: f64,
    pub nudge_step: f64,
    /// Nudge with Shift held.
    pub nudge_step_large: f64,
    pub scale_step_up: f64,
    pub scale_step_down: f64,
    /// Distance kept from the canvas edge when placing new elements.
    pub placement_margin: f64,
    /// Seed for pseudo-random placement of new elements.
    pub placement_seed: u64,
    /// Canvas-center snap distance in pixels.
    pub snap_threshold: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: MAX_UNDO_HISTORY,
            image_max_dimension: 300.0,
            paste_offset: 20.0,
            paste_margin: 50.0,
            nudge_step: 1.0,
            nudge_step_large: 10.0,
            scale_step_up: 1.1,
            scale_step_down: 0.9,
            placement_margin: 20.0,
            placement_seed: 0x5EED_C0DE,
            snap_threshold: 5.0,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
