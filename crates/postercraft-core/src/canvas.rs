//! Canvas document and settings.

use crate::geometry::element_affine;
use crate::history::Snapshot;
use crate::id::ElementId;
use crate::layout::TextMeasurer;
use crate::shapes::{Element, SerializableColor};
use kurbo::{Affine, Point};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Direction of a two-stop background gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GradientDirection {
    /// Left to right.
    #[default]
    Horizontal,
    /// Top to bottom.
    Vertical,
    /// Top-left corner to bottom-right corner.
    Diagonal,
}

/// Canvas background fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Background {
    Solid {
        color: SerializableColor,
    },
    Gradient {
        direction: GradientDirection,
        start: SerializableColor,
        end: SerializableColor,
    },
}

impl Default for Background {
    fn default() -> Self {
        Background::Solid {
            color: SerializableColor::white(),
        }
    }
}

/// Named canvas size presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CanvasPreset {
    #[default]
    Custom,
    InstagramPost,
    InstagramStory,
    FacebookCover,
    TwitterPost,
    YoutubeThumbnail,
    A4Portrait,
    A4Landscape,
    Poster,
}

impl CanvasPreset {
    pub const ALL: [CanvasPreset; 9] = [
        CanvasPreset::Custom,
        CanvasPreset::InstagramPost,
        CanvasPreset::InstagramStory,
        CanvasPreset::FacebookCover,
        CanvasPreset::TwitterPost,
        CanvasPreset::YoutubeThumbnail,
        CanvasPreset::A4Portrait,
        CanvasPreset::A4Landscape,
        CanvasPreset::Poster,
    ];

    /// Pixel dimensions, `None` for `Custom`.
    pub fn dimensions(self) -> Option<(f64, f64)> {
        match self {
            CanvasPreset::Custom => None,
            CanvasPreset::InstagramPost => Some((1080.0, 1080.0)),
            CanvasPreset::InstagramStory => Some((1080.0, 1920.0)),
            CanvasPreset::FacebookCover => Some((820.0, 312.0)),
            CanvasPreset::TwitterPost => Some((1200.0, 675.0)),
            CanvasPreset::YoutubeThumbnail => Some((1280.0, 720.0)),
            CanvasPreset::A4Portrait => Some((794.0, 1123.0)),
            CanvasPreset::A4Landscape => Some((1123.0, 794.0)),
            CanvasPreset::Poster => Some((1800.0, 2400.0)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CanvasPreset::Custom => "Custom",
            CanvasPreset::InstagramPost => "Instagram Post",
            CanvasPreset::InstagramStory => "Instagram Story",
            CanvasPreset::FacebookCover => "Facebook Cover",
            CanvasPreset::TwitterPost => "Twitter Post",
            CanvasPreset::YoutubeThumbnail => "YouTube Thumbnail",
            CanvasPreset::A4Portrait => "A4 Portrait",
            CanvasPreset::A4Landscape => "A4 Landscape",
            CanvasPreset::Poster => "Poster",
        }
    }
}

/// Canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSize {
    pub preset: CanvasPreset,
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    pub const DEFAULT_WIDTH: f64 = 800.0;
    pub const DEFAULT_HEIGHT: f64 = 600.0;

    pub fn custom(width: f64, height: f64) -> Self {
        Self {
            preset: CanvasPreset::Custom,
            width,
            height,
        }
    }

    /// Size for a preset; `Custom` yields the default dimensions.
    pub fn from_preset(preset: CanvasPreset) -> Self {
        let (width, height) = preset
            .dimensions()
            .unwrap_or((Self::DEFAULT_WIDTH, Self::DEFAULT_HEIGHT));
        Self {
            preset,
            width,
            height,
        }
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::custom(Self::DEFAULT_WIDTH, Self::DEFAULT_HEIGHT)
    }
}

/// Editing grid overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    pub enabled: bool,
    /// Grid spacing in pixels.
    pub size: f64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            size: 20.0,
        }
    }
}

/// Canvas-wide settings. Every field is backfilled when missing from stored data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    pub background: Background,
    pub canvas_size: CanvasSize,
    pub grid: GridSettings,
}

/// The full editable state: the unit of undo/redo and persistence.
///
/// Elements are reference counted so cloning a document for history shares
/// every untouched element. Mutation goes through [`Document::get_mut`], which
/// copies an element on write.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub elements: Vec<Arc<Element>>,
    #[serde(default)]
    pub canvas_settings: CanvasSettings,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(canvas_settings: CanvasSettings) -> Self {
        Self {
            elements: Vec::new(),
            canvas_settings,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn canvas_width(&self) -> f64 {
        self.canvas_settings.canvas_size.width
    }

    pub fn canvas_height(&self) -> f64 {
        self.canvas_settings.canvas_size.height
    }

    /// Append an element.
    pub fn push(&mut self, element: Element) {
        self.elements.push(Arc::new(element));
    }

    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id() == id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id() == id).map(|e| e.as_ref())
    }

    /// Mutable access; clones the element if a history snapshot shares it.
    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements
            .iter_mut()
            .find(|e| e.id() == id)
            .map(Arc::make_mut)
    }

    /// Remove every element whose id is in `ids`. Returns how many were removed.
    pub fn remove_all(&mut self, ids: &HashSet<ElementId>) -> usize {
        let before = self.elements.len();
        self.elements.retain(|e| !ids.contains(&e.id()));
        before - self.elements.len()
    }

    /// Next free z-index for an appended element.
    pub fn next_z_index(&self) -> u32 {
        self.elements.len() as u32 + 1
    }

    /// All elements sorted by ascending z-index (ties keep storage order).
    pub fn paint_order(&self) -> Vec<&Element> {
        let mut ordered: Vec<&Element> = self.elements.iter().map(|e| e.as_ref()).collect();
        ordered.sort_by_key(|e| e.z_index());
        ordered
    }

    /// Ids in ascending z-index order.
    pub fn ids_in_paint_order(&self) -> Vec<ElementId> {
        self.paint_order().iter().map(|e| e.id()).collect()
    }

    /// Reassign z-indices 1..=N following `order`. Elements missing from
    /// `order` are appended in their current paint order.
    pub fn renumber(&mut self, order: &[ElementId]) {
        let mut full: Vec<ElementId> =
            order.iter().copied().filter(|id| self.contains(*id)).collect();
        let listed: HashSet<ElementId> = full.iter().copied().collect();
        for id in self.ids_in_paint_order() {
            if !listed.contains(&id) {
                full.push(id);
            }
        }
        let ranks: HashMap<ElementId, u32> = full
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i as u32 + 1))
            .collect();
        for element in &mut self.elements {
            if let Some(&z) = ranks.get(&element.id()) {
                if element.z_index() != z {
                    Arc::make_mut(element).set_z_index(z);
                }
            }
        }
    }

    /// Re-wrap every text element with `measurer` so its height matches the
    /// lines that will be drawn. Only texts whose height changes are copied.
    /// Returns how many changed.
    pub fn relayout_text(&mut self, measurer: &dyn TextMeasurer) -> usize {
        let mut changed = 0;
        for element in &mut self.elements {
            let Some(text) = element.as_text() else {
                continue;
            };
            let height = text.layout(measurer).height();
            if text.height() == height {
                continue;
            }
            if let Some(text) = Arc::make_mut(element).as_text_mut() {
                text.set_measured_height(height);
                changed += 1;
            }
        }
        changed
    }

    /// The group directly containing `id`, if any.
    pub fn parent_of(&self, id: ElementId) -> Option<ElementId> {
        self.elements
            .iter()
            .filter_map(|e| e.as_group())
            .find(|g| g.contains(id))
            .map(|g| g.id)
    }

    pub fn is_grouped(&self, id: ElementId) -> bool {
        self.parent_of(id).is_some()
    }

    /// Every id referenced as a child by some group.
    pub fn grouped_ids(&self) -> HashSet<ElementId> {
        self.elements
            .iter()
            .filter_map(|e| e.as_group())
            .flat_map(|g| g.child_ids.iter().copied())
            .collect()
    }

    /// Elements not owned by any group, in paint order.
    pub fn top_level(&self) -> Vec<&Element> {
        let grouped = self.grouped_ids();
        self.paint_order()
            .into_iter()
            .filter(|e| !grouped.contains(&e.id()))
            .collect()
    }

    /// Ancestor chain from the direct parent outwards.
    pub fn ancestors(&self, id: ElementId) -> Vec<ElementId> {
        let mut chain = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent_of(current) {
            if parent == id || chain.contains(&parent) {
                log::warn!("group cycle detected at {parent}");
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Every id below `id` in the group tree (children, grandchildren, ...).
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(group) = self.get(current).and_then(|e| e.as_group()) else {
                continue;
            };
            for child in &group.child_ids {
                if *child != id && !out.contains(child) {
                    out.push(*child);
                    stack.push(*child);
                }
            }
        }
        out
    }

    /// Absolute canvas position of an element's top-left corner.
    pub fn absolute_position(&self, id: ElementId) -> Option<Point> {
        let element = self.get(id)?;
        let mut pos = element.position();
        for ancestor in self.ancestors(id) {
            if let Some(group) = self.get(ancestor) {
                pos += group.position().to_vec2();
            }
        }
        Some(pos)
    }

    /// Full transform of an element in canvas space: every ancestor group's
    /// center transform wrapping the element's own.
    pub fn absolute_affine(&self, id: ElementId) -> Option<Affine> {
        let element = self.get(id)?;
        let origin = self.absolute_position(id)?;
        let mut affine =
            element_affine(origin, element.size(), element.rotation(), element.scale());
        for ancestor in self.ancestors(id) {
            let Some(group) = self.get(ancestor) else {
                continue;
            };
            let Some(group_origin) = self.absolute_position(ancestor) else {
                continue;
            };
            let group_affine =
                element_affine(group_origin, group.size(), group.rotation(), group.scale());
            affine = group_affine * affine;
        }
        Some(affine)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a stored document. Missing canvas settings are backfilled;
    /// a record without an `elements` array is rejected.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let has_elements = value
            .get("elements")
            .map(|e| e.is_array())
            .unwrap_or(false);
        if !has_elements {
            return Err(serde::de::Error::missing_field("elements"));
        }
        serde_json::from_value(value)
    }
}

impl Snapshot for Document {
    /// Unique ids and resolvable group children.
    fn is_well_formed(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.elements.len());
        if !self.elements.iter().all(|e| seen.insert(e.id())) {
            return false;
        }
        self.elements
            .iter()
            .filter_map(|e| e.as_group())
            .all(|g| g.child_ids.iter().all(|c| seen.contains(c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{IdGenerator, SeededIds};
    use crate::shapes::{Group, Shape, ShapeType};
    use kurbo::Size;

    fn shape_at(ids: &mut SeededIds, x: f64, y: f64, z: u32) -> Element {
        let mut shape = Shape::new(ids.next_id(), ShapeType::Rectangle, Point::new(x, y));
        shape.z_index = z;
        Element::Shape(shape)
    }

    #[test]
    fn test_backfills_missing_settings() {
        let doc = Document::from_json(r#"{"elements": []}"#).unwrap();
        assert_eq!(doc.canvas_settings, CanvasSettings::default());
        assert_eq!(doc.canvas_width(), 800.0);

        let json = r#"{"elements": [], "canvas_settings": {"grid": {"enabled": true}}}"#;
        let doc = Document::from_json(json)
            .unwrap();
        assert!(doc.canvas_settings.grid.enabled);
        assert_eq!(doc.canvas_settings.grid.size, 20.0);
        assert_eq!(doc.canvas_settings.background, Background::default());
    }

    #[test]
    fn test_rejects_record_without_elements() {
        assert!(Document::from_json(r#"{"canvas_settings": {}}"#).is_err());
        assert!(Document::from_json(r#"{"elements": 3}"#).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let mut ids = SeededIds::new(1);
        let mut doc = Document::new();
        doc.push(shape_at(&mut ids, 5.0, 5.0, 1));
        doc.canvas_settings.background = Background::Gradient {
            direction: GradientDirection::Diagonal,
            start: SerializableColor::black(),
            end: SerializableColor::white(),
        };
        let json = doc.to_json().unwrap();
        assert_eq!(Document::from_json(&json).unwrap(), doc);
    }

    #[test]
    fn test_clone_shares_until_write() {
        let mut ids = SeededIds::new(1);
        let mut doc = Document::new();
        doc.push(shape_at(&mut ids, 0.0, 0.0, 1));
        let id = doc.elements[0].id();
        let snapshot = doc.clone();
        assert!(Arc::ptr_eq(&doc.elements[0], &snapshot.elements[0]));

        doc.get_mut(id).unwrap().set_position(Point::new(9.0, 9.0));
        assert!(!Arc::ptr_eq(&doc.elements[0], &snapshot.elements[0]));
        assert_eq!(snapshot.get(id).unwrap().position(), Point::ZERO);
    }

    #[test]
    fn test_renumber_is_dense() {
        let mut ids = SeededIds::new(1);
        let mut doc = Document::new();
        doc.push(shape_at(&mut ids, 0.0, 0.0, 7));
        doc.push(shape_at(&mut ids, 0.0, 0.0, 3));
        doc.push(shape_at(&mut ids, 0.0, 0.0, 3));
        let order = doc.ids_in_paint_order();
        doc.renumber(&order);
        let mut zs: Vec<u32> = doc.elements.iter().map(|e| e.z_index()).collect();
        zs.sort();
        assert_eq!(zs, vec![1, 2, 3]);
        assert_eq!(doc.ids_in_paint_order(), order);
    }

    #[test]
    fn test_group_tree_queries() {
        let mut ids = SeededIds::new(1);
        let mut doc = Document::new();
        let child = shape_at(&mut ids, 10.0, 10.0, 1);
        let child_id = child.id();
        doc.push(child);
        let inner_size = Size::new(50.0, 50.0);
        let inner = Group::new(ids.next_id(), Point::new(100.0, 100.0), inner_size, vec![child_id]);
        let inner_id = inner.id;
        doc.push(Element::Group(inner));
        let outer_size = Size::new(200.0, 200.0);
        let outer = Group::new(ids.next_id(), Point::new(5.0, 5.0), outer_size, vec![inner_id]);
        let outer_id = outer.id;
        doc.push(Element::Group(outer));

        assert_eq!(doc.parent_of(child_id), Some(inner_id));
        assert_eq!(doc.ancestors(child_id), vec![inner_id, outer_id]);
        assert_eq!(doc.absolute_position(child_id), Some(Point::new(115.0, 115.0)));
        let mut desc = doc.descendants(outer_id);
        desc.sort();
        let mut expected = vec![inner_id, child_id];
        expected.sort();
        assert_eq!(desc, expected);
        assert_eq!(doc.top_level().len(), 1);
        assert!(doc.is_well_formed());
    }

    #[test]
    fn test_dangling_child_is_not_well_formed() {
        let mut ids = SeededIds::new(1);
        let mut doc = Document::new();
        doc.push(Element::Group(Group::new(
            ids.next_id(),
            Point::ZERO,
            Size::new(1.0, 1.0),
            vec![ids.next_id()],
        )));
        assert!(!doc.is_well_formed());
    }

    #[test]
    fn test_preset_sizes() {
        let size = CanvasSize::from_preset(CanvasPreset::InstagramStory);
        assert_eq!((size.width, size.height), (1080.0, 1920.0));
        assert_eq!(CanvasSize::from_preset(CanvasPreset::Custom), CanvasSize::default());
    }

    /// 20px per character, so every four-letter word fills its own line.
    struct WideGlyphs;

    impl TextMeasurer for WideGlyphs {
        fn measure(&self, text: &str, _: &crate::layout::FontSpec<'_>) -> f64 {
            text.chars().count() as f64 * 20.0
        }
    }

    #[test]
    fn test_relayout_text_moves_the_rotation_center() {
        let mut ids = SeededIds::new(1);
        let mut doc = Document::new();
        let position = Point::new(100.0, 150.0);
        let mut text = crate::shapes::Text::new(ids.next_id(), position, "AAAA BBBB CCCC".into());
        text.width = 100.0;
        text.font_size = 20.0;
        text.rotation = 180.0;
        let id = text.id;
        doc.push(Element::Text(text));

        assert_eq!(doc.relayout_text(&WideGlyphs), 1);
        assert_eq!(doc.relayout_text(&WideGlyphs), 0);
        let height = 3.0 * 24.0 + 16.0;
        assert!((doc.get(id).unwrap().size().height - height).abs() < 1e-9);

        // A half turn maps the box onto itself.
        let affine = doc.absolute_affine(id).unwrap();
        let top_left = affine * Point::new(100.0, 150.0);
        assert!((top_left.x - 200.0).abs() < 1e-9);
        assert!((top_left.y - (150.0 + height)).abs() < 1e-9);
    }
}
