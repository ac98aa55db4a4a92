//! Text element.

use super::{ElementTrait, SerializableColor, default_opacity, default_scale};
use crate::geometry::normalize_rotation;
use crate::id::ElementId;
use crate::layout::{FallbackMetrics, TextLayout, TextMeasurer, layout_text};
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Font weight options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Font style options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// Horizontal alignment of each laid-out line within the wrap width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Drop shadow drawn beneath text glyphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextShadow {
    pub enabled: bool,
    pub color: SerializableColor,
    /// Blur radius in canvas pixels.
    pub blur: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for TextShadow {
    fn default() -> Self {
        Self {
            enabled: true,
            color: SerializableColor::new(0, 0, 0, 128),
            blur: 4.0,
            offset_x: 2.0,
            offset_y: 2.0,
        }
    }
}

/// Laid-out height cached on a [`Text`].
///
/// Derived from the other fields, so it is neither persisted nor compared.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeasuredHeight(Option<f64>);

impl PartialEq for MeasuredHeight {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

/// A block of wrapped text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub(crate) id: ElementId,
    pub z_index: u32,
    /// Top-left corner of the text box.
    pub position: Point,
    /// Rotation in degrees (around center).
    #[serde(default)]
    pub rotation: f64,
    /// Wrap width. Height is derived from the wrapped content.
    pub width: f64,
    /// Text content; may contain explicit `\n` breaks.
    pub content: String,
    /// Font size in pixels.
    pub font_size: f64,
    pub font_family: String,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub font_style: FontStyle,
    #[serde(default)]
    pub text_align: TextAlign,
    pub color: SerializableColor,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_scale")]
    pub scale_x: f64,
    #[serde(default = "default_scale")]
    pub scale_y: f64,
    #[serde(default)]
    pub shadow: Option<TextShadow>,
    #[serde(skip)]
    measured: MeasuredHeight,
}

impl Text {
    pub const DEFAULT_FONT_SIZE: f64 = 32.0;
    pub const DEFAULT_WIDTH: f64 = 300.0;
    pub const DEFAULT_FONT_FAMILY: &'static str = "Inter";
    /// Line advance as a multiple of the font size.
    pub const LINE_HEIGHT_FACTOR: f64 = 1.2;
    /// Horizontal padding on each side of the text box.
    pub const PADDING_X: f64 = 12.0;
    /// Padding above the first line.
    pub const PADDING_Y: f64 = 8.0;

    pub fn new(id: ElementId, position: Point, content: String) -> Self {
        Self {
            id,
            z_index: 0,
            position,
            rotation: 0.0,
            width: Self::DEFAULT_WIDTH,
            content,
            font_size: Self::DEFAULT_FONT_SIZE,
            font_family: Self::DEFAULT_FONT_FAMILY.to_string(),
            font_weight: FontWeight::default(),
            font_style: FontStyle::default(),
            text_align: TextAlign::default(),
            color: SerializableColor::black(),
            opacity: 1.0,
            scale_x: 1.0,
            scale_y: 1.0,
            shadow: None,
            measured: MeasuredHeight::default(),
        }
    }

    pub fn line_height(&self) -> f64 {
        self.font_size * Self::LINE_HEIGHT_FACTOR
    }

    /// Width available to glyphs once side padding is removed.
    pub fn wrap_width(&self) -> f64 {
        (self.width - 2.0 * Self::PADDING_X).max(0.0)
    }

    pub fn layout(&self, measurer: &dyn TextMeasurer) -> TextLayout {
        layout_text(self, measurer)
    }

    /// Height of the wrapped block as last laid out by [`Text::relayout`],
    /// or with fallback metrics if it never was.
    pub fn height(&self) -> f64 {
        self.measured
            .0
            .unwrap_or_else(|| self.layout(&FallbackMetrics).height())
    }

    /// Re-wrap with `measurer` and cache the resulting height. Returns
    /// whether the height changed.
    pub fn relayout(&mut self, measurer: &dyn TextMeasurer) -> bool {
        let height = self.layout(measurer).height();
        let changed = self.measured.0 != Some(height);
        self.measured = MeasuredHeight(Some(height));
        changed
    }

    pub(crate) fn set_measured_height(&mut self, height: f64) {
        self.measured = MeasuredHeight(Some(height));
    }

    /// Whether a visible shadow should be drawn.
    pub fn active_shadow(&self) -> Option<&TextShadow> {
        self.shadow.as_ref().filter(|s| s.enabled)
    }
}

impl ElementTrait for Text {
    fn id(&self) -> ElementId {
        self.id
    }

    fn z_index(&self) -> u32 {
        self.z_index
    }

    fn set_z_index(&mut self, z_index: u32) {
        self.z_index = z_index;
    }

    fn position(&self) -> Point {
        self.position
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    fn rotation(&self) -> f64 {
        self.rotation
    }

    fn set_rotation(&mut self, degrees: f64) {
        self.rotation = normalize_rotation(degrees);
    }

    fn size(&self) -> Size {
        Size::new(self.width, self.height())
    }

    fn scale(&self) -> Vec2 {
        Vec2::new(self.scale_x, self.scale_y)
    }
}
