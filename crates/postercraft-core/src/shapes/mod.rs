//! Element definitions for the poster canvas.

mod group;
mod image;
mod shape;
mod text;

pub use group::Group;
pub use image::{Image, ImageFilters};
pub use shape::{Shape, ShapeType};
pub use text::{FontStyle, FontWeight, Text, TextAlign, TextShadow};

use crate::id::ElementId;
use kurbo::{Point, Rect, Size, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().strip_prefix('#')?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let r = channel(&hex[0..1])?;
                let g = channel(&hex[1..2])?;
                let b = channel(&hex[2..3])?;
                Some(Self::new(r * 17, g * 17, b * 17, 255))
            }
            6 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            )),
            8 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        }
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Get the color as a peniko Color with an extra opacity multiplier applied.
    pub fn with_opacity(&self, opacity: f64) -> Color {
        let alpha = (self.a as f64 * opacity.clamp(0.0, 1.0)).round() as u8;
        Color::from_rgba8(self.r, self.g, self.b, alpha)
    }

    /// Linear interpolation in sRGB space, `t` in `[0, 1]`.
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Self::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

impl Default for SerializableColor {
    fn default() -> Self {
        Self::black()
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

pub(crate) fn default_opacity() -> f64 {
    1.0
}

pub(crate) fn default_scale() -> f64 {
    1.0
}

/// Common accessors shared by all element variants.
pub trait ElementTrait {
    /// Get the unique identifier.
    fn id(&self) -> ElementId;

    /// Paint-order rank (lowest painted first).
    fn z_index(&self) -> u32;

    fn set_z_index(&mut self, z_index: u32);

    /// Top-left corner. Relative to the parent group while grouped.
    fn position(&self) -> Point;

    fn set_position(&mut self, position: Point);

    /// Rotation in degrees, clockwise, normalized to `[0, 360)`.
    fn rotation(&self) -> f64;

    /// Set rotation in degrees; the value is normalized.
    fn set_rotation(&mut self, degrees: f64);

    /// Unrotated, unscaled layout size.
    fn size(&self) -> Size;

    /// Horizontal/vertical scale applied about the element's center.
    fn scale(&self) -> Vec2 {
        Vec2::new(1.0, 1.0)
    }

    /// Local bounding box (position + size, ignoring rotation and scale).
    fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position(), self.size())
    }
}

/// Tagged union of every element kind that can live on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Element {
    Text(Text),
    Image(Image),
    Shape(Shape),
    Group(Group),
}

impl Element {
    pub fn id(&self) -> ElementId {
        match self {
            Element::Text(e) => e.id(),
            Element::Image(e) => e.id(),
            Element::Shape(e) => e.id(),
            Element::Group(e) => e.id(),
        }
    }

    pub(crate) fn set_id(&mut self, id: ElementId) {
        match self {
            Element::Text(e) => e.id = id,
            Element::Image(e) => e.id = id,
            Element::Shape(e) => e.id = id,
            Element::Group(e) => e.id = id,
        }
    }

    pub fn z_index(&self) -> u32 {
        match self {
            Element::Text(e) => e.z_index(),
            Element::Image(e) => e.z_index(),
            Element::Shape(e) => e.z_index(),
            Element::Group(e) => e.z_index(),
        }
    }

    pub fn set_z_index(&mut self, z_index: u32) {
        match self {
            Element::Text(e) => e.set_z_index(z_index),
            Element::Image(e) => e.set_z_index(z_index),
            Element::Shape(e) => e.set_z_index(z_index),
            Element::Group(e) => e.set_z_index(z_index),
        }
    }

    pub fn position(&self) -> Point {
        match self {
            Element::Text(e) => e.position(),
            Element::Image(e) => e.position(),
            Element::Shape(e) => e.position(),
            Element::Group(e) => e.position(),
        }
    }

    pub fn set_position(&mut self, position: Point) {
        match self {
            Element::Text(e) => e.set_position(position),
            Element::Image(e) => e.set_position(position),
            Element::Shape(e) => e.set_position(position),
            Element::Group(e) => e.set_position(position),
        }
    }

    pub fn rotation(&self) -> f64 {
        match self {
            Element::Text(e) => e.rotation(),
            Element::Image(e) => e.rotation(),
            Element::Shape(e) => e.rotation(),
            Element::Group(e) => e.rotation(),
        }
    }

    pub fn set_rotation(&mut self, degrees: f64) {
        match self {
            Element::Text(e) => e.set_rotation(degrees),
            Element::Image(e) => e.set_rotation(degrees),
            Element::Shape(e) => e.set_rotation(degrees),
            Element::Group(e) => e.set_rotation(degrees),
        }
    }

    pub fn size(&self) -> Size {
        match self {
            Element::Text(e) => e.size(),
            Element::Image(e) => e.size(),
            Element::Shape(e) => e.size(),
            Element::Group(e) => e.size(),
        }
    }

    pub fn scale(&self) -> Vec2 {
        match self {
            Element::Text(e) => e.scale(),
            Element::Image(e) => e.scale(),
            Element::Shape(e) => e.scale(),
            Element::Group(e) => e.scale(),
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Element::Text(e) => e.bounds(),
            Element::Image(e) => e.bounds(),
            Element::Shape(e) => e.bounds(),
            Element::Group(e) => e.bounds(),
        }
    }

    /// Element opacity (groups are always opaque).
    pub fn opacity(&self) -> f64 {
        match self {
            Element::Text(e) => e.opacity,
            Element::Image(e) => e.opacity,
            Element::Shape(e) => e.opacity,
            Element::Group(_) => 1.0,
        }
    }

    /// Set horizontal/vertical scale. Groups carry no scale and ignore this.
    pub fn set_scale(&mut self, scale_x: f64, scale_y: f64) {
        match self {
            Element::Text(e) => (e.scale_x, e.scale_y) = (scale_x, scale_y),
            Element::Image(e) => (e.scale_x, e.scale_y) = (scale_x, scale_y),
            Element::Shape(e) => (e.scale_x, e.scale_y) = (scale_x, scale_y),
            Element::Group(_) => {}
        }
    }

    /// Human readable variant name (for logs).
    pub fn kind_name(&self) -> &'static str {
        match self {
            Element::Text(_) => "text",
            Element::Image(_) => "image",
            Element::Shape(_) => "shape",
            Element::Group(_) => "group",
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Element::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Element::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Image> {
        match self {
            Element::Image(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_shape(&self) -> Option<&Shape> {
        match self {
            Element::Shape(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_shape_mut(&mut self) -> Option<&mut Shape> {
        match self {
            Element::Shape(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Element::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut Group> {
        match self {
            Element::Group(g) => Some(g),
            _ => None,
        }
    }
}

/// Variant predicates. Total over `Option<&Element>`: absent input is never a match.
pub mod guards {
    use super::Element;

    pub fn is_text(element: Option<&Element>) -> bool {
        matches!(element, Some(Element::Text(_)))
    }

    pub fn is_image(element: Option<&Element>) -> bool {
        matches!(element, Some(Element::Image(_)))
    }

    pub fn is_shape(element: Option<&Element>) -> bool {
        matches!(element, Some(Element::Shape(_)))
    }

    pub fn is_group(element: Option<&Element>) -> bool {
        matches!(element, Some(Element::Group(_)))
    }

    /// Whether the element stores an explicit width *and* height.
    /// Text only has a wrap width; its height follows from content.
    pub fn has_size(element: Option<&Element>) -> bool {
        matches!(
            element,
            Some(Element::Image(_)) | Some(Element::Shape(_)) | Some(Element::Group(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::guards::*;
    use super::*;
    use crate::id::{IdGenerator, SeededIds};

    fn sample_text() -> Element {
        let mut ids = SeededIds::new(1);
        Element::Text(Text::new(ids.next_id(), Point::new(10.0, 20.0), "Hello".into()))
    }

    #[test]
    fn test_hex_round_trip() {
        let c = SerializableColor::from_hex("#ff8800").unwrap();
        assert_eq!(c, SerializableColor::new(255, 136, 0, 255));
        assert_eq!(c.to_hex(), "#ff8800");
        assert_eq!(
            SerializableColor::from_hex("#fff"),
            Some(SerializableColor::white())
        );
        assert_eq!(SerializableColor::from_hex("nope"), None);
        assert_eq!(SerializableColor::from_hex("#12345"), None);
    }

    #[test]
    fn test_peniko_conversion() {
        let c = SerializableColor::new(10, 20, 30, 40);
        let color: Color = c.into();
        assert_eq!(SerializableColor::from(color), c);
    }

    #[test]
    fn test_with_opacity_scales_alpha() {
        let c = SerializableColor::new(10, 20, 30, 200);
        let faded = SerializableColor::from(c.with_opacity(0.5));
        assert_eq!(faded.a, 100);
        assert_eq!(faded.r, 10);
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = SerializableColor::black();
        let b = SerializableColor::white();
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        assert_eq!(a.lerp(&b, 0.5).r, 128);
    }

    #[test]
    fn test_guards() {
        let text = sample_text();
        assert!(is_text(Some(&text)));
        assert!(!is_image(Some(&text)));
        assert!(!is_group(Some(&text)));
        assert!(!has_size(Some(&text)));
        assert!(!is_text(None));
        assert!(!has_size(None));
    }

    #[test]
    fn test_rotation_normalized_on_set() {
        let mut text = sample_text();
        text.set_rotation(-30.0);
        assert!((text.rotation() - 330.0).abs() < 1e-9);
        text.set_rotation(390.0);
        assert!((text.rotation() - 30.0).abs() < 1e-9);
    }
}
