//! Typed partial updates for elements.
//!
//! Each variant has its own patch struct, so a field can only be supplied for
//! elements that actually carry it. Values are clamped into [`crate::limits`].

use crate::limits::{self, clamp};
use crate::shapes::{
    Element, FontStyle, FontWeight, SerializableColor, TextAlign, TextShadow,
};
use kurbo::{Point, Size};

/// Fields every element variant understands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommonPatch {
    pub position: Option<Point>,
    pub rotation: Option<f64>,
    /// Ignored for groups.
    pub opacity: Option<f64>,
    /// Ignored for groups.
    pub scale_x: Option<f64>,
    /// Ignored for groups.
    pub scale_y: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextPatch {
    pub common: CommonPatch,
    pub content: Option<String>,
    pub width: Option<f64>,
    pub font_size: Option<f64>,
    pub font_family: Option<String>,
    pub font_weight: Option<FontWeight>,
    pub font_style: Option<FontStyle>,
    pub text_align: Option<TextAlign>,
    pub color: Option<SerializableColor>,
    /// `Some(None)` removes the shadow.
    pub shadow: Option<Option<TextShadow>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImagePatch {
    pub common: CommonPatch,
    pub size: Option<Size>,
    pub name: Option<String>,
    pub grayscale: Option<f64>,
    pub brightness: Option<f64>,
    pub contrast: Option<f64>,
    pub blur: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapePatch {
    pub common: CommonPatch,
    pub size: Option<Size>,
    pub fill_color: Option<SerializableColor>,
    pub stroke_color: Option<SerializableColor>,
    pub stroke_width: Option<f64>,
    pub border_radius: Option<f64>,
}

/// A partial update addressed to one element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementPatch {
    Common(CommonPatch),
    Text(TextPatch),
    Image(ImagePatch),
    Shape(ShapePatch),
}

impl From<CommonPatch> for ElementPatch {
    fn from(patch: CommonPatch) -> Self {
        ElementPatch::Common(patch)
    }
}

impl From<TextPatch> for ElementPatch {
    fn from(patch: TextPatch) -> Self {
        ElementPatch::Text(patch)
    }
}

impl From<ImagePatch> for ElementPatch {
    fn from(patch: ImagePatch) -> Self {
        ElementPatch::Image(patch)
    }
}

impl From<ShapePatch> for ElementPatch {
    fn from(patch: ShapePatch) -> Self {
        ElementPatch::Shape(patch)
    }
}

impl ElementPatch {
    /// Whether this patch can be applied to `element`.
    pub fn matches(&self, element: &Element) -> bool {
        matches!(
            (self, element),
            (ElementPatch::Common(_), _)
                | (ElementPatch::Text(_), Element::Text(_))
                | (ElementPatch::Image(_), Element::Image(_))
                | (ElementPatch::Shape(_), Element::Shape(_))
        )
    }

    /// Merge into `element`. Returns false (and changes nothing) when the
    /// patch targets a different variant.
    pub fn apply(&self, element: &mut Element) -> bool {
        if !self.matches(element) {
            log::debug!(
                "ignoring {} patch for {} element {}",
                self.kind_name(),
                element.kind_name(),
                element.id()
            );
            return false;
        }
        match self {
            ElementPatch::Common(p) => apply_common(p, element),
            ElementPatch::Text(p) => {
                apply_common(&p.common, element);
                if let Element::Text(text) = element {
                    if let Some(content) = &p.content {
                        text.content = content.clone();
                    }
                    if let Some(width) = p.width {
                        text.width = clamp_text_width(width);
                    }
                    if let Some(size) = p.font_size {
                        text.font_size = clamp(size, limits::FONT_SIZE);
                    }
                    if let Some(family) = &p.font_family {
                        text.font_family = family.clone();
                    }
                    if let Some(weight) = p.font_weight {
                        text.font_weight = weight;
                    }
                    if let Some(style) = p.font_style {
                        text.font_style = style;
                    }
                    if let Some(align) = p.text_align {
                        text.text_align = align;
                    }
                    if let Some(color) = p.color {
                        text.color = color;
                    }
                    if let Some(shadow) = &p.shadow {
                        text.shadow = shadow.clone().map(clamp_shadow);
                    }
                }
            }
            ElementPatch::Image(p) => {
                apply_common(&p.common, element);
                if let Element::Image(image) = element {
                    if let Some(size) = p.size {
                        image.size = clamp_size(size);
                    }
                    if let Some(name) = &p.name {
                        image.name = name.clone();
                    }
                    if let Some(v) = p.grayscale {
                        image.filters.grayscale = clamp(v, limits::GRAYSCALE);
                    }
                    if let Some(v) = p.brightness {
                        image.filters.brightness = clamp(v, limits::BRIGHTNESS);
                    }
                    if let Some(v) = p.contrast {
                        image.filters.contrast = clamp(v, limits::CONTRAST);
                    }
                    if let Some(v) = p.blur {
                        image.filters.blur = clamp(v, limits::BLUR);
                    }
                }
            }
            ElementPatch::Shape(p) => {
                apply_common(&p.common, element);
                if let Element::Shape(shape) = element {
                    if let Some(size) = p.size {
                        shape.size = clamp_size(size);
                    }
                    if let Some(color) = p.fill_color {
                        shape.fill_color = color;
                    }
                    if let Some(color) = p.stroke_color {
                        shape.stroke_color = color;
                    }
                    if let Some(width) = p.stroke_width {
                        shape.stroke_width = clamp(width, limits::STROKE_WIDTH);
                    }
                    if let Some(radius) = p.border_radius {
                        shape.border_radius = clamp_min(radius, 0.0);
                    }
                }
            }
        }
        true
    }

    fn kind_name(&self) -> &'static str {
        match self {
            ElementPatch::Common(_) => "common",
            ElementPatch::Text(_) => "text",
            ElementPatch::Image(_) => "image",
            ElementPatch::Shape(_) => "shape",
        }
    }
}

fn apply_common(patch: &CommonPatch, element: &mut Element) {
    if let Some(position) = patch.position {
        element.set_position(position);
    }
    if let Some(rotation) = patch.rotation {
        element.set_rotation(rotation);
    }
    if patch.scale_x.is_some() || patch.scale_y.is_some() {
        let current = element.scale();
        let sx = patch.scale_x.map_or(current.x, |v| clamp(v, limits::ELEMENT_SCALE));
        let sy = patch.scale_y.map_or(current.y, |v| clamp(v, limits::ELEMENT_SCALE));
        element.set_scale(sx, sy);
    }
    if let Some(opacity) = patch.opacity {
        let opacity = clamp(opacity, limits::OPACITY);
        match element {
            Element::Text(e) => e.opacity = opacity,
            Element::Image(e) => e.opacity = opacity,
            Element::Shape(e) => e.opacity = opacity,
            Element::Group(_) => {}
        }
    }
}

fn clamp_min(value: f64, min: f64) -> f64 {
    if value.is_nan() { min } else { value.max(min) }
}

/// Element sizes never shrink below the minimum edge.
pub(crate) fn clamp_size(size: Size) -> Size {
    Size::new(
        clamp_min(size.width, limits::MIN_ELEMENT_SIZE),
        clamp_min(size.height, limits::MIN_ELEMENT_SIZE),
    )
}

/// Text wrap widths keep room for the side padding.
pub(crate) fn clamp_text_width(width: f64) -> f64 {
    clamp_min(width, limits::MIN_TEXT_WIDTH)
}

fn clamp_shadow(mut shadow: TextShadow) -> TextShadow {
    shadow.blur = clamp(shadow.blur, limits::SHADOW_BLUR);
    shadow.offset_x = clamp(shadow.offset_x, limits::SHADOW_OFFSET);
    shadow.offset_y = clamp(shadow.offset_y, limits::SHADOW_OFFSET);
    shadow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{IdGenerator, SeededIds};
    use crate::shapes::{Shape, ShapeType, Text};

    fn text() -> Element {
        let mut ids = SeededIds::new(2);
        Element::Text(Text::new(ids.next_id(), Point::ZERO, "hi".into()))
    }

    fn rect() -> Element {
        let mut ids = SeededIds::new(3);
        Element::Shape(Shape::new(ids.next_id(), ShapeType::Rectangle, Point::ZERO))
    }

    #[test]
    fn test_text_patch_clamps() {
        let mut element = text();
        let patch = ElementPatch::from(TextPatch {
            font_size: Some(1000.0),
            width: Some(5.0),
            common: CommonPatch {
                opacity: Some(3.0),
                rotation: Some(-90.0),
                ..Default::default()
            },
            ..Default::default()
        });
        assert!(patch.apply(&mut element));
        let t = element.as_text().unwrap();
        assert_eq!(t.font_size, 200.0);
        assert_eq!(t.width, limits::MIN_TEXT_WIDTH);
        assert_eq!(t.opacity, 1.0);
        assert!((t.rotation - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_mismatched_patch_is_ignored() {
        let mut element = rect();
        let before = element.clone();
        let patch = ElementPatch::Text(TextPatch {
            content: Some("nope".into()),
            ..Default::default()
        });
        assert!(!patch.matches(&element));
        assert!(!patch.apply(&mut element));
        assert_eq!(element, before);
    }

    #[test]
    fn test_shape_patch() {
        let mut element = rect();
        let patch = ElementPatch::Shape(ShapePatch {
            stroke_width: Some(80.0),
            size: Some(Size::new(2.0, 300.0)),
            fill_color: Some(SerializableColor::white()),
            ..Default::default()
        });
        assert!(patch.apply(&mut element));
        let s = element.as_shape().unwrap();
        assert_eq!(s.stroke_width, 50.0);
        assert_eq!(s.size, Size::new(limits::MIN_ELEMENT_SIZE, 300.0));
        assert_eq!(s.fill_color, SerializableColor::white());
    }

    #[test]
    fn test_common_patch_scale() {
        let mut element = rect();
        let patch = ElementPatch::Common(CommonPatch {
            scale_x: Some(20.0),
            ..Default::default()
        });
        assert!(patch.apply(&mut element));
        assert_eq!(element.scale().x, 10.0);
        assert_eq!(element.scale().y, 1.0);
    }

    #[test]
    fn test_remove_shadow() {
        let mut element = text();
        ElementPatch::Text(TextPatch {
            shadow: Some(Some(TextShadow {
                blur: 500.0,
                ..TextShadow::default()
            })),
            ..Default::default()
        })
        .apply(&mut element);
        assert_eq!(element.as_text().unwrap().shadow.as_ref().unwrap().blur, 50.0);

        ElementPatch::Text(TextPatch {
            shadow: Some(None),
            ..Default::default()
        })
        .apply(&mut element);
        assert!(element.as_text().unwrap().shadow.is_none());
    }
}
