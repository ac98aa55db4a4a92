//! Image element for embedded raster images.

use super::{ElementTrait, default_opacity, default_scale};
use crate::geometry::normalize_rotation;
use crate::id::ElementId;
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// CSS-filter style adjustments applied when the image is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFilters {
    /// Percent, 0 = untouched, 100 = fully gray.
    pub grayscale: f64,
    /// Percent, 100 = untouched.
    pub brightness: f64,
    /// Percent, 100 = untouched.
    pub contrast: f64,
    /// Blur radius in canvas pixels.
    pub blur: f64,
}

impl ImageFilters {
    /// Whether drawing with these filters changes any pixel.
    pub fn is_identity(&self) -> bool {
        self.grayscale <= 0.0
            && (self.brightness - 100.0).abs() < f64::EPSILON
            && (self.contrast - 100.0).abs() < f64::EPSILON
            && self.blur <= 0.0
    }
}

impl Default for ImageFilters {
    fn default() -> Self {
        Self {
            grayscale: 0.0,
            brightness: 100.0,
            contrast: 100.0,
            blur: 0.0,
        }
    }
}

/// An image placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub(crate) id: ElementId,
    pub z_index: u32,
    /// Top-left corner position.
    pub position: Point,
    /// Display size.
    pub size: Size,
    /// Rotation in degrees (around center).
    #[serde(default)]
    pub rotation: f64,
    /// Image data as a `data:` URI.
    pub src: String,
    /// Display name (usually the original file name).
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub filters: ImageFilters,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_scale")]
    pub scale_x: f64,
    #[serde(default = "default_scale")]
    pub scale_y: f64,
}

impl Image {
    pub fn new(id: ElementId, position: Point, size: Size, src: String, name: String) -> Self {
        Self {
            id,
            z_index: 0,
            position,
            size,
            rotation: 0.0,
            src,
            name,
            filters: ImageFilters::default(),
            opacity: 1.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// Scale a natural size down so neither side exceeds `max`, preserving aspect ratio.
    /// Sizes already within the cap are returned unchanged.
    pub fn fit_within(natural: Size, max: f64) -> Size {
        if natural.width <= 0.0 || natural.height <= 0.0 {
            return Size::new(max, max);
        }
        if natural.width <= max && natural.height <= max {
            return natural;
        }
        if natural.width >= natural.height {
            Size::new(max, natural.height * max / natural.width)
        } else {
            Size::new(natural.width * max / natural.height, max)
        }
    }
}

impl ElementTrait for Image {
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
        self.size
    }

    fn scale(&self) -> Vec2 {
        Vec2::new(self.scale_x, self.scale_y)
    }
}
