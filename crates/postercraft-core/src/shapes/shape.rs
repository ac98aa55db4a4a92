//! Vector shape element (rectangle, circle, ellipse, line, triangle, polygon).

use super::{ElementTrait, SerializableColor, default_opacity, default_scale};
use crate::geometry::{default_points, normalize_rotation, scale_points};
use crate::id::ElementId;
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Which outline a shape draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeType {
    Rectangle,
    Circle,
    Ellipse,
    Line,
    Triangle,
    Polygon,
}

impl ShapeType {
    pub const ALL: [ShapeType; 6] = [
        ShapeType::Rectangle,
        ShapeType::Circle,
        ShapeType::Ellipse,
        ShapeType::Line,
        ShapeType::Triangle,
        ShapeType::Polygon,
    ];

    /// Size a freshly created shape of this type gets.
    pub fn default_size(self) -> Size {
        match self {
            ShapeType::Rectangle | ShapeType::Ellipse => Size::new(150.0, 100.0),
            ShapeType::Circle | ShapeType::Triangle | ShapeType::Polygon => Size::new(100.0, 100.0),
            ShapeType::Line => Size::new(150.0, 50.0),
        }
    }

    /// Whether this type is drawn through its `points` list.
    pub fn uses_points(self) -> bool {
        matches!(self, ShapeType::Line | ShapeType::Triangle | ShapeType::Polygon)
    }

    /// Fewest stored points that still describe this type.
    pub fn min_points(self) -> usize {
        match self {
            ShapeType::Line => 2,
            ShapeType::Triangle | ShapeType::Polygon => 3,
            _ => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShapeType::Rectangle => "rectangle",
            ShapeType::Circle => "circle",
            ShapeType::Ellipse => "ellipse",
            ShapeType::Line => "line",
            ShapeType::Triangle => "triangle",
            ShapeType::Polygon => "polygon",
        }
    }
}

/// A filled and/or stroked vector shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub(crate) id: ElementId,
    pub z_index: u32,
    pub shape_type: ShapeType,
    /// Top-left corner position.
    pub position: Point,
    pub size: Size,
    /// Rotation in degrees (around center).
    #[serde(default)]
    pub rotation: f64,
    pub fill_color: SerializableColor,
    pub stroke_color: SerializableColor,
    #[serde(default)]
    pub stroke_width: f64,
    /// Corner radius (rectangles only).
    #[serde(default)]
    pub border_radius: f64,
    /// Vertices/endpoints in the `points_box` frame.
    #[serde(default)]
    pub points: Vec<Point>,
    /// Canonical box the points were authored in.
    #[serde(default)]
    pub points_box: Size,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_scale")]
    pub scale_x: f64,
    #[serde(default = "default_scale")]
    pub scale_y: f64,
}

impl Shape {
    pub fn new(id: ElementId, shape_type: ShapeType, position: Point) -> Self {
        let size = shape_type.default_size();
        let points = if shape_type.uses_points() {
            default_points(shape_type, size)
        } else {
            Vec::new()
        };
        let (fill_color, stroke_color, stroke_width) = match shape_type {
            ShapeType::Line => (
                SerializableColor::transparent(),
                SerializableColor::new(0x33, 0x33, 0x33, 255),
                3.0,
            ),
            _ => (
                SerializableColor::new(0x3b, 0x82, 0xf6, 255),
                SerializableColor::new(0x1e, 0x40, 0xaf, 255),
                2.0,
            ),
        };
        Self {
            id,
            z_index: 0,
            shape_type,
            position,
            size,
            rotation: 0.0,
            fill_color,
            stroke_color,
            stroke_width,
            border_radius: 0.0,
            points,
            points_box: size,
            opacity: 1.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// Points mapped into the current `size`, or generated defaults when the
    /// stored list is too short for the shape type.
    pub fn resolved_points(&self) -> Vec<Point> {
        if !self.shape_type.uses_points() {
            return Vec::new();
        }
        if self.points.len() < self.shape_type.min_points() {
            return default_points(self.shape_type, self.size);
        }
        scale_points(&self.points, self.points_box, self.size)
    }

    /// Replace points, re-basing the canonical box on the current size.
    pub fn set_points(&mut self, points: Vec<Point>) {
        self.points = points;
        self.points_box = self.size;
    }

    /// Corner radius clamped to half the smaller side.
    pub fn effective_border_radius(&self) -> f64 {
        let max = self.size.width.min(self.size.height) / 2.0;
        self.border_radius.clamp(0.0, max.max(0.0))
    }
}

impl ElementTrait for Shape {
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
