//! Geometry helpers shared by editing, snapping and rendering.

use crate::shapes::ShapeType;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use std::f64::consts::PI;

/// Normalize degrees into `[0, 360)`. NaN becomes 0.
pub fn normalize_rotation(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let r = ((degrees % 360.0) + 360.0) % 360.0;
    // -1e-20 % 360 + 360 rounds up to exactly 360
    if r >= 360.0 { 0.0 } else { r }
}

/// Transform that rotates (clockwise, degrees) and scales a box about its own
/// center, with `origin` as the box's absolute top-left corner.
///
/// Composition: translate to center, rotate, scale, translate back.
pub fn element_affine(origin: Point, size: Size, rotation: f64, scale: Vec2) -> Affine {
    let center = origin.to_vec2() + Vec2::new(size.width / 2.0, size.height / 2.0);
    Affine::translate(center)
        * Affine::rotate(rotation.to_radians())
        * Affine::scale_non_uniform(scale.x, scale.y)
        * Affine::translate(-center)
}

/// Smallest rectangle covering every input rectangle.
pub fn union_bounds<I>(rects: I) -> Option<Rect>
where
    I: IntoIterator<Item = Rect>,
{
    rects.into_iter().reduce(|acc, r| acc.union(r))
}

/// Axis-aligned bounds of `rect` after applying `affine`.
pub fn transformed_bounds(affine: Affine, rect: Rect) -> Rect {
    affine.transform_rect_bbox(rect)
}

/// Remap points from the `from` box into the `to` box proportionally.
/// A degenerate axis in `from` leaves that coordinate untouched.
pub fn scale_points(points: &[Point], from: Size, to: Size) -> Vec<Point> {
    let sx = if from.width > 0.0 { to.width / from.width } else { 1.0 };
    let sy = if from.height > 0.0 { to.height / from.height } else { 1.0 };
    points
        .iter()
        .map(|p| Point::new(p.x * sx, p.y * sy))
        .collect()
}

/// Generated outline for point-based shapes lacking usable stored points.
pub fn default_points(shape_type: ShapeType, size: Size) -> Vec<Point> {
    let (w, h) = (size.width, size.height);
    match shape_type {
        ShapeType::Line => vec![Point::new(0.0, h / 2.0), Point::new(w, h / 2.0)],
        ShapeType::Triangle => vec![Point::new(w / 2.0, 0.0), Point::new(w, h), Point::new(0.0, h)],
        ShapeType::Polygon => regular_polygon(5, size),
        ShapeType::Rectangle | ShapeType::Circle | ShapeType::Ellipse => Vec::new(),
    }
}

/// Regular polygon inscribed in `size`, first vertex at the top.
pub fn regular_polygon(sides: usize, size: Size) -> Vec<Point> {
    let (rx, ry) = (size.width / 2.0, size.height / 2.0);
    (0..sides)
        .map(|i| {
            let angle = -PI / 2.0 + 2.0 * PI * i as f64 / sides as f64;
            Point::new(rx + rx * angle.cos(), ry + ry * angle.sin())
        })
        .collect()
}

/// Midpoint of the edge closing the polygon (last vertex back to first).
pub fn closing_edge_midpoint(points: &[Point]) -> Option<Point> {
    let first = points.first()?;
    let last = points.last()?;
    Some(first.midpoint(*last))
}
