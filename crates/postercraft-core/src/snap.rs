//! Snap functionality for aligning elements to the grid and canvas center.

use crate::canvas::{Document, GridSettings};
use crate::id::ElementId;
use kurbo::{Affine, Point, Vec2};

/// Result of a snap operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    /// The snapped point.
    pub point: Point,
    /// Whether the X coordinate was snapped.
    pub snapped_x: bool,
    /// Whether the Y coordinate was snapped.
    pub snapped_y: bool,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            snapped_x: false,
            snapped_y: false,
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

/// Snap a point to the nearest grid intersection when the grid is enabled.
pub fn snap_to_grid(point: Point, grid: &GridSettings) -> SnapResult {
    if !grid.enabled || grid.size <= 0.0 {
        return SnapResult::none(point);
    }
    let size = grid.size;
    SnapResult {
        point: Point::new((point.x / size).round() * size, (point.y / size).round() * size),
        snapped_x: true,
        snapped_y: true,
    }
}

/// Canvas-center alignment for one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterSnap {
    /// Element `position` value that puts it on the active guides.
    pub snap: SnapResult,
    /// Rendered center of the element before snapping, in canvas space.
    pub center: Point,
    /// Show the vertical guide (x = canvas center).
    pub vertical_guide: bool,
    /// Show the horizontal guide (y = canvas center).
    pub horizontal_guide: bool,
}

/// Check the element's rendered center against the canvas center lines.
///
/// The center is computed with the same transform the renderer uses, so
/// rotation, scale and enclosing groups are all accounted for.
pub fn canvas_center_snap(doc: &Document, id: ElementId, threshold: f64) -> Option<CenterSnap> {
    let element = doc.get(id)?;
    let origin = doc.absolute_position(id)?;
    let size = element.size();
    let affine = doc.absolute_affine(id)?;
    let center = affine * (origin + Vec2::new(size.width / 2.0, size.height / 2.0));

    let target = Point::new(doc.canvas_width() / 2.0, doc.canvas_height() / 2.0);
    let dx = target.x - center.x;
    let dy = target.y - center.y;
    let vertical_guide = dx.abs() <= threshold;
    let horizontal_guide = dy.abs() <= threshold;

    let world = Vec2::new(
        if vertical_guide { dx } else { 0.0 },
        if horizontal_guide { dy } else { 0.0 },
    );
    // Grouped elements move in their parent's rotated/scaled frame.
    let local = match doc.parent_of(id).and_then(|p| doc.absolute_affine(p)) {
        Some(parent) => {
            let [a, b, c, d, _, _] = parent.as_coeffs();
            let linear = Affine::new([a, b, c, d, 0.0, 0.0]);
            if linear.determinant().abs() < f64::EPSILON {
                world
            } else {
                (linear.inverse() * world.to_point()).to_vec2()
            }
        }
        None => world,
    };

    Some(CenterSnap {
        snap: SnapResult {
            point: element.position() + local,
            snapped_x: vertical_guide,
            snapped_y: horizontal_guide,
        },
        center,
        vertical_guide,
        horizontal_guide,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::editor::Editor;
    use crate::id::SeededIds;
    use crate::patch::{CommonPatch, ShapePatch};
    use crate::shapes::ShapeType;
    use kurbo::Size;

    #[test]
    fn test_snap_to_grid() {
        let grid = GridSettings {
            enabled: true,
            size: 20.0,
        };
        let result = snap_to_grid(Point::new(23.0, 47.0), &grid);
        assert_eq!(result.point, Point::new(20.0, 40.0));
        assert!(result.is_snapped());
        let result = snap_to_grid(Point::new(31.0, 51.0), &grid);
        assert_eq!(result.point, Point::new(40.0, 60.0));
    }

    #[test]
    fn test_disabled_grid_does_not_snap() {
        let result = snap_to_grid(Point::new(23.0, 47.0), &GridSettings::default());
        assert_eq!(result, SnapResult::none(Point::new(23.0, 47.0)));
    }

    fn editor_with_rect(position: Point) -> (Editor, ElementId) {
        let mut ed = Editor::with_ids(EditorConfig::default(), Box::new(SeededIds::new(4)));
        let id = ed.add_shape(ShapeType::Rectangle);
        ed.update_element(
            id,
            ShapePatch {
                size: Some(Size::new(100.0, 100.0)),
                common: CommonPatch {
                    position: Some(position),
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        (ed, id)
    }

    #[test]
    fn test_center_snap_within_threshold() {
        // Canvas 800x600: center (400, 300). Rect center at (403, 200).
        let (ed, id) = editor_with_rect(Point::new(353.0, 150.0));
        let snap = canvas_center_snap(ed.document(), id, 5.0).unwrap();
        assert!(snap.vertical_guide);
        assert!(!snap.horizontal_guide);
        assert_eq!(snap.snap.point, Point::new(350.0, 150.0));
    }

    #[test]
    fn test_center_snap_ignores_rotation_of_centered_element() {
        let (mut ed, id) = editor_with_rect(Point::new(350.0, 250.0));
        ed.update_element(
            id,
            CommonPatch {
                rotation: Some(45.0),
                scale_x: Some(2.0),
                ..Default::default()
            },
        );
        let snap = canvas_center_snap(ed.document(), id, 1.0).unwrap();
        assert!((snap.center.x - 400.0).abs() < 1e-9);
        assert!((snap.center.y - 300.0).abs() < 1e-9);
        assert!(snap.vertical_guide && snap.horizontal_guide);
    }

    /// 10px per character.
    struct Monospace;

    impl crate::layout::TextMeasurer for Monospace {
        fn measure(&self, text: &str, _: &crate::layout::FontSpec<'_>) -> f64 {
            text.chars().count() as f64 * 10.0
        }
    }

    #[test]
    fn test_center_snap_uses_wrapped_text_height() {
        let mut ed = Editor::with_ids(EditorConfig::default(), Box::new(SeededIds::new(4)))
            .with_text_measurer(std::sync::Arc::new(Monospace));
        let id = ed.add_text("AAAA BBBB CCCC");
        ed.update_text_width(id, 100.0);
        // Three wrapped lines at 32px * 1.2 plus 16px padding.
        let height = 3.0 * 38.4 + 16.0;
        ed.update_element(
            id,
            crate::patch::TextPatch {
                common: CommonPatch {
                    position: Some(Point::new(350.0, 300.0 - height / 2.0)),
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        let snap = canvas_center_snap(ed.document(), id, 1.0).unwrap();
        assert!((snap.center.y - 300.0).abs() < 1e-9);
        assert!(snap.horizontal_guide);
    }
}
