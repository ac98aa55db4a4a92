//! Element operations: create, update, delete, reorder, move.

use crate::editor::Editor;
use crate::geometry::closing_edge_midpoint;
use crate::id::ElementId;
use crate::limits::{self, clamp};
use crate::patch::ElementPatch;
use crate::shapes::{Element, Image, Shape, ShapeType, Text};
use kurbo::{Point, Size, Vec2};
use std::collections::HashSet;

/// A decoded user image ready to be placed.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    /// `data:` URI with the encoded image.
    pub data_uri: String,
    pub name: String,
    pub natural_width: f64,
    pub natural_height: f64,
}

/// Where a layer moves in paint order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerMove {
    ToFront,
    ToBack,
    Up,
    Down,
}

impl Editor {
    pub fn add_text(&mut self, content: impl Into<String>) -> ElementId {
        let id = self.next_id();
        let mut text = Text::new(id, Point::ZERO, content.into());
        text.relayout(&*self.measurer);
        text.position = self.placement_for(Size::new(text.width, text.height()));
        self.insert_new(Element::Text(text))
    }

    /// Place an image, downscaling it so neither side exceeds the configured cap.
    pub fn add_image(&mut self, input: ImageInput) -> ElementId {
        let natural = Size::new(input.natural_width, input.natural_height);
        let size = Image::fit_within(natural, self.config.image_max_dimension);
        let position = self.placement_for(size);
        let id = self.next_id();
        let image = Image::new(id, position, size, input.data_uri, input.name);
        self.insert_new(Element::Image(image))
    }

    pub fn add_shape(&mut self, shape_type: ShapeType) -> ElementId {
        let id = self.next_id();
        let mut shape = Shape::new(id, shape_type, Point::ZERO);
        shape.position = self.placement_for(shape.size);
        self.insert_new(Element::Shape(shape))
    }

    fn insert_new(&mut self, mut element: Element) -> ElementId {
        let id = element.id();
        log::debug!("adding {} element {id}", element.kind_name());
        self.history.push_edit(|doc| {
            element.set_z_index(doc.next_z_index());
            doc.push(element);
        });
        id
    }

    /// Pseudo-random top-left keeping `size` inside the canvas (soft heuristic).
    fn placement_for(&mut self, size: Size) -> Point {
        let doc = self.history.present();
        let margin = self.config.placement_margin;
        let span_x = (doc.canvas_width() - size.width - 2.0 * margin).max(0.0);
        let span_y = (doc.canvas_height() - size.height - 2.0 * margin).max(0.0);
        let x = margin + self.placement.next_f64() * span_x;
        let y = margin + self.placement.next_f64() * span_y;
        Point::new(x.round(), y.round())
    }

    /// Merge a typed patch into an element as one undo step.
    ///
    /// Returns false when the element is missing or the patch targets a
    /// different variant; nothing is recorded in that case.
    pub fn update_element(&mut self, id: ElementId, patch: impl Into<ElementPatch>) -> bool {
        let patch = patch.into();
        let Some(element) = self.document().get(id) else {
            log::debug!("update_element: no element {id}");
            return false;
        };
        let mut updated = element.clone();
        if !patch.apply(&mut updated) || &updated == element {
            return false;
        }
        if let Some(text) = updated.as_text_mut() {
            text.relayout(&*self.measurer);
        }
        self.history.push_edit(|doc| {
            if let Some(slot) = doc.get_mut(id) {
                *slot = updated;
            }
        });
        true
    }

    pub fn delete_element(&mut self, id: ElementId) -> bool {
        self.delete_selected(&[id])
    }

    /// Delete elements as one undo step.
    ///
    /// Groups take their descendants with them, deleted ids are pruned from
    /// every remaining group, and groups left without children are removed.
    pub fn delete_selected(&mut self, ids: &[ElementId]) -> bool {
        let doc = self.document();
        let mut doomed: HashSet<ElementId> =
            ids.iter().copied().filter(|id| doc.contains(*id)).collect();
        if doomed.is_empty() {
            return false;
        }
        for id in doomed.clone() {
            doomed.extend(doc.descendants(id));
        }

        let removed = self.history.push_edit(|doc| {
            let mut removed = doc.remove_all(&doomed);
            loop {
                let mut emptied = HashSet::new();
                for element in doc.elements.iter_mut() {
                    let touches = element
                        .as_group()
                        .is_some_and(|g| g.child_ids.iter().any(|c| doomed.contains(c)));
                    if !touches {
                        continue;
                    }
                    if let Some(group) = std::sync::Arc::make_mut(element).as_group_mut() {
                        group.child_ids.retain(|c| !doomed.contains(c));
                        if group.child_ids.is_empty() {
                            emptied.insert(group.id);
                        }
                    }
                }
                if emptied.is_empty() {
                    break;
                }
                log::debug!("removing {} emptied group(s)", emptied.len());
                removed += doc.remove_all(&emptied);
                doomed.extend(emptied);
            }
            let order = doc.ids_in_paint_order();
            doc.renumber(&order);
            removed
        });
        log::debug!("deleted {removed} element(s)");
        self.prune_selection();
        true
    }

    pub fn bring_to_front(&mut self, id: ElementId) -> bool {
        self.reorder(id, LayerMove::ToFront)
    }

    pub fn send_to_back(&mut self, id: ElementId) -> bool {
        self.reorder(id, LayerMove::ToBack)
    }

    pub fn move_layer_up(&mut self, id: ElementId) -> bool {
        self.reorder(id, LayerMove::Up)
    }

    pub fn move_layer_down(&mut self, id: ElementId) -> bool {
        self.reorder(id, LayerMove::Down)
    }

    /// Move an element in paint order and renumber every z-index to 1..=N.
    pub fn reorder(&mut self, id: ElementId, movement: LayerMove) -> bool {
        let doc = self.document();
        let mut order = doc.ids_in_paint_order();
        let Some(from) = order.iter().position(|e| *e == id) else {
            return false;
        };
        let last = order.len() - 1;
        let to = match movement {
            LayerMove::ToFront => last,
            LayerMove::ToBack => 0,
            LayerMove::Up => (from + 1).min(last),
            LayerMove::Down => from.saturating_sub(1),
        };
        let dense = doc
            .paint_order()
            .iter()
            .enumerate()
            .all(|(i, e)| e.z_index() == i as u32 + 1);
        if to == from && dense {
            return false;
        }
        let moved = order.remove(from);
        order.insert(to, moved);
        self.history.push_edit(|doc| doc.renumber(&order));
        true
    }

    /// Keyboard nudge of a single element.
    pub fn move_element(&mut self, id: ElementId, dx: f64, dy: f64) -> bool {
        self.move_elements(&[id], Vec2::new(dx, dy))
    }

    /// Nudge every selected element as one undo step.
    pub fn move_selected(&mut self, dx: f64, dy: f64) -> bool {
        let ids = self.selection.ids().to_vec();
        self.move_elements(&ids, Vec2::new(dx, dy))
    }

    fn move_elements(&mut self, ids: &[ElementId], delta: Vec2) -> bool {
        let doc = self.document();
        let targets: Vec<ElementId> = ids.iter().copied().filter(|id| doc.contains(*id)).collect();
        if targets.is_empty() || delta == Vec2::ZERO {
            return false;
        }
        self.history.push_edit(|doc| {
            for id in &targets {
                if let Some(element) = doc.get_mut(*id) {
                    let position = element.position() + delta;
                    element.set_position(position);
                }
            }
        });
        true
    }

    /// Multiply the scale of every selected element (groups carry no scale).
    ///
    /// Elements already pinned at the scale limit are left alone; when none
    /// would change, nothing is recorded.
    pub fn scale_selected(&mut self, factor: f64) -> bool {
        let doc = self.document();
        let updates: Vec<(ElementId, Vec2)> = self
            .selection
            .ids()
            .iter()
            .filter_map(|id| {
                let element = doc.get(*id).filter(|e| !matches!(e, Element::Group(_)))?;
                let scale = element.scale();
                let next = Vec2::new(
                    clamp(scale.x * factor, limits::ELEMENT_SCALE),
                    clamp(scale.y * factor, limits::ELEMENT_SCALE),
                );
                (next != scale).then_some((*id, next))
            })
            .collect();
        if updates.is_empty() {
            return false;
        }
        self.history.push_edit(|doc| {
            for (id, scale) in &updates {
                if let Some(element) = doc.get_mut(*id) {
                    element.set_scale(scale.x, scale.y);
                }
            }
        });
        true
    }

    /// Remove every element; canvas settings are kept.
    pub fn clear_canvas(&mut self) -> bool {
        if self.document().is_empty() {
            return false;
        }
        self.history.push_edit(|doc| doc.elements.clear());
        self.selection.clear();
        true
    }

    /// Replace a point-based shape's points. The canonical box becomes the
    /// shape's current size.
    pub fn set_shape_points(&mut self, id: ElementId, points: Vec<Point>) -> bool {
        let Some(shape) = self.document().get(id).and_then(|e| e.as_shape()) else {
            return false;
        };
        if !shape.shape_type.uses_points() || points.len() < shape.shape_type.min_points() {
            log::debug!("rejecting {} points for {}", points.len(), shape.shape_type.name());
            return false;
        }
        self.edit_shape(id, |shape| shape.set_points(points))
    }

    /// Insert a vertex at the midpoint of the polygon's closing edge.
    pub fn add_polygon_point(&mut self, id: ElementId) -> bool {
        let Some(shape) = self.polygon(id) else {
            return false;
        };
        let mut points = shape.resolved_points();
        let Some(mid) = closing_edge_midpoint(&points) else {
            return false;
        };
        points.push(mid);
        self.edit_shape(id, |shape| shape.set_points(points))
    }

    /// Remove the last vertex. Refused at three points or fewer.
    pub fn remove_polygon_point(&mut self, id: ElementId) -> bool {
        let Some(shape) = self.polygon(id) else {
            return false;
        };
        let mut points = shape.resolved_points();
        if points.len() <= 3 {
            return false;
        }
        points.pop();
        self.edit_shape(id, |shape| shape.set_points(points))
    }

    fn polygon(&self, id: ElementId) -> Option<&Shape> {
        self.document()
            .get(id)
            .and_then(|e| e.as_shape())
            .filter(|s| s.shape_type == ShapeType::Polygon)
    }

    /// Apply `edit` to a copy of the shape and record it only if it differs.
    fn edit_shape(&mut self, id: ElementId, edit: impl FnOnce(&mut Shape)) -> bool {
        let Some(shape) = self.document().get(id).and_then(|e| e.as_shape()) else {
            return false;
        };
        let mut updated = shape.clone();
        edit(&mut updated);
        if &updated == shape {
            return false;
        }
        self.history.push_edit(|doc| {
            if let Some(slot) = doc.get_mut(id).and_then(|e| e.as_shape_mut()) {
                *slot = updated;
            }
        });
        true
    }
}
