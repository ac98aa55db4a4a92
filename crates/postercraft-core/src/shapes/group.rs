//! Group element combining other elements into one unit.

use super::ElementTrait;
use crate::geometry::normalize_rotation;
use crate::id::ElementId;
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// A group of elements that can be manipulated as a single unit.
///
/// Children stay in the document's flat element list; while grouped, their
/// positions are offsets from the group's `position`. Groups can contain other
/// groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub(crate) id: ElementId,
    pub z_index: u32,
    /// Min corner of the children's union bounds.
    pub position: Point,
    pub size: Size,
    #[serde(default)]
    pub rotation: f64,
    pub child_ids: Vec<ElementId>,
}

impl Group {
    pub fn new(id: ElementId, position: Point, size: Size, child_ids: Vec<ElementId>) -> Self {
        Self {
            id,
            z_index: 0,
            position,
            size,
            rotation: 0.0,
            child_ids,
        }
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.child_ids.contains(&id)
    }

    /// Drop `id` from the children. Returns whether it was present.
    pub fn remove_child(&mut self, id: ElementId) -> bool {
        let before = self.child_ids.len();
        self.child_ids.retain(|c| *c != id);
        self.child_ids.len() != before
    }
}

impl ElementTrait for Group {
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
}
