//! Selection set, clipboard and grouping.

use crate::canvas::Document;
use crate::editor::Editor;
use crate::geometry::{normalize_rotation, union_bounds};
use crate::id::ElementId;
use crate::shapes::{Element, Group};
use kurbo::Point;
use std::collections::HashMap;

/// Ordered set of selected element ids. The first id is the primary selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<ElementId>,
}

impl Selection {
    pub fn ids(&self) -> &[ElementId] {
        &self.ids
    }

    pub fn first(&self) -> Option<ElementId> {
        self.ids.first().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.ids.contains(&id)
    }

    /// Replace the selection with a single id.
    pub fn select(&mut self, id: ElementId) {
        self.ids.clear();
        self.ids.push(id);
    }

    /// Replace the selection, dropping duplicates.
    pub fn set(&mut self, ids: &[ElementId]) {
        self.ids.clear();
        for id in ids {
            if !self.ids.contains(id) {
                self.ids.push(*id);
            }
        }
    }

    /// Add or remove an id (ctrl/cmd-click).
    pub fn toggle(&mut self, id: ElementId) {
        if let Some(pos) = self.ids.iter().position(|e| *e == id) {
            self.ids.remove(pos);
        } else {
            self.ids.push(id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn retain(&mut self, mut keep: impl FnMut(ElementId) -> bool) {
        self.ids.retain(|id| keep(*id));
    }
}

/// A copied element together with its group subtree.
///
/// The root's position is absolute so it can be pasted at top level.
#[derive(Debug, Clone, PartialEq)]
pub struct Clipboard {
    root: Element,
    /// Descendants in paint order, positions relative to their parents.
    descendants: Vec<Element>,
}

impl Clipboard {
    fn capture(doc: &Document, id: ElementId) -> Option<Self> {
        let mut root = doc.get(id)?.clone();
        root.set_position(doc.absolute_position(id)?);
        let subtree = doc.descendants(id);
        let descendants = doc
            .paint_order()
            .into_iter()
            .filter(|e| subtree.contains(&e.id()))
            .cloned()
            .collect();
        Some(Self { root, descendants })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Number of elements a paste inserts.
    pub fn element_count(&self) -> usize {
        1 + self.descendants.len()
    }
}

impl Editor {
    pub fn select(&mut self, id: ElementId) {
        self.selection.select(id);
    }

    pub fn set_selection(&mut self, ids: &[ElementId]) {
        self.selection.set(ids);
    }

    pub fn toggle_selection(&mut self, id: ElementId) {
        self.selection.toggle(id);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Select every top-level element.
    pub fn select_all(&mut self) {
        let ids: Vec<ElementId> = self.document().top_level().iter().map(|e| e.id()).collect();
        self.selection.set(&ids);
    }

    pub fn selected_ids(&self) -> &[ElementId] {
        self.selection.ids()
    }

    /// Single-selection view: the first selected element.
    pub fn selected_element(&self) -> Option<&Element> {
        self.selection.first().and_then(|id| self.document().get(id))
    }

    /// Every selected element that still exists.
    pub fn selected_elements(&self) -> Vec<&Element> {
        let doc = self.document();
        self.selection.ids().iter().filter_map(|id| doc.get(*id)).collect()
    }

    pub fn clipboard(&self) -> Option<&Clipboard> {
        self.clipboard.as_ref()
    }

    /// Copy the first selected element (with its group subtree).
    pub fn copy(&mut self) -> bool {
        let Some(id) = self.selection.first() else {
            return false;
        };
        match Clipboard::capture(self.history.present(), id) {
            Some(clip) => {
                log::debug!("copied {} element(s)", clip.element_count());
                self.clipboard = Some(clip);
                true
            }
            None => false,
        }
    }

    /// Paste the clipboard with fresh ids, offset and clamped to the canvas.
    /// The pasted element becomes the selection.
    pub fn paste(&mut self) -> Option<ElementId> {
        let clip = self.clipboard.clone()?;
        let doc = self.document();
        let offset = self.config.paste_offset;
        let margin = self.config.paste_margin;
        let origin = clip.root.position();
        let position = Point::new(
            (origin.x + offset).min(doc.canvas_width() - margin).max(0.0),
            (origin.y + offset).min(doc.canvas_height() - margin).max(0.0),
        );

        let mut remap: HashMap<ElementId, ElementId> = HashMap::new();
        remap.insert(clip.root.id(), self.next_id());
        for element in &clip.descendants {
            remap.insert(element.id(), self.next_id());
        }

        let mut pasted = Vec::with_capacity(clip.element_count());
        for mut element in clip.descendants.into_iter().chain(std::iter::once(clip.root)) {
            if let Some(new_id) = remap.get(&element.id()) {
                element.set_id(*new_id);
            }
            if let Element::Group(group) = &mut element {
                for child in &mut group.child_ids {
                    if let Some(new_id) = remap.get(child) {
                        *child = *new_id;
                    }
                }
            }
            pasted.push(element);
        }
        if let Some(root) = pasted.last_mut() {
            root.set_position(position);
        }
        let root_id = pasted.last().map(|e| e.id())?;

        self.history.push_edit(|doc| {
            // Children first, root last: the root gets the highest rank.
            for mut element in pasted {
                element.set_z_index(doc.next_z_index());
                doc.push(element);
            }
        });
        self.selection.select(root_id);
        log::debug!("pasted element {root_id}");
        Some(root_id)
    }

    /// Copy then paste the primary selection.
    pub fn duplicate(&mut self) -> Option<ElementId> {
        if self.copy() { self.paste() } else { None }
    }

    /// Group the selected top-level elements (at least two).
    ///
    /// Children positions become offsets from the union bounds' min corner and
    /// the group is ranked directly above its highest child.
    pub fn group_selected(&mut self) -> Option<ElementId> {
        let doc = self.document();
        let grouped = doc.grouped_ids();
        let members: Vec<ElementId> = doc
            .ids_in_paint_order()
            .into_iter()
            .filter(|id| self.selection.contains(*id) && !grouped.contains(id))
            .collect();
        if members.len() < 2 {
            log::debug!("grouping needs at least two top-level elements");
            return None;
        }
        let bounds =
            union_bounds(members.iter().filter_map(|id| doc.get(*id)).map(|e| e.bounds()))?;
        let mut order = doc.ids_in_paint_order();
        let top = members.last().copied()?;

        let group_id = self.next_id();
        let group = Group::new(group_id, bounds.origin(), bounds.size(), members.clone());
        let insert_at = order.iter().position(|id| *id == top).map_or(order.len(), |i| i + 1);
        order.insert(insert_at, group_id);

        self.history.push_edit(|doc| {
            let min = bounds.origin().to_vec2();
            for id in &members {
                if let Some(element) = doc.get_mut(*id) {
                    let relative = element.position() - min;
                    element.set_position(relative);
                }
            }
            doc.push(Element::Group(group));
            doc.renumber(&order);
        });
        self.selection.select(group_id);
        log::debug!("grouped {} elements into {group_id}", members.len());
        Some(group_id)
    }

    /// Dissolve the single selected group, restoring absolute child positions
    /// and composing rotations. Children of a nested group move up to its parent.
    pub fn ungroup_selected(&mut self) -> Option<Vec<ElementId>> {
        if self.selection.len() != 1 {
            log::debug!("ungroup needs exactly one selected group");
            return None;
        }
        let id = self.selection.first()?;
        let doc = self.document();
        let Some(group) = doc.get(id).and_then(|e| e.as_group()).cloned() else {
            log::debug!("ungroup target {id} is not a group");
            return None;
        };
        let parent = doc.parent_of(id);
        let children: Vec<ElementId> =
            group.child_ids.iter().copied().filter(|c| doc.contains(*c)).collect();
        let mut order = doc.ids_in_paint_order();
        order.retain(|e| *e != id);

        self.history.push_edit(|doc| {
            for child in &children {
                if let Some(element) = doc.get_mut(*child) {
                    let absolute = element.position() + group.position.to_vec2();
                    let rotation = normalize_rotation(element.rotation() + group.rotation);
                    element.set_position(absolute);
                    element.set_rotation(rotation);
                }
            }
            if let Some(parent_id) = parent {
                if let Some(Element::Group(parent)) = doc.get_mut(parent_id) {
                    parent.child_ids.retain(|c| *c != id);
                    parent.child_ids.extend(children.iter().copied());
                }
            }
            let removed = std::collections::HashSet::from([id]);
            doc.remove_all(&removed);
            doc.renumber(&order);
        });
        self.selection.set(&children);
        log::debug!("ungrouped {id} into {} elements", children.len());
        Some(children)
    }
}
