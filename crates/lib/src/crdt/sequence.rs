//! Replicated sequence (RGA) backing list and text objects.
//!
//! Elements are kept in document order, tombstones included. A new element is placed directly
//! after the element it references, skipping any elements with a higher id so that concurrent
//! inserts at the same spot end up in the same order on every replica.

use super::{op::OpId, slot::Slot};

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) id: OpId,
    pub(crate) slot: Slot,
}

impl Element {
    pub(crate) fn is_visible(&self) -> bool {
        self.slot.is_visible()
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Sequence {
    elements: Vec<Element>,
}

impl Sequence {
    pub(crate) fn position_of(&self, id: &OpId) -> Option<usize> {
        self.elements.iter().position(|e| &e.id == id)
    }

    pub(crate) fn contains(&self, id: &OpId) -> bool {
        self.position_of(id).is_some()
    }

    /// Insert an element after `after` (or at the head when `None`).
    ///
    /// The reference element must exist; callers validate before applying.
    pub(crate) fn insert(&mut self, after: Option<&OpId>, element: Element) {
        let mut pos = match after {
            None => 0,
            Some(reference) => self.position_of(reference).map_or(0, |p| p + 1),
        };
        while pos < self.elements.len() && self.elements[pos].id > element.id {
            pos += 1;
        }
        self.elements.insert(pos, element);
    }

    pub(crate) fn element_mut(&mut self, id: &OpId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| &e.id == id)
    }

    pub(crate) fn element(&self, id: &OpId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    pub(crate) fn visible(&self) -> impl Iterator<Item = &Element> + '_ {
        self.elements.iter().filter(|e| e.is_visible())
    }

    pub(crate) fn len(&self) -> usize {
        self.visible().count()
    }

    /// The `index`-th visible element.
    pub(crate) fn nth(&self, index: usize) -> Option<&Element> {
        self.visible().nth(index)
    }

    /// Number of visible elements strictly before the element `id`, and whether `id` itself is
    /// visible. `None` when the element is unknown.
    pub(crate) fn visible_index(&self, id: &OpId) -> Option<(usize, bool)> {
        let mut count = 0;
        for e in &self.elements {
            if &e.id == id {
                return Some((count, e.is_visible()));
            }
            if e.is_visible() {
                count += 1;
            }
        }
        None
    }
}
