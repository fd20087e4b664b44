// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Elements and the arena that links them into a tree.

use core::fmt;

use smallvec::SmallVec;
use trellis_dirty::SlotKey;
use trellis_handle::{GenerationCheck, Handle, HandleManager, RawHandle};
use trellis_style::{AttributeSet, ElementStates, StyleStack};

use crate::layout::LayoutState;
use crate::render::ImageHandle;

/// Handle to an element of a [`Document`](crate::Document).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(RawHandle);

impl Handle for ElementId {
    #[inline]
    fn from_raw(raw: RawHandle) -> Self {
        Self(raw)
    }

    #[inline]
    fn to_raw(self) -> RawHandle {
        self.0
    }
}

impl SlotKey for ElementId {
    #[inline]
    fn slot(self) -> u32 {
        self.0.index()
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({}v{})", self.0.index(), self.0.generation())
    }
}

/// One node of the element tree.
#[derive(Debug)]
pub struct Element {
    pub(crate) id: Option<String>,
    pub(crate) parent: Option<ElementId>,
    pub(crate) first_child: Option<ElementId>,
    pub(crate) last_child: Option<ElementId>,
    pub(crate) prev_sibling: Option<ElementId>,
    pub(crate) next_sibling: Option<ElementId>,
    pub(crate) style: StyleStack,
    pub(crate) layout: LayoutState,
    pub(crate) text: Option<String>,
    pub(crate) states: ElementStates,
    /// Attributes to re-resolve at the next cascade.
    pub(crate) pending: AttributeSet,
    /// The expanded class list must be rebuilt at the next cascade.
    pub(crate) reexpand: bool,
    /// Stacking bucket this element is registered in.
    pub(crate) z_index: Option<i32>,
    pub(crate) image: Option<(String, ImageHandle)>,
}

impl Element {
    pub(crate) fn new(id: Option<String>) -> Self {
        Self {
            id,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            style: StyleStack::new(),
            layout: LayoutState::default(),
            text: None,
            states: ElementStates::empty(),
            pending: AttributeSet::ALL,
            reexpand: true,
            z_index: None,
            image: None,
        }
    }

    /// The element's id, if it has one.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The parent element.
    #[must_use]
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    /// The resolved style.
    #[must_use]
    pub fn style(&self) -> &StyleStack {
        &self.style
    }

    /// Geometry from the last validation.
    #[must_use]
    pub fn layout(&self) -> &LayoutState {
        &self.layout
    }

    /// Text content.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Current interaction states.
    #[must_use]
    pub fn states(&self) -> ElementStates {
        self.states
    }

    /// The stacking bucket, or `None` for normal paint order.
    #[must_use]
    pub fn z_index(&self) -> Option<i32> {
        self.z_index
    }
}

/// Arena of elements with parent/child/sibling links stored as handles.
#[derive(Debug)]
pub(crate) struct Elements {
    arena: HandleManager<ElementId, Element>,
}

impl Elements {
    pub(crate) fn new(check: GenerationCheck) -> Self {
        Self {
            arena: HandleManager::with_generation_check(check),
        }
    }

    pub(crate) fn insert(&mut self, element: Element) -> Option<ElementId> {
        let id = self.arena.create_handle();
        if id.is_null() {
            return None;
        }
        self.arena.associate_object_with_handle(id, element).ok()?;
        Some(id)
    }

    pub(crate) fn remove(&mut self, id: ElementId) -> Option<Element> {
        self.arena.delete_handle(id)
    }

    #[inline]
    pub(crate) fn get(&self, id: ElementId) -> Option<&Element> {
        self.arena.get_associated_object(id)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.arena.get_associated_object_mut(id)
    }

    pub(crate) fn contains(&self, id: ElementId) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.arena.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (ElementId, &Element)> + '_ {
        self.arena.iterate_associated_objects()
    }

    pub(crate) fn ids(&self) -> Vec<ElementId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub(crate) fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.get(id)?.parent
    }

    pub(crate) fn next_sibling(&self, id: ElementId) -> Option<ElementId> {
        self.get(id)?.next_sibling
    }

    pub(crate) fn prev_sibling(&self, id: ElementId) -> Option<ElementId> {
        self.get(id)?.prev_sibling
    }

    pub(crate) fn children(&self, id: ElementId) -> Children<'_> {
        Children {
            elements: self,
            next: self.get(id).and_then(|e| e.first_child),
        }
    }

    pub(crate) fn child_ids(&self, id: ElementId) -> SmallVec<[ElementId; 8]> {
        self.children(id).collect()
    }

    /// Number of ancestors.
    pub(crate) fn depth(&self, id: ElementId) -> usize {
        let mut depth = 0;
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            depth += 1;
            cur = self.parent(p);
        }
        depth
    }

    /// Returns `true` if `ancestor` is `id` or one of its ancestors.
    pub(crate) fn is_ancestor_or_self(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut cur = Some(id);
        while let Some(e) = cur {
            if e == ancestor {
                return true;
            }
            cur = self.parent(e);
        }
        false
    }

    /// The element and all its descendants, in pre-order.
    pub(crate) fn subtree(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(e) = stack.pop() {
            if !self.contains(e) {
                continue;
            }
            out.push(e);
            let children = self.child_ids(e);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Links a parentless `child` under `parent`, before `before` or last.
    ///
    /// Callers validate liveness and structure first.
    pub(crate) fn link(&mut self, parent: ElementId, child: ElementId, before: Option<ElementId>) {
        let prev = match before {
            Some(b) => self.prev_sibling(b),
            None => self.get(parent).and_then(|p| p.last_child),
        };
        if let Some(c) = self.get_mut(child) {
            c.parent = Some(parent);
            c.prev_sibling = prev;
            c.next_sibling = before;
        }
        match prev {
            Some(p) => {
                if let Some(p) = self.get_mut(p) {
                    p.next_sibling = Some(child);
                }
            }
            None => {
                if let Some(p) = self.get_mut(parent) {
                    p.first_child = Some(child);
                }
            }
        }
        match before {
            Some(b) => {
                if let Some(b) = self.get_mut(b) {
                    b.prev_sibling = Some(child);
                }
            }
            None => {
                if let Some(p) = self.get_mut(parent) {
                    p.last_child = Some(child);
                }
            }
        }
    }

    /// Detaches `child` from its parent and siblings.
    pub(crate) fn unlink(&mut self, child: ElementId) {
        let Some(c) = self.get_mut(child) else {
            return;
        };
        let parent = c.parent.take();
        let prev = c.prev_sibling.take();
        let next = c.next_sibling.take();
        match prev {
            Some(p) => {
                if let Some(p) = self.get_mut(p) {
                    p.next_sibling = next;
                }
            }
            None => {
                if let Some(p) = parent.and_then(|p| self.get_mut(p)) {
                    p.first_child = next;
                }
            }
        }
        match next {
            Some(n) => {
                if let Some(n) = self.get_mut(n) {
                    n.prev_sibling = prev;
                }
            }
            None => {
                if let Some(p) = parent.and_then(|p| self.get_mut(p)) {
                    p.last_child = prev;
                }
            }
        }
    }
}

/// Iterator over the children of an element.
#[derive(Clone, Debug)]
pub struct Children<'a> {
    elements: &'a Elements,
    next: Option<ElementId>,
}

impl Iterator for Children<'_> {
    type Item = ElementId;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next?;
        self.next = self.elements.next_sibling(cur);
        Some(cur)
    }
}
