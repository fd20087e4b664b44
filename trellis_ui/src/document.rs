// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The element tree, wired to the style server and the layout manager.

use core::fmt;
use core::mem;

use hashbrown::HashSet;
use kurbo::{Point, Size};
use trellis_dirty::DirtyFlags;
use trellis_handle::Handle;
use trellis_style::{
    AttributeId, AttributeSet, ChangeEffect, ClassId, ElementStates, StyleChanges, StyleServer,
};

use crate::config::DocumentConfig;
use crate::element::{Children, Element, ElementId, Elements};
use crate::error::TreeError;
use crate::events::{EventQueue, InputEvent, MouseButton};
use crate::gc::{DeferredCollector, RenderEpoch};
use crate::layout::{LayoutManager, LayoutState};
use crate::render::{
    ApproximateMetrics, FontMetrics, FontSpec, ImageManager, ImageRegistry, RenderCommand,
    Renderer, fade,
};
use crate::tree::ElementTree;
use crate::zindex::ZIndexBuckets;

/// Upper bound on cascade rounds in one synchronization. Each round can only
/// be triggered by derived state (the disabled flag) settling further down
/// the tree, so real documents need two or three.
const MAX_CASCADE_ROUNDS: usize = 32;

/// What one [`Document::step`] did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Elements whose screen rectangle or clip changed.
    pub geometry_changed: Vec<ElementId>,
    /// Input events drained from the queue.
    pub dispatched: usize,
    /// Keyboard and text input, paired with the element that had focus.
    pub focused_input: Vec<(ElementId, InputEvent)>,
    /// Removed elements finally dropped.
    pub collected: usize,
}

/// A retained element tree with cascading styles and incremental layout.
///
/// Mutations only record what became stale. [`Document::validate`] (or
/// [`Document::step`]) brings styles and geometry up to date: pending style
/// changes are cascaded top-down, their effects invalidate layout, and the
/// layout manager resolves what was invalidated.
///
/// ```rust
/// use trellis_style::ErrorStack;
/// use trellis_ui::{Document, DocumentConfig};
///
/// let mut doc = Document::new(DocumentConfig::new().with_viewport(400.0, 300.0));
/// let mut errors = ErrorStack::new();
/// doc.styles_mut()
///     .load_script("app", "bar { height: 20px; } fill { height: 50%; }", "", &mut errors)
///     .unwrap();
///
/// let bar = doc.create_element(Some("bar")).unwrap();
/// let fill = doc.create_element(None).unwrap();
/// doc.append_child(doc.root(), bar).unwrap();
/// doc.append_child(doc.root(), fill).unwrap();
/// doc.attach_class_name(bar, "bar").unwrap();
/// doc.attach_class_name(fill, "fill").unwrap();
/// doc.validate();
///
/// let fill = doc.layout(fill).unwrap();
/// assert_eq!(fill.y(), 20.0);
/// assert_eq!(fill.height(), 150.0);
/// assert_eq!(doc.find_by_id("bar"), Some(bar));
/// ```
pub struct Document {
    config: DocumentConfig,
    styles: StyleServer,
    elements: Elements,
    tree: ElementTree,
    root: ElementId,
    layout: LayoutManager,
    z_buckets: ZIndexBuckets,
    focus: Option<ElementId>,
    hover: Option<ElementId>,
    pushed: Option<ElementId>,
    pointer: Point,
    events: EventQueue,
    collector: DeferredCollector<Element>,
    fonts: Box<dyn FontMetrics>,
    images: Box<dyn ImageManager>,
    repaint: HashSet<ElementId>,
    restyle: bool,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("config", &self.config)
            .field("elements", &self.elements.len())
            .field("root", &self.root)
            .field("focus", &self.focus)
            .field("hover", &self.hover)
            .field("pending_layout", &self.layout.pending())
            .field("retired", &self.collector.pending())
            .finish_non_exhaustive()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(DocumentConfig::default())
    }
}

impl Document {
    /// Creates a document holding only the root element.
    ///
    /// The root is styled by the built-in `default` and `root` classes and
    /// always covers the viewport.
    #[must_use]
    pub fn new(config: DocumentConfig) -> Self {
        let styles = StyleServer::new();
        let mut elements = Elements::new(config.generation_check());
        let mut root = Element::new(None);
        root.style.attach(styles.default_class());
        root.style.attach(styles.root_class());
        // A fresh arena always has room for one element.
        let root = elements.insert(root).unwrap_or_else(ElementId::null);
        let mut layout = LayoutManager::new();
        layout.invalidate(root, DirtyFlags::all());
        Self {
            collector: DeferredCollector::new(config.collect_delay()),
            events: EventQueue::with_capacity(config.event_capacity()),
            config,
            styles,
            elements,
            tree: ElementTree::new(),
            root,
            layout,
            z_buckets: ZIndexBuckets::new(),
            focus: None,
            hover: None,
            pushed: None,
            pointer: Point::ORIGIN,
            fonts: Box::new(ApproximateMetrics),
            images: Box::new(ImageRegistry::new()),
            repaint: HashSet::new(),
            restyle: true,
        }
    }

    /// Replaces the text measurement oracle. Every text is re-measured.
    pub fn set_font_metrics(&mut self, fonts: impl FontMetrics + 'static) {
        self.fonts = Box::new(fonts);
        for id in self.elements.ids() {
            self.layout.invalidate_text(id);
        }
    }

    /// Replaces the image loader. Images already loaded keep their handles
    /// from the previous loader.
    pub fn set_image_manager(&mut self, images: impl ImageManager + 'static) {
        self.images = Box::new(images);
    }

    /// The options this document was created with.
    #[must_use]
    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// Resizes the viewport.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.config = self.config.clone().with_viewport(width, height);
        self.layout.invalidate(self.root, DirtyFlags::SIZE);
    }

    /// The root element.
    #[must_use]
    pub fn root(&self) -> ElementId {
        self.root
    }

    /// The style server. Changes made through it are picked up by the next
    /// validation.
    #[must_use]
    pub fn styles(&self) -> &StyleServer {
        &self.styles
    }

    /// Mutable access to the style server.
    pub fn styles_mut(&mut self) -> &mut StyleServer {
        &mut self.styles
    }

    /// The layout manager, for explicit invalidation.
    pub fn layout_manager_mut(&mut self) -> &mut LayoutManager {
        &mut self.layout
    }

    /// The id index.
    #[must_use]
    pub fn element_tree(&self) -> &ElementTree {
        &self.tree
    }

    /// The input queue. Clone it to push from another thread.
    #[must_use]
    pub fn event_queue(&self) -> &EventQueue {
        &self.events
    }

    /// The counter a render thread publishes finished frames to.
    #[must_use]
    pub fn render_epoch(&self) -> &RenderEpoch {
        self.collector.render_epoch()
    }

    /// Number of live elements, the root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Always `false`; the root cannot be removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.len() == 0
    }

    /// Looks up a live element.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    /// Geometry of a live element as of the last validation.
    #[must_use]
    pub fn layout(&self, id: ElementId) -> Option<&LayoutState> {
        self.elements.get(id).map(Element::layout)
    }

    /// The parent of a live element.
    #[must_use]
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.elements.parent(id)
    }

    /// The children of an element, in order.
    #[must_use]
    pub fn children(&self, id: ElementId) -> Children<'_> {
        self.elements.children(id)
    }

    /// The element registered under `id`.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<ElementId> {
        self.tree.find_by_id(id)
    }

    /// The focused element.
    #[must_use]
    pub fn focus(&self) -> Option<ElementId> {
        self.focus
    }

    /// The element under the pointer.
    #[must_use]
    pub fn hover(&self) -> Option<ElementId> {
        self.hover
    }

    fn live(&self, id: ElementId) -> Result<&Element, TreeError> {
        self.elements.get(id).ok_or(TreeError::UnknownElement(id))
    }

    fn live_mut(&mut self, id: ElementId) -> Result<&mut Element, TreeError> {
        self.elements
            .get_mut(id)
            .ok_or(TreeError::UnknownElement(id))
    }

    /// Creates a detached element styled by the `default` class.
    pub fn create_element(&mut self, id: Option<&str>) -> Result<ElementId, TreeError> {
        if let Some(name) = id
            && self.tree.find_by_id(name).is_some()
        {
            return Err(TreeError::DuplicateId(name.to_owned()));
        }
        let mut element = Element::new(id.map(str::to_owned));
        element.style.attach(self.styles.default_class());
        let handle = self.elements.insert(element).ok_or(TreeError::Exhausted)?;
        if let Some(name) = id {
            self.tree.insert(name, handle)?;
        }
        tracing::trace!(element = ?handle, id, "created element");
        Ok(handle)
    }

    /// Appends a detached `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), TreeError> {
        self.check_insert(parent, child)?;
        self.elements.link(parent, child, None);
        self.attached(child);
        Ok(())
    }

    /// Inserts a detached `child` under `parent`, just before `before`.
    pub fn insert_before(
        &mut self,
        parent: ElementId,
        child: ElementId,
        before: ElementId,
    ) -> Result<(), TreeError> {
        self.check_insert(parent, child)?;
        if self.live(before)?.parent != Some(parent) {
            return Err(TreeError::NotAChild {
                parent,
                child: before,
            });
        }
        self.elements.link(parent, child, Some(before));
        self.attached(child);
        Ok(())
    }

    fn check_insert(&self, parent: ElementId, child: ElementId) -> Result<(), TreeError> {
        self.live(parent)?;
        if child == self.root {
            return Err(TreeError::Root);
        }
        if self.live(child)?.parent.is_some() {
            return Err(TreeError::AlreadyAttached(child));
        }
        if self.elements.is_ancestor_or_self(child, parent) {
            return Err(TreeError::WouldCycle(child));
        }
        Ok(())
    }

    /// Everything under a newly linked element must be restyled against its
    /// new ancestors and laid out again.
    fn attached(&mut self, child: ElementId) {
        for id in self.elements.subtree(child) {
            if let Some(e) = self.elements.get_mut(id) {
                e.pending = AttributeSet::ALL;
                e.reexpand = true;
            }
            self.layout.invalidate(id, DirtyFlags::all());
        }
        if let Some(parent) = self.elements.parent(child) {
            self.layout.invalidate(parent, DirtyFlags::SIZE);
        }
        self.invalidate_following(child);
        self.refresh_disabled(child);
        self.restyle = true;
    }

    /// Removes `child` from `parent` and destroys its subtree.
    pub fn remove_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), TreeError> {
        if self.live(child)?.parent != Some(parent) {
            return Err(TreeError::NotAChild { parent, child });
        }
        self.remove_element(child)
    }

    /// Destroys an element and its subtree.
    ///
    /// The elements leave the tree, the id index, and the stacking buckets at
    /// once; their storage is handed to the deferred collector.
    pub fn remove_element(&mut self, id: ElementId) -> Result<(), TreeError> {
        if id == self.root {
            return Err(TreeError::Root);
        }
        let parent = self.live(id)?.parent;
        if let Some(parent) = parent {
            self.invalidate_following(id);
            self.layout.invalidate(parent, DirtyFlags::SIZE);
        }
        self.elements.unlink(id);

        let subtree = self.elements.subtree(id);
        for &e in &subtree {
            if self.focus == Some(e) {
                self.focus = None;
            }
            if self.hover == Some(e) {
                self.hover = None;
            }
            if self.pushed == Some(e) {
                self.pushed = None;
            }
            self.layout.forget(e);
            self.repaint.remove(&e);
            let Some(mut element) = self.elements.remove(e) else {
                continue;
            };
            if let Some(name) = element.id.as_deref() {
                self.tree.remove(name, e);
            }
            if let Some(z) = element.z_index {
                self.z_buckets.remove(e, z);
            }
            if let Some((_, image)) = element.image.take() {
                self.images.delete(image);
            }
            self.collector.retire(element);
        }
        tracing::debug!(element = ?id, removed = subtree.len(), "removed subtree");
        Ok(())
    }

    /// Changes the id of an element; `None` clears it.
    pub fn set_element_id(&mut self, element: ElementId, id: Option<&str>) -> Result<(), TreeError> {
        let old = self.live(element)?.id.clone();
        if old.as_deref() == id {
            return Ok(());
        }
        if let Some(name) = id {
            self.tree.insert(name, element)?;
        }
        if let Some(old) = old.as_deref() {
            self.tree.remove(old, element);
        }
        self.live_mut(element)?.id = id.map(str::to_owned);
        Ok(())
    }

    fn invalidate_following(&mut self, id: ElementId) {
        let mut cur = self.elements.next_sibling(id);
        while let Some(s) = cur {
            self.layout.invalidate_position(s);
            cur = self.elements.next_sibling(s);
        }
    }

    /// Attaches a style class on top of the element's stack.
    ///
    /// Returns `Ok(false)` if it was already attached or the class no longer
    /// exists.
    pub fn attach_class(&mut self, element: ElementId, class: ClassId) -> Result<bool, TreeError> {
        let alive = self.styles.class(class).is_some();
        let e = self.live_mut(element)?;
        if !alive || !e.style.attach(class) {
            return Ok(false);
        }
        e.reexpand = true;
        self.restyle = true;
        Ok(true)
    }

    /// Attaches a style class by name.
    ///
    /// Returns `Ok(false)` if it was already attached or no class has that
    /// name.
    pub fn attach_class_name(&mut self, element: ElementId, name: &str) -> Result<bool, TreeError> {
        match self.styles.class_id(name) {
            Some(class) => self.attach_class(element, class),
            None => {
                self.live(element)?;
                tracing::debug!(class = name, "attaching unknown style class ignored");
                Ok(false)
            }
        }
    }

    /// Detaches a style class. Returns `Ok(false)` if it was not attached.
    pub fn detach_class(&mut self, element: ElementId, class: ClassId) -> Result<bool, TreeError> {
        let e = self.live_mut(element)?;
        if !e.style.detach(class) {
            return Ok(false);
        }
        e.reexpand = true;
        self.restyle = true;
        Ok(true)
    }

    /// Detaches a style class by name.
    pub fn detach_class_name(&mut self, element: ElementId, name: &str) -> Result<bool, TreeError> {
        match self.styles.class_id(name) {
            Some(class) => self.detach_class(element, class),
            None => self.live(element).map(|_| false),
        }
    }

    /// Turns interaction states on or off. Returns `Ok(true)` if the states
    /// changed; active state modifiers follow at the next validation.
    pub fn set_state(
        &mut self,
        element: ElementId,
        states: ElementStates,
        on: bool,
    ) -> Result<bool, TreeError> {
        let e = self.live_mut(element)?;
        let before = e.states;
        e.states.set(states, on);
        if e.states == before {
            return Ok(false);
        }
        e.reexpand = true;
        self.restyle = true;
        Ok(true)
    }

    /// Moves keyboard focus. Disabled elements cannot take focus.
    ///
    /// Returns `Ok(false)` if the focus did not change.
    pub fn set_focus(&mut self, element: Option<ElementId>) -> Result<bool, TreeError> {
        if let Some(e) = element
            && self.live(e)?.states.contains(ElementStates::DISABLED)
        {
            return Ok(false);
        }
        if self.focus == element {
            return Ok(false);
        }
        if let Some(old) = self.focus.take() {
            self.set_state(old, ElementStates::FOCUSED, false)?;
        }
        if let Some(new) = element {
            self.set_state(new, ElementStates::FOCUSED, true)?;
        }
        self.focus = element;
        Ok(true)
    }

    /// Replaces the text content of an element.
    pub fn set_text(&mut self, element: ElementId, text: Option<&str>) -> Result<(), TreeError> {
        let e = self.live_mut(element)?;
        if e.text.as_deref() == text {
            return Ok(());
        }
        e.text = text.map(str::to_owned);
        self.layout.invalidate_text(element);
        self.repaint.insert(element);
        Ok(())
    }

    /// Brings every element's resolved style up to date and applies the
    /// effects of what changed.
    fn sync_styles(&mut self) {
        for round in 0..MAX_CASCADE_ROUNDS {
            if self.styles.has_changes() {
                let changes = self.styles.take_changes();
                self.apply_style_changes(&changes);
            }
            if !self.restyle {
                return;
            }
            self.restyle = false;
            self.cascade();
            tracing::trace!(round, "cascade round");
        }
        tracing::warn!("style cascade did not settle");
    }

    /// Marks the elements hosting changed classes.
    fn apply_style_changes(&mut self, changes: &StyleChanges) {
        if changes.is_empty() {
            return;
        }
        let structure = changes.structure_changed();
        for id in self.elements.ids() {
            let Some(e) = self.elements.get_mut(id) else {
                continue;
            };
            if structure || changes.removed_classes().iter().any(|&c| e.style.hosts(c)) {
                e.reexpand = true;
                e.pending = AttributeSet::ALL;
                self.restyle = true;
                continue;
            }
            for &(class, attribute) in changes.slots() {
                if e.style.hosts(class) {
                    e.pending.insert(attribute);
                    self.restyle = true;
                }
            }
        }
    }

    /// One pre-order pass over the attached tree. Parents are refreshed
    /// before their children, and what changed in a parent is re-resolved in
    /// each child.
    fn cascade(&mut self) {
        for id in self.elements.subtree(self.root) {
            let Some(e) = self.elements.get_mut(id) else {
                continue;
            };
            if !e.reexpand && e.pending.is_empty() {
                continue;
            }
            let mut style = mem::take(&mut e.style);
            let reexpand = mem::replace(&mut e.reexpand, false);
            let mut pending = mem::replace(&mut e.pending, AttributeSet::EMPTY);
            let states = e.states;
            let parent = e.parent;

            if reexpand && style.expand(&self.styles, states) {
                pending = AttributeSet::ALL;
            }
            let parent_style = parent.and_then(|p| self.elements.get(p)).map(Element::style);
            let refreshed = style.refresh_set(pending, &self.styles, parent_style);
            if let Some(e) = self.elements.get_mut(id) {
                e.style = style;
            }
            if refreshed.is_empty() {
                continue;
            }
            let inherited = refreshed.any();
            for c in self.elements.child_ids(id) {
                if let Some(child) = self.elements.get_mut(c) {
                    child.pending = child.pending.union(inherited);
                }
            }
            if !refreshed.value.is_empty() {
                self.apply_effects(id, refreshed.value);
            }
        }
    }

    /// Reacts to resolved values that changed.
    fn apply_effects(&mut self, id: ElementId, changed: AttributeSet) {
        let effects = changed.effects();
        let mut flags = DirtyFlags::empty();
        if effects.contains(ChangeEffect::WIDTH) {
            flags |= DirtyFlags::WIDTH;
        }
        if effects.contains(ChangeEffect::HEIGHT) {
            flags |= DirtyFlags::HEIGHT;
        }
        if effects.contains(ChangeEffect::POSITION) {
            flags |= DirtyFlags::POSITION;
        }
        if effects.contains(ChangeEffect::TEXT) {
            flags |= DirtyFlags::TEXT;
        }
        self.layout.invalidate(id, flags);

        if self.update_priority(id, changed) {
            self.layout.invalidate_position(id);
        }
        if changed.contains(AttributeId::VISIBLE) || changed.contains(AttributeId::POSITIONING) {
            if let Some(parent) = self.elements.parent(id) {
                self.layout.invalidate(parent, DirtyFlags::SIZE);
            }
            self.invalidate_following(id);
        }
        if effects.contains(ChangeEffect::CHILDREN) {
            for c in self.elements.child_ids(id) {
                self.layout
                    .invalidate(c, DirtyFlags::SIZE | DirtyFlags::POSITION);
            }
        }
        if effects.intersects(ChangeEffect::MESH | ChangeEffect::VISIBILITY) {
            self.repaint.insert(id);
        }
        if changed.contains(AttributeId::BACKGROUND_IMAGE) {
            self.update_image(id);
        }
        if effects.contains(ChangeEffect::Z_INDEX) {
            self.update_z_index(id);
        }
        if effects.contains(ChangeEffect::ENABLED) {
            self.refresh_disabled(id);
        }
    }

    /// Records which of a pair of offsets was set last. When both change in
    /// the same refresh, `left` and `top` win.
    fn update_priority(&mut self, id: ElementId, changed: AttributeSet) -> bool {
        let Some(e) = self.elements.get_mut(id) else {
            return false;
        };
        let set = |a: AttributeId| changed.contains(a) && !e.style.size(a).is_auto();
        let (left, right, top, bottom) = (
            set(AttributeId::LEFT),
            set(AttributeId::RIGHT),
            set(AttributeId::TOP),
            set(AttributeId::BOTTOM),
        );
        let mut moved = false;
        if left || right {
            moved |= e.layout.set_right_priority(!left);
        }
        if top || bottom {
            moved |= e.layout.set_bottom_priority(!top);
        }
        moved
    }

    fn update_image(&mut self, id: ElementId) {
        let Some(e) = self.elements.get_mut(id) else {
            return;
        };
        let path = e.style.image().map(str::to_owned);
        if e.image.as_ref().map(|(p, _)| p.as_str()) == path.as_deref() {
            return;
        }
        let old = e.image.take();
        let new = path.map(|p| {
            let handle = self.images.load(&p);
            if handle.is_null() {
                tracing::warn!(path = %p, "background image failed to load");
            }
            (p, handle)
        });
        if let Some((_, handle)) = old {
            self.images.delete(handle);
        }
        if let Some(e) = self.elements.get_mut(id) {
            e.image = new;
        }
    }

    fn update_z_index(&mut self, id: ElementId) {
        let Some(e) = self.elements.get_mut(id) else {
            return;
        };
        let new = e.style.z_index();
        let old = mem::replace(&mut e.z_index, new);
        self.z_buckets.update(id, old, new);
        self.repaint.insert(id);
    }

    /// Re-derives the disabled state below `from`: an element is disabled if
    /// it or any ancestor resolves `enabled: false`. Focus inside a newly
    /// disabled subtree is dropped.
    fn refresh_disabled(&mut self, from: ElementId) {
        for id in self.elements.subtree(from) {
            let parent_disabled = self
                .elements
                .parent(id)
                .and_then(|p| self.elements.get(p))
                .is_some_and(|p| p.states.contains(ElementStates::DISABLED));
            let Some(e) = self.elements.get_mut(id) else {
                continue;
            };
            let disabled = parent_disabled || !e.style.flag(AttributeId::ENABLED, true);
            if e.states.contains(ElementStates::DISABLED) != disabled {
                e.states.set(ElementStates::DISABLED, disabled);
                e.reexpand = true;
                self.restyle = true;
            }
        }
        if let Some(focus) = self.focus
            && self
                .elements
                .get(focus)
                .is_some_and(|e| e.states.contains(ElementStates::DISABLED))
        {
            tracing::debug!(element = ?focus, "focused element disabled");
            if let Some(e) = self.elements.get_mut(focus) {
                e.states.remove(ElementStates::FOCUSED);
                e.reexpand = true;
            }
            self.focus = None;
        }
    }

    /// Synchronizes styles and resolves stale geometry.
    ///
    /// Returns the elements whose screen rectangle or clip changed; calling
    /// it again without intervening changes returns nothing.
    pub fn validate(&mut self) -> Vec<ElementId> {
        self.sync_styles();
        let viewport = self.config.viewport();
        let changed = self
            .layout
            .validate(&mut self.elements, self.root, viewport, &*self.fonts);
        if !changed.is_empty() {
            tracing::debug!(changed = changed.len(), "layout validated");
        }
        self.repaint.extend(changed.iter().copied());
        changed
    }

    /// Runs one frame of logic: validates, routes queued input, validates
    /// again for the states input changed, and frees retired elements the
    /// renderer is done with.
    pub fn step(&mut self) -> StepReport {
        let mut report = StepReport {
            geometry_changed: self.validate(),
            ..StepReport::default()
        };
        let events = self.events.drain();
        report.dispatched = events.len();
        for event in events {
            self.dispatch(event, &mut report.focused_input);
        }
        for id in self.validate() {
            if !report.geometry_changed.contains(&id) {
                report.geometry_changed.push(id);
            }
        }
        report.collected = self.collector.collect();
        self.collector.advance();
        report
    }

    fn dispatch(&mut self, event: InputEvent, focused: &mut Vec<(ElementId, InputEvent)>) {
        match event {
            InputEvent::MouseMove(position) => {
                self.pointer = position;
                let hit = self.hit_test(position);
                if hit != self.hover {
                    if let Some(old) = self.hover {
                        self.set_input_state(old, ElementStates::HOVERED, false);
                    }
                    if let Some(new) = hit {
                        self.set_input_state(new, ElementStates::HOVERED, true);
                    }
                    self.hover = hit;
                }
            }
            InputEvent::MousePress {
                position,
                button: MouseButton::Left,
            } => {
                self.pointer = position;
                let hit = self
                    .hit_test(position)
                    .filter(|&e| !self.is_disabled(e));
                if let Some(e) = hit {
                    self.set_input_state(e, ElementStates::PUSHED, true);
                }
                self.pushed = hit;
                if let Err(error) = self.set_focus(hit) {
                    tracing::debug!(?hit, %error, "press target vanished before focusing");
                }
            }
            InputEvent::MouseRelease {
                position,
                button: MouseButton::Left,
            } => {
                self.pointer = position;
                if let Some(e) = self.pushed.take() {
                    self.set_input_state(e, ElementStates::PUSHED, false);
                }
            }
            InputEvent::MousePress { .. } | InputEvent::MouseRelease { .. } => {}
            InputEvent::Key { .. } | InputEvent::Char(_) => {
                if let Some(focus) = self.focus {
                    focused.push((focus, event));
                }
            }
        }
    }

    /// Input-driven state change. The target came from a hit test or from
    /// state that removal clears, so failure only means it is already gone.
    fn set_input_state(&mut self, id: ElementId, states: ElementStates, on: bool) {
        if let Err(error) = self.set_state(id, states, on) {
            tracing::debug!(element = ?id, ?states, %error, "input state target vanished");
        }
    }

    fn is_disabled(&self, id: ElementId) -> bool {
        self.elements
            .get(id)
            .is_some_and(|e| e.states.contains(ElementStates::DISABLED))
    }

    /// The last pointer position seen.
    #[must_use]
    pub fn pointer(&self) -> Point {
        self.pointer
    }

    /// Elements that need repainting since the last [`Document::render`], in
    /// no particular order.
    pub fn take_repaint(&mut self) -> Vec<ElementId> {
        self.repaint.drain().collect()
    }

    /// Visible elements in paint order: the normal tree traversal, skipping
    /// subtrees with an explicit z-index, followed by those subtrees bucket by
    /// bucket in ascending z-index.
    #[must_use]
    pub fn paint_order(&self) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.paint_subtree(self.root, &mut out);
        for (_, bucket) in self.z_buckets.iter() {
            for &e in bucket {
                if self.is_displayed(e) {
                    self.paint_subtree(e, &mut out);
                }
            }
        }
        out
    }

    /// The elements with explicit z-index `z`.
    #[must_use]
    pub fn z_bucket(&self, z: i32) -> &[ElementId] {
        self.z_buckets.bucket(z)
    }

    /// Whether `id` is attached below the root with every ancestor visible.
    fn is_displayed(&self, id: ElementId) -> bool {
        let mut cur = self.elements.parent(id);
        while let Some(p) = cur {
            if !self.is_visible(p) {
                return false;
            }
            if p == self.root {
                return true;
            }
            cur = self.elements.parent(p);
        }
        false
    }

    fn is_visible(&self, id: ElementId) -> bool {
        self.elements
            .get(id)
            .is_some_and(|e| e.style.flag(AttributeId::VISIBLE, true))
    }

    fn paint_subtree(&self, start: ElementId, out: &mut Vec<ElementId>) {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(e) = self.elements.get(id) else {
                continue;
            };
            if !e.style.flag(AttributeId::VISIBLE, true) {
                continue;
            }
            if id != start && e.z_index.is_some() {
                continue;
            }
            out.push(id);
            let children = self.elements.child_ids(id);
            stack.extend(children.into_iter().rev());
        }
    }

    /// The topmost visible element whose visible area contains `point`.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> Option<ElementId> {
        self.paint_order().into_iter().rev().find(|&id| {
            self.elements
                .get(id)
                .is_some_and(|e| e.layout.clipping_rect().contains(point))
        })
    }

    /// Describes the current frame.
    #[must_use]
    pub fn render_commands(&self) -> Vec<RenderCommand> {
        let mut out = Vec::new();
        for id in self.paint_order() {
            let Some(e) = self.elements.get(id) else {
                continue;
            };
            let l = &e.layout;
            let scissor = l.clipping_rect();
            if scissor.is_zero_area() {
                continue;
            }
            let style = &e.style;
            let opacity = style.number(AttributeId::OPACITY, 1.0);
            let rect = l.absolute_rect();

            let background = style.color(AttributeId::BACKGROUND_COLOR);
            if !background.is_transparent() {
                out.push(RenderCommand::Background {
                    rect,
                    color: fade(background, opacity),
                    scissor,
                });
            }
            if let Some((_, image)) = &e.image
                && !image.is_null()
            {
                out.push(RenderCommand::Image {
                    rect,
                    image: *image,
                    scissor,
                });
            }
            let widths = l.border();
            if widths.x0 > 0.0 || widths.y0 > 0.0 || widths.x1 > 0.0 || widths.y1 > 0.0 {
                let colors = [
                    AttributeId::BORDER_LEFT_COLOR,
                    AttributeId::BORDER_RIGHT_COLOR,
                    AttributeId::BORDER_TOP_COLOR,
                    AttributeId::BORDER_BOTTOM_COLOR,
                ]
                .map(|a| fade(style.color(a), opacity));
                out.push(RenderCommand::Border {
                    rect,
                    widths,
                    colors,
                    scissor,
                });
            }
            if let Some(text) = e.text.as_deref()
                && !text.is_empty()
            {
                out.push(RenderCommand::Text {
                    origin: l.inner_rect().origin(),
                    text: text.to_owned(),
                    font: FontSpec::from_style(style),
                    color: fade(style.color(AttributeId::COLOR), opacity),
                    scissor: l.clipping_rect_inner(),
                });
            }
        }
        out
    }

    /// Submits the current frame and records it as finished for the current
    /// logic epoch.
    pub fn render(&mut self, renderer: &mut dyn Renderer) {
        let commands = self.render_commands();
        renderer.submit(&commands);
        self.repaint.clear();
        self.collector.render_epoch().publish(self.collector.epoch());
    }

    /// The viewport size.
    #[must_use]
    pub fn viewport(&self) -> Size {
        self.config.viewport()
    }
}
