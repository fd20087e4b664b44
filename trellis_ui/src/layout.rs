// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental layout.
//!
//! Geometry is resolved in four drained passes: text measurement, width,
//! height, and position. Each pass keeps running until no element carries its
//! flag, so a child whose size feeds back into its parent (or a parent whose
//! inner size feeds its flexible children) settles before any position is
//! computed. A final sweep derives absolute coordinates and clip rectangles
//! for the whole tree.

use kurbo::{Insets, Point, Rect, Size, Vec2};
use trellis_dirty::{DirtyFlags, InvalidList};
use trellis_style::{
    AttributeId, HorizontalAlign, Overflow, Plane, Positioning, RelativeMode, StyleStack,
    VerticalAlign,
};

use crate::element::{ElementId, Elements};
use crate::render::{FontMetrics, FontSpec};

/// Geometry differences below this are treated as no change.
const EPSILON: f64 = 0.01;

#[inline]
fn differs(a: f64, b: f64) -> bool {
    (a - b).abs() > EPSILON
}

fn rect_differs(a: Rect, b: Rect) -> bool {
    differs(a.x0, b.x0) || differs(a.y0, b.y0) || differs(a.x1, b.x1) || differs(a.y1, b.y1)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

impl Axis {
    const BOTH: [Self; 2] = [Self::X, Self::Y];

    #[inline]
    fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
        }
    }

    fn cross(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }

    fn of_plane(plane: Plane) -> Self {
        match plane {
            Plane::Horizontal => Self::X,
            Plane::Vertical => Self::Y,
        }
    }

    fn flag(self) -> DirtyFlags {
        match self {
            Self::X => DirtyFlags::WIDTH,
            Self::Y => DirtyFlags::HEIGHT,
        }
    }

    fn size(self) -> AttributeId {
        match self {
            Self::X => AttributeId::WIDTH,
            Self::Y => AttributeId::HEIGHT,
        }
    }

    fn min(self) -> AttributeId {
        match self {
            Self::X => AttributeId::MIN_WIDTH,
            Self::Y => AttributeId::MIN_HEIGHT,
        }
    }

    fn max(self) -> AttributeId {
        match self {
            Self::X => AttributeId::MAX_WIDTH,
            Self::Y => AttributeId::MAX_HEIGHT,
        }
    }

    fn mode(self) -> AttributeId {
        match self {
            Self::X => AttributeId::RELATIVE_WIDTH_MODE,
            Self::Y => AttributeId::RELATIVE_HEIGHT_MODE,
        }
    }

    fn flex(self) -> AttributeId {
        match self {
            Self::X => AttributeId::FLEX_CHILD_WIDTH,
            Self::Y => AttributeId::FLEX_CHILD_HEIGHT,
        }
    }

    fn margin(self) -> [AttributeId; 2] {
        match self {
            Self::X => [AttributeId::MARGIN_LEFT, AttributeId::MARGIN_RIGHT],
            Self::Y => [AttributeId::MARGIN_TOP, AttributeId::MARGIN_BOTTOM],
        }
    }

    fn padding(self) -> [AttributeId; 2] {
        match self {
            Self::X => [AttributeId::PADDING_LEFT, AttributeId::PADDING_RIGHT],
            Self::Y => [AttributeId::PADDING_TOP, AttributeId::PADDING_BOTTOM],
        }
    }

    fn border(self) -> [AttributeId; 2] {
        match self {
            Self::X => [AttributeId::BORDER_LEFT_WIDTH, AttributeId::BORDER_RIGHT_WIDTH],
            Self::Y => [AttributeId::BORDER_TOP_WIDTH, AttributeId::BORDER_BOTTOM_WIDTH],
        }
    }

    fn offsets(self) -> [AttributeId; 2] {
        match self {
            Self::X => [AttributeId::LEFT, AttributeId::RIGHT],
            Self::Y => [AttributeId::TOP, AttributeId::BOTTOM],
        }
    }

    fn extent(self, size: Size) -> f64 {
        match self {
            Self::X => size.width,
            Self::Y => size.height,
        }
    }
}

/// Whether an element takes part in its parent's flow.
fn in_flow(style: &StyleStack) -> bool {
    style.flag(AttributeId::VISIBLE, true) && style.positioning() != Positioning::Absolute
}

/// Whether an element's extent along `axis` is derived from its parent.
///
/// Such children are left out of the parent's content size, which keeps the
/// parent/child dependency acyclic.
fn depends_on_parent(style: &StyleStack, axis: Axis, parent_flex: bool) -> bool {
    let size = style.size(axis.size());
    let relative = |a: AttributeId| style.length(a).is_relative();
    size.length().is_some_and(|l| l.is_relative())
        || (size.is_auto() && parent_flex)
        || axis.margin().into_iter().any(relative)
        || relative(axis.min())
        || style.limit(axis.max()).is_some_and(|l| l.is_relative())
}

/// The offset pair along one axis, resolved against `base`.
fn offsets(style: &StyleStack, axis: Axis, base: f64) -> [Option<f64>; 2] {
    axis.offsets()
        .map(|a| style.size(a).length().map(|l| l.resolve(base)))
}

/// Resolved geometry of one element.
///
/// Positions are relative to the parent's border box; absolute coordinates
/// and clip rectangles are filled in after every validation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutState {
    size: [f64; 2],
    pos: [f64; 2],
    flow: [f64; 2],
    margin: [[f64; 2]; 2],
    padding: [[f64; 2]; 2],
    border: [[f64; 2]; 2],
    children: [f64; 2],
    share: [f64; 2],
    text: [f64; 2],
    priority: [bool; 2],
    absolute: Point,
    clipping_rect: Rect,
    clipping_rect_inner: Rect,
    clipped: bool,
}

impl LayoutState {
    /// Horizontal offset of the border box within the parent's border box.
    #[must_use]
    pub fn x(&self) -> f64 {
        self.pos[0]
    }

    /// Vertical offset of the border box within the parent's border box.
    #[must_use]
    pub fn y(&self) -> f64 {
        self.pos[1]
    }

    /// Border-box width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.size[0]
    }

    /// Border-box height.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.size[1]
    }

    /// Border-box size.
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.size[0], self.size[1])
    }

    /// Border box relative to the parent's border box.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size((self.pos[0], self.pos[1]), self.size())
    }

    /// Screen-space origin of the border box.
    #[must_use]
    pub fn absolute_position(&self) -> Point {
        self.absolute
    }

    /// Screen-space border box.
    #[must_use]
    pub fn absolute_rect(&self) -> Rect {
        Rect::from_origin_size(self.absolute, self.size())
    }

    /// Screen-space content box (border box minus border and padding).
    #[must_use]
    pub fn inner_rect(&self) -> Rect {
        deflate(self.absolute_rect(), self.frame())
    }

    /// Width of the content box.
    #[must_use]
    pub fn inner_width(&self) -> f64 {
        self.inner(Axis::X)
    }

    /// Height of the content box.
    #[must_use]
    pub fn inner_height(&self) -> f64 {
        self.inner(Axis::Y)
    }

    /// Resolved margins.
    #[must_use]
    pub fn margin(&self) -> Insets {
        insets(self.margin)
    }

    /// Resolved padding.
    #[must_use]
    pub fn padding(&self) -> Insets {
        insets(self.padding)
    }

    /// Resolved border widths.
    #[must_use]
    pub fn border(&self) -> Insets {
        insets(self.border)
    }

    /// Total extent of the flow children along the x axis.
    ///
    /// Children whose width is derived from this element are not counted.
    #[must_use]
    pub fn children_width(&self) -> f64 {
        self.children[0]
    }

    /// Total extent of the flow children along the y axis.
    #[must_use]
    pub fn children_height(&self) -> f64 {
        self.children[1]
    }

    /// Visible part of the border box, for background and border drawing.
    #[must_use]
    pub fn clipping_rect(&self) -> Rect {
        self.clipping_rect
    }

    /// Visible part of the content box, for text and clipped children.
    #[must_use]
    pub fn clipping_rect_inner(&self) -> Rect {
        self.clipping_rect_inner
    }

    /// Returns `true` if the border box reaches outside the content box of a
    /// parent with `overflow: hidden`.
    #[must_use]
    pub fn is_clipped(&self) -> bool {
        self.clipped
    }

    /// `right` wins over `left` when both are set.
    #[must_use]
    pub fn right_has_priority(&self) -> bool {
        self.priority[0]
    }

    /// `bottom` wins over `top` when both are set.
    #[must_use]
    pub fn bottom_has_priority(&self) -> bool {
        self.priority[1]
    }

    pub(crate) fn set_right_priority(&mut self, right: bool) -> bool {
        let changed = self.priority[0] != right;
        self.priority[0] = right;
        changed
    }

    pub(crate) fn set_bottom_priority(&mut self, bottom: bool) -> bool {
        let changed = self.priority[1] != bottom;
        self.priority[1] = bottom;
        changed
    }

    fn frame(&self) -> Insets {
        insets([
            [
                self.padding[0][0] + self.border[0][0],
                self.padding[0][1] + self.border[0][1],
            ],
            [
                self.padding[1][0] + self.border[1][0],
                self.padding[1][1] + self.border[1][1],
            ],
        ])
    }

    fn edge(&self, axis: Axis) -> f64 {
        let i = axis.index();
        self.padding[i][0] + self.padding[i][1] + self.border[i][0] + self.border[i][1]
    }

    fn origin(&self, axis: Axis) -> f64 {
        let i = axis.index();
        self.padding[i][0] + self.border[i][0]
    }

    fn inner(&self, axis: Axis) -> f64 {
        (self.size[axis.index()] - self.edge(axis)).max(0.0)
    }

    fn outer(&self, axis: Axis) -> f64 {
        let i = axis.index();
        self.size[i] + self.margin[i][0] + self.margin[i][1]
    }
}

fn insets(sides: [[f64; 2]; 2]) -> Insets {
    Insets::new(sides[0][0], sides[1][0], sides[0][1], sides[1][1])
}

/// Shrinks `rect` by `by`, collapsing to zero size instead of inverting.
fn deflate(rect: Rect, by: Insets) -> Rect {
    let x0 = rect.x0 + by.x0;
    let y0 = rect.y0 + by.y0;
    Rect::new(x0, y0, (rect.x1 - by.x1).max(x0), (rect.y1 - by.y1).max(y0))
}

fn contains(outer: Rect, inner: Rect) -> bool {
    inner.x0 >= outer.x0 - EPSILON
        && inner.y0 >= outer.y0 - EPSILON
        && inner.x1 <= outer.x1 + EPSILON
        && inner.y1 <= outer.y1 + EPSILON
}

/// What a child sees of its parent during a pass.
struct ParentFrame {
    /// Content size.
    inner: [f64; 2],
    /// Border-box size.
    outer: [f64; 2],
    /// Content origin within the border box.
    origin: [f64; 2],
    flex: [bool; 2],
    plane: Axis,
    share: [f64; 2],
}

impl ParentFrame {
    fn viewport(viewport: Size) -> Self {
        let size = [viewport.width, viewport.height];
        Self {
            inner: size,
            outer: size,
            origin: [0.0; 2],
            flex: [false; 2],
            plane: Axis::Y,
            share: [0.0; 2],
        }
    }
}

/// Tracks invalidated elements and resolves their geometry on
/// [`Document::validate`](crate::Document::validate).
#[derive(Debug, Default)]
pub struct LayoutManager {
    invalid: InvalidList<ElementId>,
    scratch: Vec<ElementId>,
    validations: u64,
}

impl LayoutManager {
    /// Creates a manager with nothing invalid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks parts of `element`'s geometry stale.
    pub fn invalidate(&mut self, element: ElementId, flags: DirtyFlags) {
        self.invalid.mark(element, flags);
    }

    /// Marks the width of `element` stale.
    pub fn invalidate_width(&mut self, element: ElementId) {
        self.invalidate(element, DirtyFlags::WIDTH);
    }

    /// Marks the height of `element` stale.
    pub fn invalidate_height(&mut self, element: ElementId) {
        self.invalidate(element, DirtyFlags::HEIGHT);
    }

    /// Marks the position of `element` stale.
    pub fn invalidate_position(&mut self, element: ElementId) {
        self.invalidate(element, DirtyFlags::POSITION);
    }

    /// Marks the text of `element` for re-measurement.
    pub fn invalidate_text(&mut self, element: ElementId) {
        self.invalidate(element, DirtyFlags::TEXT);
    }

    /// The stale parts of `element`.
    #[must_use]
    pub fn dirty_flags(&self, element: ElementId) -> DirtyFlags {
        self.invalid.flags(element)
    }

    /// Returns `true` if no element is stale.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty()
    }

    /// Number of stale elements.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.invalid.len()
    }

    /// Number of validations that had work to do.
    #[must_use]
    pub fn validations(&self) -> u64 {
        self.validations
    }

    pub(crate) fn forget(&mut self, element: ElementId) {
        self.invalid.remove_key(element);
    }

    /// Resolves every stale element, then recomputes absolute geometry.
    ///
    /// Returns the elements whose screen rectangle or clip changed. Returns
    /// nothing, and does no work, when no element is stale.
    pub(crate) fn validate(
        &mut self,
        elements: &mut Elements,
        root: ElementId,
        viewport: Size,
        fonts: &dyn FontMetrics,
    ) -> Vec<ElementId> {
        if self.invalid.is_empty() {
            return Vec::new();
        }
        self.validations += 1;
        let limit = elements.len().saturating_mul(16).max(64);
        let mut pass = Pass {
            elements,
            invalid: &mut self.invalid,
            root,
            viewport,
            fonts,
        };
        let mut rounds = 0_usize;
        while !pass.invalid.is_empty() {
            for flag in [
                DirtyFlags::TEXT,
                DirtyFlags::WIDTH,
                DirtyFlags::HEIGHT,
                DirtyFlags::POSITION,
            ] {
                loop {
                    pass.invalid.collect_with(flag, &mut self.scratch);
                    if self.scratch.is_empty() {
                        break;
                    }
                    rounds += 1;
                    if rounds > limit {
                        tracing::warn!(?flag, rounds, "layout did not converge; dropping flags");
                        for &e in &self.scratch {
                            pass.invalid.clear(e, flag);
                        }
                        break;
                    }
                    self.scratch
                        .sort_by_cached_key(|&e| pass.elements.depth(e));
                    for &e in &self.scratch {
                        if !pass.invalid.take(e, flag) {
                            continue;
                        }
                        if !pass.elements.contains(e) {
                            pass.invalid.remove_key(e);
                            continue;
                        }
                        match flag {
                            DirtyFlags::TEXT => pass.measure_text(e),
                            DirtyFlags::WIDTH => pass.resolve_size(e, Axis::X),
                            DirtyFlags::HEIGHT => pass.resolve_size(e, Axis::Y),
                            _ => pass.resolve_position(e),
                        }
                    }
                }
            }
        }
        tracing::trace!(rounds, "layout passes drained");
        post_process(pass.elements, root, viewport)
    }
}

struct Pass<'a> {
    elements: &'a mut Elements,
    invalid: &'a mut InvalidList<ElementId>,
    root: ElementId,
    viewport: Size,
    fonts: &'a dyn FontMetrics,
}

impl Pass<'_> {
    fn frame_of(&self, element: ElementId) -> ParentFrame {
        let Some(parent) = self.elements.parent(element) else {
            return ParentFrame::viewport(self.viewport);
        };
        let Some(p) = self.elements.get(parent) else {
            return ParentFrame::viewport(self.viewport);
        };
        let l = &p.layout;
        ParentFrame {
            inner: [l.inner(Axis::X), l.inner(Axis::Y)],
            outer: l.size,
            origin: [l.origin(Axis::X), l.origin(Axis::Y)],
            flex: [
                p.style.flag(AttributeId::FLEX_CHILD_WIDTH, false),
                p.style.flag(AttributeId::FLEX_CHILD_HEIGHT, false),
            ],
            plane: Axis::of_plane(p.style.child_plane()),
            share: l.share,
        }
    }

    /// Marks every following sibling up to and including the next one in
    /// flow; their flow positions chain off this element.
    fn mark_following(&mut self, element: ElementId) {
        let mut cur = self.elements.next_sibling(element);
        while let Some(s) = cur {
            self.invalid.mark(s, DirtyFlags::POSITION);
            if self.elements.get(s).is_some_and(|e| in_flow(&e.style)) {
                break;
            }
            cur = self.elements.next_sibling(s);
        }
    }

    fn measure_text(&mut self, element: ElementId) {
        let Some(e) = self.elements.get(element) else {
            return;
        };
        let size = match e.text.as_deref() {
            Some(text) if !text.is_empty() => {
                self.fonts.measure(text, &FontSpec::from_style(&e.style))
            }
            _ => Size::ZERO,
        };
        let Some(e) = self.elements.get_mut(element) else {
            return;
        };
        let text = [size.width, size.height];
        if differs(e.layout.text[0], text[0]) || differs(e.layout.text[1], text[1]) {
            e.layout.text = text;
            self.invalid.mark(element, DirtyFlags::SIZE);
        }
    }

    fn resolve_size(&mut self, element: ElementId, axis: Axis) {
        let i = axis.index();
        let is_root = element == self.root;
        let frame = self.frame_of(element);
        let Some(e) = self.elements.get(element) else {
            return;
        };
        let style = &e.style;
        let base = frame.inner[i];

        let margin = if is_root {
            [0.0; 2]
        } else {
            axis.margin().map(|a| style.length(a).resolve(base))
        };
        let padding = axis.padding().map(|a| style.length(a).resolve(base));
        let border = axis.border().map(|a| style.length(a).resolve(0.0));
        let edge = padding[0] + padding[1] + border[0] + border[1];

        let plane = Axis::of_plane(style.child_plane());
        let flex = style.flag(axis.flex(), false);
        let mut extent = 0.0_f64;
        let mut fixed = 0.0_f64;
        let mut flexible = 0_u32;
        for c in self.elements.children(element) {
            let Some(child) = self.elements.get(c) else {
                continue;
            };
            if !in_flow(&child.style) {
                continue;
            }
            let outer = child.layout.outer(axis);
            if flex && child.style.size(axis.size()).is_auto() {
                flexible += 1;
                fixed += child.layout.margin[i][0] + child.layout.margin[i][1];
                continue;
            }
            fixed += outer;
            if depends_on_parent(&child.style, axis, flex) {
                continue;
            }
            if axis == plane {
                extent += outer;
            } else {
                extent = extent.max(outer);
            }
        }

        let reference = match style.relative_mode(axis.mode()) {
            RelativeMode::Inner => frame.inner[i],
            RelativeMode::Outer => frame.outer[i],
        };
        let mut size = if is_root {
            axis.extent(self.viewport)
        } else {
            match style.size(axis.size()).length() {
                Some(l) => l.resolve(reference),
                None => {
                    let [start, end] = offsets(style, axis, base);
                    if in_flow(style) && frame.flex[i] {
                        if frame.plane == axis {
                            frame.share[i]
                        } else {
                            base - margin[0] - margin[1]
                        }
                    } else if style.positioning() == Positioning::Absolute
                        && let (Some(start), Some(end)) = (start, end)
                    {
                        base - start - end - margin[0] - margin[1]
                    } else {
                        extent.max(e.layout.text[i]) + edge
                    }
                }
            }
        };
        if !is_root {
            if let Some(max) = style.limit(axis.max()) {
                size = size.min(max.resolve(reference));
            }
            size = size.max(style.length(axis.min()).resolve(reference));
        }
        let size = size.max(0.0);

        let inner = (size - edge).max(0.0);
        let share = if flex && plane == axis && flexible > 0 {
            ((inner - fixed) / f64::from(flexible)).max(0.0)
        } else {
            0.0
        };

        let Some(e) = self.elements.get_mut(element) else {
            return;
        };
        let l = &mut e.layout;
        let outer_changed = differs(l.size[i], size)
            || differs(l.margin[i][0], margin[0])
            || differs(l.margin[i][1], margin[1]);
        let inner_changed = differs(l.size[i] - l.edge(axis), size - edge)
            || differs(l.origin(axis), padding[0] + border[0])
            || differs(l.share[i], share);
        l.size[i] = size;
        l.margin[i] = margin;
        l.padding[i] = padding;
        l.border[i] = border;
        l.children[i] = extent;
        l.share[i] = share;

        if outer_changed {
            if let Some(parent) = self.elements.parent(element) {
                self.invalid.mark(parent, axis.flag());
            }
            self.invalid.mark(element, DirtyFlags::POSITION);
            self.mark_following(element);
        }
        if inner_changed {
            let children = self.elements.child_ids(element);
            for c in children {
                self.invalid.mark(c, axis.flag() | DirtyFlags::POSITION);
            }
        }
    }

    /// The nearest preceding sibling in flow.
    fn provoking_sibling(&self, element: ElementId) -> Option<ElementId> {
        let mut cur = self.elements.prev_sibling(element);
        while let Some(s) = cur {
            if self.elements.get(s).is_some_and(|e| in_flow(&e.style)) {
                return Some(s);
            }
            cur = self.elements.prev_sibling(s);
        }
        None
    }

    fn resolve_position(&mut self, element: ElementId) {
        let (pos, flow) = if element == self.root {
            ([0.0; 2], [0.0; 2])
        } else {
            let Some(computed) = self.compute_position(element) else {
                return;
            };
            computed
        };
        let Some(e) = self.elements.get_mut(element) else {
            return;
        };
        let l = &mut e.layout;
        let flow_changed = differs(l.flow[0], flow[0]) || differs(l.flow[1], flow[1]);
        l.pos = pos;
        l.flow = flow;
        if flow_changed {
            self.mark_following(element);
        }
    }

    fn compute_position(&self, element: ElementId) -> Option<([f64; 2], [f64; 2])> {
        let frame = self.frame_of(element);
        let e = self.elements.get(element)?;
        let style = &e.style;
        let l = &e.layout;

        let anchored = |axis: Axis| {
            let i = axis.index();
            let [start, end] = offsets(style, axis, frame.inner[i]);
            let from_end = |end: f64| frame.origin[i] + frame.inner[i] - end - l.size[i] - l.margin[i][1];
            match (start, end) {
                (Some(_), Some(end)) if l.priority[i] => Some(from_end(end)),
                (Some(start), _) => Some(frame.origin[i] + l.margin[i][0] + start),
                (None, Some(end)) => Some(from_end(end)),
                (None, None) => None,
            }
        };

        let positioning = style.positioning();
        if positioning == Positioning::Absolute {
            let pos = Axis::BOTH.map(|axis| {
                anchored(axis)
                    .unwrap_or_else(|| frame.origin[axis.index()] + l.margin[axis.index()][0])
            });
            return Some((pos, pos));
        }

        let along = frame.plane;
        let across = along.cross();
        let mut flow = [0.0; 2];
        let p = along.index();
        flow[p] = match self.provoking_sibling(element).and_then(|s| self.elements.get(s)) {
            Some(prev) => {
                let pl = &prev.layout;
                pl.flow[p] + pl.size[p] + pl.margin[p][1] + l.margin[p][0]
            }
            None => frame.origin[p] + l.margin[p][0],
        };
        let q = across.index();
        let factor = match across {
            Axis::X => match style.horizontal_align() {
                HorizontalAlign::Left => 0.0,
                HorizontalAlign::Center => 0.5,
                HorizontalAlign::Right => 1.0,
            },
            Axis::Y => match style.vertical_align() {
                VerticalAlign::Top => 0.0,
                VerticalAlign::Center => 0.5,
                VerticalAlign::Bottom => 1.0,
            },
        };
        let free = frame.inner[q] - l.outer(across);
        flow[q] = frame.origin[q] + l.margin[q][0] + free * factor;

        let mut pos = flow;
        if positioning == Positioning::Relative {
            for axis in Axis::BOTH {
                let i = axis.index();
                let [start, end] = offsets(style, axis, frame.inner[i]);
                match (start, end) {
                    (Some(_), Some(end)) if l.priority[i] => pos[i] -= end,
                    (Some(start), _) => pos[i] += start,
                    (None, Some(end)) => pos[i] -= end,
                    (None, None) => {}
                }
            }
        }
        Some((pos, flow))
    }
}

/// Recomputes absolute coordinates and clip rectangles for the whole tree.
///
/// Every element is clipped to its parent's inner clip rectangle. The clip
/// flag is only raised where the parent hides overflow.
fn post_process(elements: &mut Elements, root: ElementId, viewport: Size) -> Vec<ElementId> {
    let screen = Rect::from_origin_size(Point::ORIGIN, viewport);
    let mut changed = Vec::new();
    let mut stack = vec![(root, Point::ORIGIN, screen, screen, false)];
    while let Some((id, parent_origin, clip, parent_inner, parent_hides)) = stack.pop() {
        let children = elements.child_ids(id);
        let Some(e) = elements.get_mut(id) else {
            continue;
        };
        let hides = e.style.overflow() == Overflow::Hidden;
        let l = &mut e.layout;
        let absolute = parent_origin + Vec2::new(l.pos[0], l.pos[1]);
        let rect = Rect::from_origin_size(absolute, l.size());
        let inner = deflate(rect, l.frame());
        let clipping_rect = rect.intersect(clip);
        let clipping_rect_inner = inner.intersect(clipping_rect);
        let clipped = parent_hides && !contains(parent_inner, rect);

        if rect_differs(l.absolute_rect(), rect)
            || rect_differs(l.clipping_rect, clipping_rect)
            || rect_differs(l.clipping_rect_inner, clipping_rect_inner)
            || l.clipped != clipped
        {
            changed.push(id);
        }
        l.absolute = absolute;
        l.clipping_rect = clipping_rect;
        l.clipping_rect_inner = clipping_rect_inner;
        l.clipped = clipped;

        for c in children.into_iter().rev() {
            stack.push((c, absolute, clipping_rect_inner, inner, hides));
        }
    }
    changed
}
