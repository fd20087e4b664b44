// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-element cascade resolution.

use alloc::vec::Vec;
use hashbrown::HashSet;
use smallvec::SmallVec;

use crate::attribute::{ATTRIBUTE_COUNT, AttributeId, AttributeSet};
use crate::class::{ClassId, ElementStates, StateModifier};
use crate::server::StyleServer;
use crate::value::{
    Color, FontStyle, HorizontalAlign, Length, Overflow, Plane, Positioning, RelativeMode, Size,
    StyleValue, VerticalAlign,
};

/// Where a resolved attribute comes from.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// No hosted class sets the attribute.
    #[default]
    Unresolved,
    /// A class in this stack sets a concrete value.
    Local(ClassId),
    /// The winning class says `inherit`; the value is the parent element's,
    /// held by this class.
    Inherited(ClassId),
}

impl Resolution {
    /// The class whose slot holds the value.
    #[inline]
    #[must_use]
    pub fn source(self) -> Option<ClassId> {
        match self {
            Self::Unresolved => None,
            Self::Local(c) | Self::Inherited(c) => Some(c),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Resolved {
    resolution: Resolution,
    value: Option<StyleValue>,
}

/// What a refresh changed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Refreshed {
    /// Attributes now resolved from a different slot.
    pub identity: AttributeSet,
    /// Attributes whose resolved value differs.
    pub value: AttributeSet,
}

impl Refreshed {
    /// Attributes that changed in either way; children must be refreshed
    /// for these.
    #[must_use]
    pub fn any(&self) -> AttributeSet {
        self.identity.union(self.value)
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.any().is_empty()
    }
}

/// The classes controlling one element and the resolved view of them.
///
/// Explicitly attached classes are kept in attach order. Resolution walks
/// the *expanded* list, which splices each class's includes in below it and
/// its active state modifiers above it, from the top: the first class with
/// the attribute set wins. A winning `inherit` slot takes the parent stack's
/// resolution; at the root, `inherit` slots are skipped.
///
/// Resolved values are snapshots, so a stack must be refreshed whenever a
/// hosted class slot changes. A new stack allocates nothing until its first
/// refresh.
#[derive(Clone, Debug)]
pub struct StyleStack {
    attached: SmallVec<[ClassId; 4]>,
    expanded: SmallVec<[ClassId; 8]>,
    states: ElementStates,
    resolved: Vec<Resolved>,
}

impl Default for StyleStack {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleStack {
    /// Creates an empty stack with every attribute unresolved.
    #[must_use]
    pub fn new() -> Self {
        Self {
            attached: SmallVec::new(),
            expanded: SmallVec::new(),
            states: ElementStates::empty(),
            resolved: Vec::new(),
        }
    }

    /// Attaches `class` on top. Returns `false` if it was already attached.
    ///
    /// Call [`StyleStack::expand`] and a refresh afterwards.
    pub fn attach(&mut self, class: ClassId) -> bool {
        if self.attached.contains(&class) {
            return false;
        }
        self.attached.push(class);
        true
    }

    /// Detaches `class`. Returns `false` if it was not attached.
    pub fn detach(&mut self, class: ClassId) -> bool {
        let Some(i) = self.attached.iter().position(|&c| c == class) else {
            return false;
        };
        self.attached.remove(i);
        true
    }

    /// Explicitly attached classes, lowest priority first.
    #[must_use]
    pub fn attached(&self) -> &[ClassId] {
        &self.attached
    }

    /// The flattened priority list, lowest priority first.
    #[must_use]
    pub fn expanded(&self) -> &[ClassId] {
        &self.expanded
    }

    /// Returns `true` if `class` takes part in resolution.
    #[must_use]
    pub fn hosts(&self, class: ClassId) -> bool {
        self.expanded.contains(&class)
    }

    /// The interaction states used by the last expansion.
    #[must_use]
    pub fn states(&self) -> ElementStates {
        self.states
    }

    /// Rebuilds the expanded list for `states`. Returns `true` if it changed.
    ///
    /// Deleted classes are dropped from the attached list. Includes are
    /// resolved by name and followed transitively; a class reached twice is
    /// only spliced in at its first position, which also breaks include
    /// cycles.
    pub fn expand(&mut self, server: &StyleServer, states: ElementStates) -> bool {
        self.attached.retain(|c| server.class(*c).is_some());
        self.states = states;

        let mut expanded = SmallVec::<[ClassId; 8]>::new();
        let mut seen = HashSet::new();
        for &class in &self.attached {
            splice(server, class, states, &mut seen, &mut expanded);
        }
        if expanded == self.expanded {
            return false;
        }
        self.expanded = expanded;
        true
    }

    /// Re-resolves one attribute against `parent`'s current resolution.
    ///
    /// The parent must already be up to date.
    pub fn refresh(
        &mut self,
        attribute: AttributeId,
        server: &StyleServer,
        parent: Option<&Self>,
    ) -> Refreshed {
        let mut resolution = Resolution::Unresolved;
        for &class in self.expanded.iter().rev() {
            let Some(slot) = server.class(class).map(|c| c.attribute(attribute)) else {
                continue;
            };
            if !slot.is_set() {
                continue;
            }
            if !slot.is_inherit() {
                resolution = Resolution::Local(class);
                break;
            }
            if let Some(parent) = parent {
                resolution = match parent.resolution(attribute).source() {
                    Some(source) => Resolution::Inherited(source),
                    None => Resolution::Unresolved,
                };
                break;
            }
        }

        let value = resolution
            .source()
            .and_then(|c| server.class(c))
            .map(|c| c.attribute(attribute).value().clone());
        if self.resolved.is_empty() {
            self.resolved.resize_with(ATTRIBUTE_COUNT, Resolved::default);
        }
        let slot = &mut self.resolved[attribute.index()];
        let mut out = Refreshed::default();
        if slot.resolution.source() != resolution.source() {
            out.identity.insert(attribute);
        }
        if slot.value != value {
            out.value.insert(attribute);
        }
        slot.resolution = resolution;
        slot.value = value;
        out
    }

    /// Refreshes every attribute in `attributes`.
    pub fn refresh_set(
        &mut self,
        attributes: AttributeSet,
        server: &StyleServer,
        parent: Option<&Self>,
    ) -> Refreshed {
        let mut out = Refreshed::default();
        for attribute in attributes.iter() {
            let r = self.refresh(attribute, server, parent);
            out.identity = out.identity.union(r.identity);
            out.value = out.value.union(r.value);
        }
        out
    }

    /// Refreshes every attribute.
    pub fn refresh_all(&mut self, server: &StyleServer, parent: Option<&Self>) -> Refreshed {
        self.refresh_set(AttributeSet::ALL, server, parent)
    }

    /// Where `attribute` currently resolves from.
    #[inline]
    #[must_use]
    pub fn resolution(&self, attribute: AttributeId) -> Resolution {
        self.resolved
            .get(attribute.index())
            .map_or(Resolution::Unresolved, |r| r.resolution)
    }

    /// The resolved value, or `None` if unresolved.
    #[inline]
    #[must_use]
    pub fn value(&self, attribute: AttributeId) -> Option<&StyleValue> {
        self.resolved.get(attribute.index())?.value.as_ref()
    }

    /// A size attribute; `auto` when unresolved.
    #[must_use]
    pub fn size(&self, attribute: AttributeId) -> Size {
        match self.value(attribute) {
            Some(StyleValue::Size(s)) => *s,
            _ => Size::Auto,
        }
    }

    /// A length attribute; zero when unresolved.
    #[must_use]
    pub fn length(&self, attribute: AttributeId) -> Length {
        match self.value(attribute) {
            Some(StyleValue::Length(l)) => *l,
            _ => Length::ZERO,
        }
    }

    /// A `none`-able length attribute.
    #[must_use]
    pub fn limit(&self, attribute: AttributeId) -> Option<Length> {
        match self.value(attribute) {
            Some(StyleValue::Limit(l)) => *l,
            _ => None,
        }
    }

    /// A boolean attribute; `default` when unresolved.
    #[must_use]
    pub fn flag(&self, attribute: AttributeId, default: bool) -> bool {
        match self.value(attribute) {
            Some(StyleValue::Bool(b)) => *b,
            _ => default,
        }
    }

    /// A color attribute; transparent when unresolved.
    #[must_use]
    pub fn color(&self, attribute: AttributeId) -> Color {
        match self.value(attribute) {
            Some(StyleValue::Color(c)) => *c,
            _ => Color::TRANSPARENT,
        }
    }

    /// A numeric attribute; `default` when unresolved.
    #[must_use]
    pub fn number(&self, attribute: AttributeId, default: f64) -> f64 {
        match self.value(attribute) {
            Some(StyleValue::Number(n)) => *n,
            _ => default,
        }
    }

    /// The `positioning` mode.
    #[must_use]
    pub fn positioning(&self) -> Positioning {
        match self.value(AttributeId::POSITIONING) {
            Some(StyleValue::Positioning(p)) => *p,
            _ => Positioning::Auto,
        }
    }

    /// The plane children flow along.
    #[must_use]
    pub fn child_plane(&self) -> Plane {
        match self.value(AttributeId::CHILD_PLANE) {
            Some(StyleValue::Plane(p)) => *p,
            _ => Plane::Vertical,
        }
    }

    /// Horizontal placement inside a vertical flow.
    #[must_use]
    pub fn horizontal_align(&self) -> HorizontalAlign {
        match self.value(AttributeId::HORIZONTAL_ALIGN) {
            Some(StyleValue::HorizontalAlign(a)) => *a,
            _ => HorizontalAlign::Left,
        }
    }

    /// Vertical placement inside a horizontal flow.
    #[must_use]
    pub fn vertical_align(&self) -> VerticalAlign {
        match self.value(AttributeId::VERTICAL_ALIGN) {
            Some(StyleValue::VerticalAlign(a)) => *a,
            _ => VerticalAlign::Top,
        }
    }

    /// A `relative-*-mode` attribute.
    #[must_use]
    pub fn relative_mode(&self, attribute: AttributeId) -> RelativeMode {
        match self.value(attribute) {
            Some(StyleValue::RelativeMode(m)) => *m,
            _ => RelativeMode::Inner,
        }
    }

    /// Whether children are clipped to the inner rectangle.
    #[must_use]
    pub fn overflow(&self) -> Overflow {
        match self.value(AttributeId::OVERFLOW) {
            Some(StyleValue::Overflow(o)) => *o,
            _ => Overflow::Visible,
        }
    }

    /// The font slant.
    #[must_use]
    pub fn font_style(&self) -> FontStyle {
        match self.value(AttributeId::FONT_STYLE) {
            Some(StyleValue::FontStyle(s)) => *s,
            _ => FontStyle::Normal,
        }
    }

    /// The numeric font weight.
    #[must_use]
    pub fn font_weight(&self) -> u16 {
        match self.value(AttributeId::FONT_WEIGHT) {
            Some(StyleValue::FontWeight(w)) => *w,
            _ => 400,
        }
    }

    /// A text attribute; empty when unresolved.
    #[must_use]
    pub fn text(&self, attribute: AttributeId) -> &str {
        match self.value(attribute) {
            Some(StyleValue::Text(t)) => t.as_str(),
            _ => "",
        }
    }

    /// The background image path, if any.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        match self.value(AttributeId::BACKGROUND_IMAGE) {
            Some(StyleValue::Image(path)) => path.as_deref(),
            _ => None,
        }
    }

    /// The explicit z-index, or `None` for `auto`.
    #[must_use]
    pub fn z_index(&self) -> Option<i32> {
        match self.value(AttributeId::Z_INDEX) {
            Some(StyleValue::ZIndex(z)) => *z,
            _ => None,
        }
    }
}

fn splice(
    server: &StyleServer,
    class: ClassId,
    states: ElementStates,
    seen: &mut HashSet<ClassId>,
    out: &mut SmallVec<[ClassId; 8]>,
) {
    if !seen.insert(class) {
        return;
    }
    let Some(entry) = server.class(class) else {
        return;
    };
    for name in entry.includes() {
        if let Some(included) = server.class_id(name) {
            splice(server, included, states, seen, out);
        }
    }
    out.push(class);
    for modifier in StateModifier::ALL {
        if states.contains(modifier.state())
            && let Some(m) = entry.modifier(modifier)
        {
            out.push(m);
        }
    }
}
