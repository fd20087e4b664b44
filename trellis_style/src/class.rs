// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style classes and their attribute slots.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use bitflags::bitflags;
use core::fmt;

use trellis_handle::{Handle, RawHandle};

use crate::attribute::AttributeId;
use crate::value::StyleValue;

/// Handle to a [`StyleClass`] owned by a [`StyleServer`](crate::StyleServer).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(RawHandle);

impl Handle for ClassId {
    #[inline]
    fn from_raw(raw: RawHandle) -> Self {
        Self(raw)
    }

    #[inline]
    fn to_raw(self) -> RawHandle {
        self.0
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({}v{})", self.0.index(), self.0.generation())
    }
}

/// An interaction state that can carry its own modifier sub-class.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StateModifier {
    /// Pointer is over the element.
    Hovered,
    /// Pointer button is held on the element.
    Pushed,
    /// Element has keyboard focus.
    Focused,
    /// Element is disabled.
    Disabled,
}

impl StateModifier {
    /// All modifiers, lowest priority first.
    pub const ALL: [Self; 4] = [Self::Hovered, Self::Pushed, Self::Focused, Self::Disabled];

    /// Index into per-class modifier arrays.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Name used after `:` in scripts.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hovered => "hovered",
            Self::Pushed => "pushed",
            Self::Focused => "focused",
            Self::Disabled => "disabled",
        }
    }

    /// Parses a modifier name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// The state flag that activates this modifier.
    #[must_use]
    pub const fn state(self) -> ElementStates {
        match self {
            Self::Hovered => ElementStates::HOVERED,
            Self::Pushed => ElementStates::PUSHED,
            Self::Focused => ElementStates::FOCUSED,
            Self::Disabled => ElementStates::DISABLED,
        }
    }
}

bitflags! {
    /// Interaction states of an element; each active state activates the
    /// matching modifier of every attached class.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ElementStates: u8 {
        /// See [`StateModifier::Hovered`].
        const HOVERED = 1 << 0;
        /// See [`StateModifier::Pushed`].
        const PUSHED = 1 << 1;
        /// See [`StateModifier::Focused`].
        const FOCUSED = 1 << 2;
        /// See [`StateModifier::Disabled`].
        const DISABLED = 1 << 3;
    }
}

/// A declared slot value, as written by a script or the string API.
#[derive(Clone, Debug, PartialEq)]
pub enum Declaration {
    /// Take the parent element's resolved value.
    Inherit,
    /// A concrete value.
    Value(StyleValue),
}

/// One attribute slot of a class.
///
/// An unset slot keeps the attribute's default in `value` but never takes
/// part in resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleAttribute {
    value: StyleValue,
    is_set: bool,
    inherit: bool,
}

impl StyleAttribute {
    /// An unset slot holding `default`.
    #[must_use]
    pub fn unset(default: StyleValue) -> Self {
        Self {
            value: default,
            is_set: false,
            inherit: false,
        }
    }

    /// A set slot with a concrete value.
    #[must_use]
    pub fn with_value(value: StyleValue) -> Self {
        Self {
            value,
            is_set: true,
            inherit: false,
        }
    }

    /// Whether this slot participates in resolution.
    #[inline]
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.is_set
    }

    /// Whether this slot defers to the parent element.
    #[inline]
    #[must_use]
    pub fn is_inherit(&self) -> bool {
        self.is_set && self.inherit
    }

    /// The concrete value. Meaningless for inherit slots.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &StyleValue {
        &self.value
    }

    /// The declaration, or `None` when unset.
    #[must_use]
    pub fn declaration(&self) -> Option<Declaration> {
        if !self.is_set {
            None
        } else if self.inherit {
            Some(Declaration::Inherit)
        } else {
            Some(Declaration::Value(self.value.clone()))
        }
    }

    /// Applies a declaration. Returns `true` if the slot changed.
    pub fn declare(&mut self, declaration: Declaration) -> bool {
        let before = (self.is_set, self.inherit);
        match declaration {
            Declaration::Inherit => {
                self.is_set = true;
                self.inherit = true;
                before != (true, true)
            }
            Declaration::Value(value) => {
                let changed = before != (true, false) || self.value != value;
                self.value = value;
                self.is_set = true;
                self.inherit = false;
                changed
            }
        }
    }

    /// Unsets the slot, resetting its value to `default`. Returns `true` if
    /// the slot was set.
    pub fn clear(&mut self, default: StyleValue) -> bool {
        let was_set = self.is_set;
        self.value = default;
        self.is_set = false;
        self.inherit = false;
        was_set
    }
}

/// Whether a class is a named class or a state modifier of one.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClassKind {
    /// A named class.
    Normal,
    /// A modifier active while `owner`'s element is in `state`.
    Modifier {
        /// The named class this modifier belongs to.
        owner: ClassId,
        /// The activating state.
        state: StateModifier,
    },
}

/// A named collection of attribute slots.
#[derive(Clone, Debug)]
pub struct StyleClass {
    pub(crate) name: String,
    pub(crate) kind: ClassKind,
    pub(crate) attributes: Box<[StyleAttribute]>,
    pub(crate) includes: Vec<String>,
    pub(crate) modifiers: [Option<ClassId>; 4],
    pub(crate) programmatic: bool,
    pub(crate) builtin: bool,
}

impl StyleClass {
    pub(crate) fn new(name: String, kind: ClassKind, defaults: &[StyleValue]) -> Self {
        Self {
            name,
            kind,
            attributes: defaults.iter().cloned().map(StyleAttribute::unset).collect(),
            includes: Vec::new(),
            modifiers: [None; 4],
            programmatic: false,
            builtin: false,
        }
    }

    /// The class name. Modifiers share their owner's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normal class or modifier.
    #[must_use]
    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    /// The slot for `attribute`.
    #[inline]
    #[must_use]
    pub fn attribute(&self, attribute: AttributeId) -> &StyleAttribute {
        &self.attributes[attribute.index()]
    }

    /// Iterates the slots that are set.
    pub fn set_attributes(&self) -> impl Iterator<Item = (AttributeId, &StyleAttribute)> + '_ {
        AttributeId::all()
            .map(|id| (id, &self.attributes[id.index()]))
            .filter(|(_, slot)| slot.is_set())
    }

    /// Names of included classes, lowest priority first.
    #[must_use]
    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    /// The modifier sub-class for `state`, if one exists.
    #[must_use]
    pub fn modifier(&self, state: StateModifier) -> Option<ClassId> {
        self.modifiers[state.index()]
    }

    /// Whether the class was created by the string API rather than a script.
    #[must_use]
    pub fn is_programmatic(&self) -> bool {
        self.programmatic
    }

    /// Whether the class is one of the server's built-in classes.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        self.builtin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Size;

    #[test]
    fn declare_reports_changes() {
        let mut slot = StyleAttribute::unset(StyleValue::Size(Size::Auto));
        assert!(!slot.is_set());
        assert!(slot.declare(Declaration::Value(StyleValue::Size(Size::Px(4.0)))));
        assert!(!slot.declare(Declaration::Value(StyleValue::Size(Size::Px(4.0)))));
        assert!(slot.declare(Declaration::Inherit));
        assert!(slot.is_inherit());
        assert!(!slot.declare(Declaration::Inherit));
        assert!(slot.clear(StyleValue::Size(Size::Auto)));
        assert!(!slot.clear(StyleValue::Size(Size::Auto)));
        assert_eq!(slot.declaration(), None);
    }

    #[test]
    fn modifiers_map_to_states() {
        for m in StateModifier::ALL {
            assert_eq!(StateModifier::parse(m.name()), Some(m));
            assert_eq!(m.state().bits(), 1 << m.index());
        }
        assert_eq!(StateModifier::parse("active"), None);
    }
}
