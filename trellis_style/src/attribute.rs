// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The attribute catalogue.
//!
//! Every primitive attribute is one row of [`ATTRIBUTES`]: its script name,
//! value domain, default, whether it inherits from the parent element when
//! nothing sets it, and which layout or render state a change touches.
//! [`AttributeId`] indexes that table.

use bitflags::bitflags;
use core::fmt;

use crate::value::ValueKind;

bitflags! {
    /// What must be recomputed when an attribute's resolved value changes.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ChangeEffect: u16 {
        /// The element's width pass.
        const WIDTH = 1 << 0;
        /// The element's height pass.
        const HEIGHT = 1 << 1;
        /// The element's position pass.
        const POSITION = 1 << 2;
        /// Text shaping and measurement.
        const TEXT = 1 << 3;
        /// Render data only.
        const MESH = 1 << 4;
        /// Width, height, and position of every child.
        const CHILDREN = 1 << 5;
        /// Stacking bucket membership.
        const Z_INDEX = 1 << 6;
        /// Visibility, which removes the element from flow.
        const VISIBILITY = 1 << 7;
        /// Enabled state of the subtree.
        const ENABLED = 1 << 8;
    }
}

/// Identifies one primitive attribute; an index into [`ATTRIBUTES`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeId(u8);

impl AttributeId {
    /// Returns the table index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the id for a table index, if in range.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        if index < ATTRIBUTE_COUNT {
            u8::try_from(index).ok().map(Self)
        } else {
            None
        }
    }

    /// Returns this attribute's table row.
    #[inline]
    #[must_use]
    pub fn info(self) -> &'static AttributeInfo {
        &ATTRIBUTES[self.index()]
    }

    /// Returns the script name.
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Iterates every attribute in table order.
    pub fn all() -> impl Iterator<Item = Self> + Clone {
        (0..ATTRIBUTE_COUNT).filter_map(Self::from_index)
    }
}

impl fmt::Debug for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttributeId({})", self.name())
    }
}

/// One row of the attribute table.
#[derive(Clone, Debug)]
pub struct AttributeInfo {
    /// Name used in scripts and by the string API.
    pub name: &'static str,
    /// Value domain.
    pub kind: ValueKind,
    /// Default value text, used by the built-in `default` and `root` classes.
    pub default: &'static str,
    /// Whether the built-in `default` class marks this attribute `inherit`.
    pub inherits: bool,
    /// What a change to the resolved value invalidates.
    pub effect: ChangeEffect,
}

macro_rules! attributes {
    ($($id:ident = $index:literal => $name:literal, $kind:expr, $default:literal, $inherits:literal, $effect:expr;)+) => {
        impl AttributeId {
            $(
                #[doc = concat!("`", $name, "`")]
                pub const $id: Self = Self($index);
            )+
        }

        /// Number of primitive attributes.
        pub const ATTRIBUTE_COUNT: usize = [$($index),+].len();

        /// The attribute table, indexed by [`AttributeId::index`].
        pub static ATTRIBUTES: [AttributeInfo; ATTRIBUTE_COUNT] = [
            $(AttributeInfo {
                name: $name,
                kind: $kind,
                default: $default,
                inherits: $inherits,
                effect: $effect,
            },)+
        ];
    };
}

const WIDTH: ChangeEffect = ChangeEffect::WIDTH;
const HEIGHT: ChangeEffect = ChangeEffect::HEIGHT;
const POSITION: ChangeEffect = ChangeEffect::POSITION;
const MESH: ChangeEffect = ChangeEffect::MESH;
const TEXT: ChangeEffect = ChangeEffect::TEXT.union(ChangeEffect::MESH);
const BORDER_H: ChangeEffect = ChangeEffect::WIDTH.union(ChangeEffect::MESH);
const BORDER_V: ChangeEffect = ChangeEffect::HEIGHT.union(ChangeEffect::MESH);
const LAYOUT: ChangeEffect = ChangeEffect::WIDTH
    .union(ChangeEffect::HEIGHT)
    .union(ChangeEffect::POSITION);
const CHILDREN: ChangeEffect = LAYOUT.union(ChangeEffect::CHILDREN);

attributes! {
    WIDTH = 0 => "width", ValueKind::Size, "auto", false, WIDTH;
    HEIGHT = 1 => "height", ValueKind::Size, "auto", false, HEIGHT;
    MIN_WIDTH = 2 => "min-width", ValueKind::Length, "0px", false, WIDTH;
    MIN_HEIGHT = 3 => "min-height", ValueKind::Length, "0px", false, HEIGHT;
    MAX_WIDTH = 4 => "max-width", ValueKind::Limit, "none", false, WIDTH;
    MAX_HEIGHT = 5 => "max-height", ValueKind::Limit, "none", false, HEIGHT;
    RELATIVE_WIDTH_MODE = 6 => "relative-width-mode", ValueKind::RelativeMode, "inner", false, WIDTH;
    RELATIVE_HEIGHT_MODE = 7 => "relative-height-mode", ValueKind::RelativeMode, "inner", false, HEIGHT;
    FLEX_CHILD_WIDTH = 8 => "flex-child-width", ValueKind::Bool, "false", false, CHILDREN;
    FLEX_CHILD_HEIGHT = 9 => "flex-child-height", ValueKind::Bool, "false", false, CHILDREN;
    MARGIN_LEFT = 10 => "margin-left", ValueKind::Length, "0px", false, WIDTH;
    MARGIN_RIGHT = 11 => "margin-right", ValueKind::Length, "0px", false, WIDTH;
    MARGIN_TOP = 12 => "margin-top", ValueKind::Length, "0px", false, HEIGHT;
    MARGIN_BOTTOM = 13 => "margin-bottom", ValueKind::Length, "0px", false, HEIGHT;
    PADDING_LEFT = 14 => "padding-left", ValueKind::Length, "0px", false, WIDTH;
    PADDING_RIGHT = 15 => "padding-right", ValueKind::Length, "0px", false, WIDTH;
    PADDING_TOP = 16 => "padding-top", ValueKind::Length, "0px", false, HEIGHT;
    PADDING_BOTTOM = 17 => "padding-bottom", ValueKind::Length, "0px", false, HEIGHT;
    BORDER_LEFT_WIDTH = 18 => "border-left-width", ValueKind::Pixels, "0px", false, BORDER_H;
    BORDER_RIGHT_WIDTH = 19 => "border-right-width", ValueKind::Pixels, "0px", false, BORDER_H;
    BORDER_TOP_WIDTH = 20 => "border-top-width", ValueKind::Pixels, "0px", false, BORDER_V;
    BORDER_BOTTOM_WIDTH = 21 => "border-bottom-width", ValueKind::Pixels, "0px", false, BORDER_V;
    BORDER_LEFT_COLOR = 22 => "border-left-color", ValueKind::Color, "transparent", false, MESH;
    BORDER_RIGHT_COLOR = 23 => "border-right-color", ValueKind::Color, "transparent", false, MESH;
    BORDER_TOP_COLOR = 24 => "border-top-color", ValueKind::Color, "transparent", false, MESH;
    BORDER_BOTTOM_COLOR = 25 => "border-bottom-color", ValueKind::Color, "transparent", false, MESH;
    POSITIONING = 26 => "positioning", ValueKind::Positioning, "auto", false, LAYOUT;
    LEFT = 27 => "left", ValueKind::Offset, "auto", false, POSITION;
    RIGHT = 28 => "right", ValueKind::Offset, "auto", false, POSITION;
    TOP = 29 => "top", ValueKind::Offset, "auto", false, POSITION;
    BOTTOM = 30 => "bottom", ValueKind::Offset, "auto", false, POSITION;
    CHILD_PLANE = 31 => "child-plane", ValueKind::Plane, "vertical", false, CHILDREN;
    HORIZONTAL_ALIGN = 32 => "horizontal-align", ValueKind::HorizontalAlign, "left", false, POSITION;
    VERTICAL_ALIGN = 33 => "vertical-align", ValueKind::VerticalAlign, "top", false, POSITION;
    Z_INDEX = 34 => "z-index", ValueKind::ZIndex, "auto", false, ChangeEffect::Z_INDEX;
    VISIBLE = 35 => "visible", ValueKind::Bool, "true", false, ChangeEffect::VISIBILITY.union(LAYOUT).union(MESH);
    OVERFLOW = 36 => "overflow", ValueKind::Overflow, "visible", false, POSITION.union(MESH);
    BACKGROUND_COLOR = 37 => "background-color", ValueKind::Color, "transparent", false, MESH;
    BACKGROUND_IMAGE = 38 => "background-image", ValueKind::Image, "none", false, MESH;
    OPACITY = 39 => "opacity", ValueKind::Number { min: 0.0, max: 1.0 }, "1", false, MESH;
    COLOR = 40 => "color", ValueKind::Color, "black", true, MESH;
    FONT_FAMILY = 41 => "font-family", ValueKind::Text, "sans-serif", true, TEXT;
    FONT_SIZE = 42 => "font-size", ValueKind::FontSize, "14px", true, TEXT;
    FONT_WEIGHT = 43 => "font-weight", ValueKind::FontWeight, "400", true, TEXT;
    FONT_STYLE = 44 => "font-style", ValueKind::FontStyle, "normal", true, TEXT;
    ENABLED = 45 => "enabled", ValueKind::Bool, "true", false, ChangeEffect::ENABLED;
}

const _: () = assert!(ATTRIBUTE_COUNT <= 64, "AttributeSet is a u64 bitmask");

/// A set of attributes.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct AttributeSet(u64);

impl AttributeSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Every attribute.
    pub const ALL: Self = Self(u64::MAX >> (64 - ATTRIBUTE_COUNT));

    /// A set holding one attribute.
    #[inline]
    #[must_use]
    pub const fn single(id: AttributeId) -> Self {
        Self(1 << id.0)
    }

    /// Adds `id`. Returns `true` if it was not present.
    #[inline]
    pub fn insert(&mut self, id: AttributeId) -> bool {
        let bit = 1 << id.0;
        let added = self.0 & bit == 0;
        self.0 |= bit;
        added
    }

    /// Returns `true` if `id` is present.
    #[inline]
    #[must_use]
    pub const fn contains(self, id: AttributeId) -> bool {
        self.0 & (1 << id.0) != 0
    }

    /// Returns `true` if no attribute is present.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of attributes present.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Union of two sets.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Union of the change effects of every member.
    #[must_use]
    pub fn effects(self) -> ChangeEffect {
        self.iter()
            .fold(ChangeEffect::empty(), |acc, id| acc | id.info().effect)
    }

    /// Iterates members in table order.
    pub fn iter(self) -> impl Iterator<Item = AttributeId> + Clone {
        AttributeId::all().filter(move |&id| self.contains(id))
    }
}

impl FromIterator<AttributeId> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = AttributeId>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for id in iter {
            set.insert(id);
        }
        set
    }
}

impl fmt::Debug for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// How a compound attribute maps onto primitives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShorthandLayout {
    /// One to four values for the left, right, top, and bottom components.
    ///
    /// One value sets all four; two set horizontal then vertical; four set
    /// left, right, top, bottom in that order.
    Sides([AttributeId; 4]),
    /// `<width>? <color>?` applied to every listed side.
    Border {
        /// Width components, left/right/top/bottom.
        widths: &'static [AttributeId],
        /// Color components, matching `widths`.
        colors: &'static [AttributeId],
    },
}

/// A compound attribute such as `margin` or `border`.
#[derive(Clone, Debug)]
pub struct ShorthandInfo {
    /// Script name.
    pub name: &'static str,
    /// Component mapping.
    pub layout: ShorthandLayout,
}

impl ShorthandInfo {
    /// Returns every primitive this compound writes.
    pub fn components(&self) -> impl Iterator<Item = AttributeId> + '_ {
        let (a, b): (&[AttributeId], &[AttributeId]) = match &self.layout {
            ShorthandLayout::Sides(sides) => (sides, &[]),
            ShorthandLayout::Border { widths, colors } => (widths, colors),
        };
        a.iter().chain(b).copied()
    }
}

const ALL_WIDTHS: &[AttributeId] = &[
    AttributeId::BORDER_LEFT_WIDTH,
    AttributeId::BORDER_RIGHT_WIDTH,
    AttributeId::BORDER_TOP_WIDTH,
    AttributeId::BORDER_BOTTOM_WIDTH,
];
const ALL_COLORS: &[AttributeId] = &[
    AttributeId::BORDER_LEFT_COLOR,
    AttributeId::BORDER_RIGHT_COLOR,
    AttributeId::BORDER_TOP_COLOR,
    AttributeId::BORDER_BOTTOM_COLOR,
];

/// The compound attribute table.
pub static SHORTHANDS: [ShorthandInfo; 9] = [
    ShorthandInfo {
        name: "margin",
        layout: ShorthandLayout::Sides([
            AttributeId::MARGIN_LEFT,
            AttributeId::MARGIN_RIGHT,
            AttributeId::MARGIN_TOP,
            AttributeId::MARGIN_BOTTOM,
        ]),
    },
    ShorthandInfo {
        name: "padding",
        layout: ShorthandLayout::Sides([
            AttributeId::PADDING_LEFT,
            AttributeId::PADDING_RIGHT,
            AttributeId::PADDING_TOP,
            AttributeId::PADDING_BOTTOM,
        ]),
    },
    ShorthandInfo {
        name: "border-width",
        layout: ShorthandLayout::Sides([
            AttributeId::BORDER_LEFT_WIDTH,
            AttributeId::BORDER_RIGHT_WIDTH,
            AttributeId::BORDER_TOP_WIDTH,
            AttributeId::BORDER_BOTTOM_WIDTH,
        ]),
    },
    ShorthandInfo {
        name: "border-color",
        layout: ShorthandLayout::Sides([
            AttributeId::BORDER_LEFT_COLOR,
            AttributeId::BORDER_RIGHT_COLOR,
            AttributeId::BORDER_TOP_COLOR,
            AttributeId::BORDER_BOTTOM_COLOR,
        ]),
    },
    ShorthandInfo {
        name: "border",
        layout: ShorthandLayout::Border {
            widths: ALL_WIDTHS,
            colors: ALL_COLORS,
        },
    },
    ShorthandInfo {
        name: "border-left",
        layout: ShorthandLayout::Border {
            widths: &[AttributeId::BORDER_LEFT_WIDTH],
            colors: &[AttributeId::BORDER_LEFT_COLOR],
        },
    },
    ShorthandInfo {
        name: "border-right",
        layout: ShorthandLayout::Border {
            widths: &[AttributeId::BORDER_RIGHT_WIDTH],
            colors: &[AttributeId::BORDER_RIGHT_COLOR],
        },
    },
    ShorthandInfo {
        name: "border-top",
        layout: ShorthandLayout::Border {
            widths: &[AttributeId::BORDER_TOP_WIDTH],
            colors: &[AttributeId::BORDER_TOP_COLOR],
        },
    },
    ShorthandInfo {
        name: "border-bottom",
        layout: ShorthandLayout::Border {
            widths: &[AttributeId::BORDER_BOTTOM_WIDTH],
            colors: &[AttributeId::BORDER_BOTTOM_COLOR],
        },
    },
];

/// Result of looking up an attribute name.
#[derive(Copy, Clone, Debug)]
pub enum AttributeName {
    /// A primitive attribute.
    Primitive(AttributeId),
    /// A compound attribute.
    Shorthand(&'static ShorthandInfo),
}

/// Looks up a primitive or compound attribute by script name.
#[must_use]
pub fn lookup(name: &str) -> Option<AttributeName> {
    if let Some(info) = SHORTHANDS.iter().find(|s| s.name == name) {
        return Some(AttributeName::Shorthand(info));
    }
    ATTRIBUTES
        .iter()
        .position(|info| info.name == name)
        .and_then(AttributeId::from_index)
        .map(AttributeName::Primitive)
}
