// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Style: style classes, style scripts, and cascade resolution.
//!
//! - [`StyleServer`] owns every [`StyleClass`] and variable. Style scripts are
//!   compiled in isolation and merged on top of the scripts already loaded;
//!   unloading one restores whatever the remaining scripts say, so theme
//!   layers compose like a stack.
//! - Each attribute is a row of a static table ([`ATTRIBUTES`]) giving its
//!   value domain, default, inheritance, and [`ChangeEffect`]. Compound
//!   attributes such as `margin` and `border` expand into primitives.
//! - [`StyleStack`] is the per-element view: the classes attached to an
//!   element, their includes and active state modifiers, and the resolved
//!   value of every attribute. `inherit` takes the parent element's
//!   resolution, so parents are refreshed before children.
//!
//! ## Style scripts
//!
//! ```text
//! $accent: #3366ff;
//!
//! button {
//!     include: frame;
//!     padding: 4px 8px;          // horizontal, vertical
//!     border: 1px $accent;
//! }
//! button:hovered { background-color: $accent; }
//! ```
//!
//! Compound attributes take one value (all sides), two (horizontal then
//! vertical), or four (left, right, top, bottom).
//!
//! ## Example
//!
//! ```rust
//! use trellis_style::{AttributeId, ElementStates, ErrorStack, Size, StyleServer, StyleStack};
//!
//! let mut server = StyleServer::new();
//! let mut errors = ErrorStack::new();
//! server
//!     .load_script("theme", "panel { width: 120px; } panel:hovered { width: 140px; }", "", &mut errors)
//!     .unwrap();
//!
//! let mut stack = StyleStack::new();
//! stack.attach(server.default_class());
//! stack.attach(server.class_id("panel").unwrap());
//! stack.expand(&server, ElementStates::empty());
//! stack.refresh_all(&server, None);
//! assert_eq!(stack.size(AttributeId::WIDTH), Size::Px(120.0));
//!
//! stack.expand(&server, ElementStates::HOVERED);
//! let changed = stack.refresh_all(&server, None);
//! assert!(changed.value.contains(AttributeId::WIDTH));
//! assert_eq!(stack.size(AttributeId::WIDTH), Size::Px(140.0));
//!
//! // Unloading the script deletes the class it defined.
//! server.unload_script("theme");
//! assert!(server.class_id("panel").is_none());
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod attribute;
mod class;
mod compiler;
mod error;
mod script;
mod server;
mod shorthand;
mod stack;
mod value;

pub use attribute::{
    ATTRIBUTE_COUNT, ATTRIBUTES, AttributeId, AttributeInfo, AttributeName, AttributeSet,
    ChangeEffect, SHORTHANDS, ShorthandInfo, ShorthandLayout, lookup,
};
pub use class::{
    ClassId, ClassKind, Declaration, ElementStates, StateModifier, StyleAttribute, StyleClass,
};
pub use error::{CompileError, ErrorSink, ErrorStack, LoadError, StyleError, ValueError};
pub use server::{DEFAULT_CLASS, ROOT_CLASS, StyleChanges, StyleServer};
pub use shorthand::{Expansion, collapse, expand};
pub use stack::{Refreshed, Resolution, StyleStack};
pub use value::{
    Color, FontStyle, HorizontalAlign, Length, Overflow, Plane, Positioning, RelativeMode, Size,
    StyleValue, ValueKind, VerticalAlign,
};
