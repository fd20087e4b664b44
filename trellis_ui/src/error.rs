// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors from structural changes to a document.

use core::fmt;

use crate::element::ElementId;

/// A rejected structural change to the element tree. Nothing is modified
/// when this is returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeError {
    /// Another element already uses this id.
    DuplicateId(String),
    /// The handle does not name a live element.
    UnknownElement(ElementId),
    /// `child` is not a child of `parent`.
    NotAChild {
        /// The expected parent.
        parent: ElementId,
        /// The element that is not its child.
        child: ElementId,
    },
    /// The element already has a parent.
    AlreadyAttached(ElementId),
    /// The change would make an element its own ancestor.
    WouldCycle(ElementId),
    /// The root element cannot be moved or removed.
    Root,
    /// No more element handles can be allocated.
    Exhausted,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "element id `{id}` is already in use"),
            Self::UnknownElement(e) => write!(f, "{e:?} is not a live element"),
            Self::NotAChild { parent, child } => {
                write!(f, "{child:?} is not a child of {parent:?}")
            }
            Self::AlreadyAttached(e) => write!(f, "{e:?} already has a parent"),
            Self::WouldCycle(e) => write!(f, "{e:?} would become its own ancestor"),
            Self::Root => f.write_str("the root element cannot be moved or removed"),
            Self::Exhausted => f.write_str("element handle space exhausted"),
        }
    }
}

impl core::error::Error for TreeError {}
