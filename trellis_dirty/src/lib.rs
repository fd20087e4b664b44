// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Dirty: dirty flags and the invalidation list.
//!
//! Incremental layout keeps one global list of elements whose geometry is
//! stale. Each member carries a [`DirtyFlags`] value saying *what* is stale
//! (width, height, position, text). Membership is intrusive: every key owns a
//! fixed link slot (addressed through [`SlotKey`]), so inserting and removing
//! a key is O(1) and never scans the list.
//!
//! ## Quick Start
//!
//! ```rust
//! use trellis_dirty::{DirtyFlags, InvalidList};
//!
//! let mut invalid = InvalidList::<u32>::new();
//!
//! invalid.mark(3, DirtyFlags::WIDTH);
//! invalid.mark(1, DirtyFlags::POSITION);
//! invalid.mark(3, DirtyFlags::HEIGHT);
//!
//! // Members keep insertion order; flags accumulate.
//! assert_eq!(invalid.iter().collect::<Vec<_>>(), [3, 1]);
//! assert_eq!(invalid.flags(3), DirtyFlags::WIDTH | DirtyFlags::HEIGHT);
//!
//! // Clearing the last flag unlinks the key.
//! assert!(invalid.take(1, DirtyFlags::POSITION));
//! assert!(!invalid.contains(1));
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod flags;
mod list;

pub use flags::DirtyFlags;
pub use list::{InvalidList, SlotKey};
