// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Handle: recyclable opaque handles.
//!
//! A handle is a 32-bit value packing a 24-bit slot index (high bits) and an
//! 8-bit generation (low bits). [`HandleManager`] hands out handles, recycles
//! the slots of deleted handles, and maps each live handle to an associated
//! object.
//!
//! - Generations start at `1`, so a valid handle is never the sentinel `0`.
//! - Deleting a handle pushes its slot onto a free list; the next
//!   [`HandleManager::create_handle`] reuses it with the generation bumped by one.
//! - A slot whose generation reached `255` is retired and never recycled.
//! - When all `2^24` slots have been allocated, `create_handle` returns the
//!   null handle instead of failing loudly.
//!
//! ## Example
//!
//! ```rust
//! use trellis_handle::{HandleManager, RawHandle};
//!
//! let mut images = HandleManager::<RawHandle, &str>::new();
//!
//! let logo = images.create_handle();
//! assert!(!logo.is_null());
//! images.associate_object_with_handle(logo, "logo.png").unwrap();
//! assert_eq!(images.get_associated_object(logo), Some(&"logo.png"));
//!
//! images.delete_handle(logo);
//! assert_eq!(images.get_associated_object(logo), None);
//!
//! // The slot is recycled with the next generation.
//! let again = images.create_handle();
//! assert_eq!(again.index(), logo.index());
//! assert_eq!(again.generation(), logo.generation() + 1);
//! ```
//!
//! ## Generation checking
//!
//! By default ([`GenerationCheck::Lenient`]) a lookup does not compare the
//! handle's generation against the slot's: only "is there an object in this
//! slot" is checked. A stale handle can therefore observe an object that was
//! associated after its slot was recycled. Use [`GenerationCheck::Strict`] to
//! reject handles whose generation does not match the slot.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod handle;
mod manager;

pub use handle::{Handle, RawHandle};
pub use manager::{GenerationCheck, HandleError, HandleManager, MAX_SLOTS};
