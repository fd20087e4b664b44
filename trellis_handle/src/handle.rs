// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Packed handle representation.

use core::fmt;

/// Number of bits used for the generation.
const GENERATION_BITS: u32 = 8;
const GENERATION_MASK: u32 = (1 << GENERATION_BITS) - 1;

/// An untyped handle: 24-bit index in the high bits, 8-bit generation in the low bits.
///
/// The all-zero value is the null handle. Valid handles always carry a
/// generation of at least `1`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RawHandle(u32);

impl RawHandle {
    /// The null handle ("no object").
    pub const NULL: Self = Self(0);

    /// Packs an index and a generation into a handle.
    ///
    /// Bits of `index` above the 24th are discarded.
    #[must_use]
    #[inline]
    pub const fn new(index: u32, generation: u8) -> Self {
        Self((index << GENERATION_BITS) | generation as u32)
    }

    /// Reinterprets a raw 32-bit value as a handle.
    #[must_use]
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the packed 32-bit value.
    #[must_use]
    #[inline]
    pub const fn to_bits(self) -> u32 {
        self.0
    }

    /// Returns the slot index.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u32 {
        self.0 >> GENERATION_BITS
    }

    /// Returns the generation.
    #[must_use]
    #[inline]
    #[expect(clippy::cast_possible_truncation, reason = "masked to 8 bits")]
    pub const fn generation(self) -> u8 {
        (self.0 & GENERATION_MASK) as u8
    }

    /// Returns `true` for the null handle.
    #[must_use]
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("RawHandle(null)");
        }
        write!(f, "RawHandle({}v{})", self.index(), self.generation())
    }
}

/// A typed handle backed by a [`RawHandle`].
///
/// Implement this for small newtypes so that handles from different managers
/// cannot be mixed up.
///
/// ```rust
/// use trellis_handle::{Handle, RawHandle};
///
/// #[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// struct TextureHandle(RawHandle);
///
/// impl Handle for TextureHandle {
///     fn from_raw(raw: RawHandle) -> Self {
///         Self(raw)
///     }
///     fn to_raw(self) -> RawHandle {
///         self.0
///     }
/// }
///
/// assert!(TextureHandle::null().is_null());
/// ```
pub trait Handle: Copy {
    /// Wraps a raw handle.
    fn from_raw(raw: RawHandle) -> Self;

    /// Returns the wrapped raw handle.
    fn to_raw(self) -> RawHandle;

    /// Returns the null handle of this type.
    #[must_use]
    fn null() -> Self {
        Self::from_raw(RawHandle::NULL)
    }

    /// Returns `true` if this is the null handle.
    fn is_null(self) -> bool {
        self.to_raw().is_null()
    }

    /// Returns the slot index of this handle.
    fn index(self) -> u32 {
        self.to_raw().index()
    }

    /// Returns the generation of this handle.
    fn generation(self) -> u8 {
        self.to_raw().generation()
    }
}

impl Handle for RawHandle {
    #[inline]
    fn from_raw(raw: RawHandle) -> Self {
        raw
    }

    #[inline]
    fn to_raw(self) -> RawHandle {
        self
    }
}
