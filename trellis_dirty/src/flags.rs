// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Which parts of an element's geometry are stale.

bitflags::bitflags! {
    /// Stale parts of an element's layout state.
    ///
    /// The layout manager resolves them in a fixed order: text first (it can
    /// change the intrinsic size), then width, height, and finally position.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DirtyFlags: u8 {
        /// Outer width must be recomputed.
        const WIDTH    = 0b0000_0001;
        /// Outer height must be recomputed.
        const HEIGHT   = 0b0000_0010;
        /// Offset within the parent must be recomputed.
        const POSITION = 0b0000_0100;
        /// Text content or font changed; intrinsic size must be re-measured.
        const TEXT     = 0b0000_1000;
    }
}

impl DirtyFlags {
    /// Both size axes.
    pub const SIZE: Self = Self::WIDTH.union(Self::HEIGHT);
}
