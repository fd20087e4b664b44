// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Document-wide stacking buckets.

use std::collections::BTreeMap;

use crate::element::ElementId;

/// Elements with an explicit `z-index`, grouped by value across the whole
/// tree.
///
/// Such elements (and their subtrees) leave the normal parent-recursive paint
/// order. Buckets are painted in ascending order after it; within a bucket,
/// elements keep registration order.
#[derive(Clone, Debug, Default)]
pub struct ZIndexBuckets {
    buckets: BTreeMap<i32, Vec<ElementId>>,
}

impl ZIndexBuckets {
    /// Creates empty buckets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `element` from bucket `from` to bucket `to`. `None` means the
    /// normal paint order.
    pub fn update(&mut self, element: ElementId, from: Option<i32>, to: Option<i32>) {
        if from == to {
            return;
        }
        if let Some(z) = from {
            self.remove(element, z);
        }
        if let Some(z) = to {
            let bucket = self.buckets.entry(z).or_default();
            if !bucket.contains(&element) {
                bucket.push(element);
            }
        }
    }

    /// Removes `element` from bucket `z`.
    pub fn remove(&mut self, element: ElementId, z: i32) {
        if let Some(bucket) = self.buckets.get_mut(&z) {
            bucket.retain(|&e| e != element);
            if bucket.is_empty() {
                self.buckets.remove(&z);
            }
        }
    }

    /// The elements registered at `z`.
    #[must_use]
    pub fn bucket(&self, z: i32) -> &[ElementId] {
        self.buckets.get(&z).map_or(&[], Vec::as_slice)
    }

    /// Non-empty buckets in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &[ElementId])> + '_ {
        self.buckets.iter().map(|(&z, v)| (z, v.as_slice()))
    }

    /// Returns `true` if no element has an explicit z-index.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
