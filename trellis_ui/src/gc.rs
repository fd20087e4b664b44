// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred destruction keyed on render epochs.
//!
//! The logic side retires objects tagged with its current epoch. The render
//! side publishes the last epoch it finished drawing. An object retired in
//! epoch `n` is dropped once the render side has finished epoch
//! `n + delay`, so a renderer still reading geometry from an older frame
//! never sees it vanish.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// The last epoch the render side finished, shared between threads.
#[derive(Clone, Debug, Default)]
pub struct RenderEpoch(Arc<AtomicU64>);

impl RenderEpoch {
    /// Creates a counter at epoch zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that rendering of `epoch` finished. Never moves backwards.
    pub fn publish(&self, epoch: u64) {
        self.0.fetch_max(epoch, Ordering::AcqRel);
    }

    /// The last finished epoch.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }
}

/// Holds retired objects until the render side has moved past them.
#[derive(Debug)]
pub struct DeferredCollector<T> {
    retired: VecDeque<(u64, T)>,
    epoch: u64,
    delay: u64,
    render: RenderEpoch,
}

impl<T> DeferredCollector<T> {
    /// Creates a collector that keeps objects for `delay` render epochs past
    /// their retirement.
    #[must_use]
    pub fn new(delay: u64) -> Self {
        Self::with_render_epoch(delay, RenderEpoch::new())
    }

    /// Creates a collector observing an existing render counter.
    #[must_use]
    pub fn with_render_epoch(delay: u64, render: RenderEpoch) -> Self {
        Self {
            retired: VecDeque::new(),
            epoch: 0,
            delay,
            render,
        }
    }

    /// The counter the render side publishes to.
    #[must_use]
    pub fn render_epoch(&self) -> &RenderEpoch {
        &self.render
    }

    /// The current logic epoch.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Starts the next logic epoch and returns it.
    pub fn advance(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    /// Queues `object` for destruction, tagged with the current epoch.
    pub fn retire(&mut self, object: T) {
        self.retired.push_back((self.epoch, object));
    }

    /// Number of objects waiting.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.retired.len()
    }

    /// Drops every object the render side has moved past. Returns how many
    /// were dropped.
    pub fn collect(&mut self) -> usize {
        let finished = self.render.current();
        let mut dropped = 0;
        // Tags are non-decreasing, so the ready objects form a prefix.
        while let Some((tag, _)) = self.retired.front() {
            if tag.saturating_add(self.delay) > finished {
                break;
            }
            self.retired.pop_front();
            dropped += 1;
        }
        if dropped > 0 {
            tracing::debug!(dropped, finished, "collected retired objects");
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn objects_outlive_the_frames_that_saw_them() {
        let mut gc = DeferredCollector::new(1);
        let tracked = Rc::new(());
        gc.advance();
        gc.retire(Rc::clone(&tracked));
        assert_eq!(gc.collect(), 0);

        gc.render_epoch().publish(1);
        assert_eq!(gc.collect(), 0);
        assert_eq!(Rc::strong_count(&tracked), 2);

        gc.render_epoch().publish(2);
        assert_eq!(gc.collect(), 1);
        assert_eq!(Rc::strong_count(&tracked), 1);
    }

    #[test]
    fn render_epoch_is_monotonic_and_shared() {
        let epoch = RenderEpoch::new();
        let render_side = epoch.clone();
        render_side.publish(5);
        render_side.publish(3);
        assert_eq!(epoch.current(), 5);
    }

    #[test]
    fn zero_delay_frees_after_the_same_epoch() {
        let mut gc = DeferredCollector::new(0);
        gc.advance();
        gc.retire("a");
        gc.retire("b");
        gc.advance();
        gc.retire("c");
        gc.render_epoch().publish(1);
        assert_eq!(gc.collect(), 2);
        assert_eq!(gc.pending(), 1);
    }
}
