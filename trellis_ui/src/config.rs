// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Document construction options.

use kurbo::Size;
use trellis_handle::GenerationCheck;

/// Options for a [`Document`](crate::Document).
///
/// ```rust
/// use trellis_ui::DocumentConfig;
/// use trellis_handle::GenerationCheck;
///
/// let config = DocumentConfig::new()
///     .with_viewport(1280.0, 720.0)
///     .with_generation_check(GenerationCheck::Lenient)
///     .with_collect_delay(2);
/// assert_eq!(config.viewport().width, 1280.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentConfig {
    viewport: Size,
    generation_check: GenerationCheck,
    collect_delay: u64,
    event_capacity: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            viewport: Size::new(800.0, 600.0),
            generation_check: GenerationCheck::Strict,
            collect_delay: 1,
            event_capacity: 64,
        }
    }
}

impl DocumentConfig {
    /// Default options: an 800x600 viewport, strict element handles, and a
    /// one-epoch collection delay.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the viewport the root element is laid out in.
    #[must_use]
    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport = Size::new(width.max(0.0), height.max(0.0));
        self
    }

    /// Sets how element handles are checked on lookup.
    #[must_use]
    pub fn with_generation_check(mut self, check: GenerationCheck) -> Self {
        self.generation_check = check;
        self
    }

    /// Sets how many render epochs a removed element outlives its removal.
    #[must_use]
    pub fn with_collect_delay(mut self, epochs: u64) -> Self {
        self.collect_delay = epochs;
        self
    }

    /// Sets the initial capacity of the input event queue.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// The viewport size.
    #[must_use]
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Element handle checking.
    #[must_use]
    pub fn generation_check(&self) -> GenerationCheck {
        self.generation_check
    }

    /// Collection delay in render epochs.
    #[must_use]
    pub fn collect_delay(&self) -> u64 {
        self.collect_delay
    }

    /// Initial event queue capacity.
    #[must_use]
    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }
}
