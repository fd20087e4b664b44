// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input events handed over from the platform thread.

use std::collections::VecDeque;
use std::sync::Arc;

use kurbo::Point;
use parking_lot::Mutex;

/// A mouse button.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Secondary button.
    Right,
    /// Wheel button.
    Middle,
    /// Any other button, by platform index.
    Other(u16),
}

/// Raw input, in viewport coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    /// The pointer moved.
    MouseMove(Point),
    /// A button went down.
    MousePress {
        /// Pointer position.
        position: Point,
        /// The button.
        button: MouseButton,
    },
    /// A button went up.
    MouseRelease {
        /// Pointer position.
        position: Point,
        /// The button.
        button: MouseButton,
    },
    /// A key changed state.
    Key {
        /// Platform key code.
        code: u32,
        /// `true` on press, `false` on release.
        pressed: bool,
    },
    /// Text input.
    Char(char),
}

/// A queue of input events shared between threads.
///
/// Clones refer to the same queue; any clone may push, and the document
/// drains it once per step. A single mutex guards the buffer.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    inner: Arc<Mutex<VecDeque<InputEvent>>>,
}

impl EventQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty queue with room for `capacity` events.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
        }
    }

    /// Appends an event.
    pub fn push(&self, event: InputEvent) {
        self.inner.lock().push_back(event);
    }

    /// Removes and returns every queued event, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<InputEvent> {
        self.inner.lock().drain(..).collect()
    }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` if no event is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_queue() {
        let queue = EventQueue::with_capacity(4);
        let sender = queue.clone();
        sender.push(InputEvent::Char('a'));
        sender.push(InputEvent::MouseMove(Point::new(1.0, 2.0)));
        assert_eq!(queue.len(), 2);
        let events = queue.drain();
        assert_eq!(events[0], InputEvent::Char('a'));
        assert!(sender.is_empty());
    }

    #[test]
    fn pushes_from_other_threads_arrive_in_order() {
        let queue = EventQueue::new();
        let sender = queue.clone();
        std::thread::spawn(move || {
            for code in 0..10 {
                sender.push(InputEvent::Key {
                    code,
                    pressed: true,
                });
            }
        })
        .join()
        .unwrap();
        let codes: Vec<_> = queue
            .drain()
            .into_iter()
            .map(|e| match e {
                InputEvent::Key { code, .. } => code,
                _ => u32::MAX,
            })
            .collect();
        assert_eq!(codes, (0..10).collect::<Vec<_>>());
    }
}
