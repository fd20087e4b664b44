// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis UI: a retained element tree with cascading styles and incremental
//! layout.
//!
//! - [`Document`] owns the elements, the [`StyleServer`](trellis_style::StyleServer),
//!   and a [`LayoutManager`]. Structural changes, class attachment, state
//!   changes, and style script loads only record what became stale;
//!   [`Document::validate`] cascades the pending style changes top-down and
//!   resolves the invalidated geometry.
//! - [`LayoutState`] holds an element's resolved box: size, margins, padding,
//!   border, position within the parent, absolute position, and the clip
//!   rectangles used for painting.
//! - [`ElementTree`] indexes elements by their string id.
//! - Elements with an explicit `z-index` are painted after the normal
//!   traversal, grouped document-wide by z-index ([`ZIndexBuckets`]).
//! - [`EventQueue`] buffers input pushed from any thread; [`Document::step`]
//!   drains it, tracks hover, push, and focus, and frees removed elements
//!   through a [`DeferredCollector`] once the renderer has moved past them.
//!
//! ## Layout model
//!
//! Each element is a border box with margins outside it. Children of an
//! element flow along its `child-plane`, one after the other, and are placed
//! across the plane by their own `horizontal-align` or `vertical-align`.
//! `relative` positioning offsets an element from its flow position;
//! `absolute` positioning places it against the parent's content box and
//! takes it out of the flow. `flex-child-width` and `flex-child-height` share
//! the space left over by fixed-size children among the `auto`-sized ones.
//!
//! ## Example
//!
//! ```rust
//! use kurbo::Point;
//! use trellis_style::ErrorStack;
//! use trellis_ui::{Document, DocumentConfig, InputEvent};
//!
//! let mut doc = Document::new(DocumentConfig::new().with_viewport(300.0, 200.0));
//! let mut errors = ErrorStack::new();
//! doc.styles_mut()
//!     .load_script(
//!         "theme",
//!         "row { child-plane: horizontal; height: 40px; }
//!          button { width: 100px; height: 40px; background-color: gray; }
//!          button:hovered { background-color: blue; }",
//!         "",
//!         &mut errors,
//!     )
//!     .unwrap();
//!
//! let row = doc.create_element(None).unwrap();
//! doc.append_child(doc.root(), row).unwrap();
//! doc.attach_class_name(row, "row").unwrap();
//! let mut buttons = Vec::new();
//! for _ in 0..2 {
//!     let b = doc.create_element(None).unwrap();
//!     doc.append_child(row, b).unwrap();
//!     doc.attach_class_name(b, "button").unwrap();
//!     buttons.push(b);
//! }
//! doc.validate();
//! assert_eq!(doc.layout(buttons[1]).unwrap().x(), 100.0);
//!
//! doc.event_queue().push(InputEvent::MouseMove(Point::new(150.0, 10.0)));
//! doc.step();
//! assert_eq!(doc.hover(), Some(buttons[1]));
//! ```

mod config;
mod document;
mod element;
mod error;
mod events;
mod gc;
mod layout;
mod render;
mod tree;
mod zindex;

pub use config::DocumentConfig;
pub use document::{Document, StepReport};
pub use element::{Children, Element, ElementId};
pub use error::TreeError;
pub use events::{EventQueue, InputEvent, MouseButton};
pub use gc::{DeferredCollector, RenderEpoch};
pub use layout::{LayoutManager, LayoutState};
pub use render::{
    ApproximateMetrics, FontMetrics, FontSpec, ImageHandle, ImageManager, ImageRegistry,
    RenderCommand, Renderer,
};
pub use tree::ElementTree;
pub use zindex::ZIndexBuckets;
