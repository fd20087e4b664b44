// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborator interfaces: fonts, images, and the renderer.
//!
//! The document never rasterizes anything. It measures text through a
//! [`FontMetrics`] oracle, resolves background images to [`ImageHandle`]s
//! through an [`ImageManager`], and describes each frame as a list of
//! [`RenderCommand`]s handed to a [`Renderer`].

use core::fmt;

use hashbrown::HashMap;
use kurbo::{Insets, Point, Rect, Size};
use trellis_handle::{Handle, HandleManager, RawHandle};
use trellis_style::{AttributeId, Color, FontStyle, StyleStack};

/// Handle to an image owned by an [`ImageManager`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ImageHandle(RawHandle);

impl Handle for ImageHandle {
    #[inline]
    fn from_raw(raw: RawHandle) -> Self {
        Self(raw)
    }

    #[inline]
    fn to_raw(self) -> RawHandle {
        self.0
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageHandle({}v{})", self.0.index(), self.0.generation())
    }
}

/// Font selection derived from an element's resolved style.
#[derive(Clone, Debug, PartialEq)]
pub struct FontSpec {
    /// Family name.
    pub family: String,
    /// Size in pixels.
    pub size: f64,
    /// Weight, 100 to 900.
    pub weight: u16,
    /// Italic slant.
    pub italic: bool,
}

impl FontSpec {
    /// Reads the font attributes of a resolved style.
    #[must_use]
    pub fn from_style(style: &StyleStack) -> Self {
        Self {
            family: style.text(AttributeId::FONT_FAMILY).to_owned(),
            size: style.length(AttributeId::FONT_SIZE).resolve(0.0),
            weight: style.font_weight(),
            italic: style.font_style() == FontStyle::Italic,
        }
    }
}

/// Measures text for layout.
pub trait FontMetrics {
    /// The size of the box `text` occupies when set in `font`.
    fn measure(&self, text: &str, font: &FontSpec) -> Size;
}

/// Monospace-like estimate: each character is 0.6 em wide and each line
/// 1.2 em tall.
///
/// Good enough for tests and headless use.
#[derive(Copy, Clone, Debug, Default)]
pub struct ApproximateMetrics;

impl FontMetrics for ApproximateMetrics {
    #[expect(
        clippy::cast_precision_loss,
        reason = "character and line counts are far below 2^52"
    )]
    fn measure(&self, text: &str, font: &FontSpec) -> Size {
        if text.is_empty() {
            return Size::ZERO;
        }
        let lines = text.split('\n');
        let mut count = 0_usize;
        let mut widest = 0_usize;
        for line in lines {
            count += 1;
            widest = widest.max(line.chars().count());
        }
        Size::new(
            widest as f64 * font.size * 0.6,
            count as f64 * font.size * 1.2,
        )
    }
}

/// Loads and owns images referenced by `background-image`.
pub trait ImageManager {
    /// Loads the image at `path`. Returns a null handle on failure.
    fn load(&mut self, path: &str) -> ImageHandle;
    /// Releases one reference to `image`.
    fn delete(&mut self, image: ImageHandle);
    /// Pixel dimensions, if known.
    fn dimensions(&self, image: ImageHandle) -> Option<Size>;
}

#[derive(Clone, Debug)]
struct ImageEntry {
    path: String,
    size: Option<Size>,
    refs: usize,
}

/// An [`ImageManager`] that only tracks paths and reference counts.
///
/// Loading the same path twice shares one handle. Dimensions are unknown
/// until [`ImageRegistry::set_dimensions`] provides them.
#[derive(Debug, Default)]
pub struct ImageRegistry {
    images: HandleManager<ImageHandle, ImageEntry>,
    by_path: HashMap<String, ImageHandle>,
}

impl ImageRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Returns `true` if no image is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// The path an image was loaded from.
    #[must_use]
    pub fn path(&self, image: ImageHandle) -> Option<&str> {
        self.images
            .get_associated_object(image)
            .map(|e| e.path.as_str())
    }

    /// Records the pixel size of a loaded image.
    pub fn set_dimensions(&mut self, image: ImageHandle, size: Size) -> bool {
        match self.images.get_associated_object_mut(image) {
            Some(entry) => {
                entry.size = Some(size);
                true
            }
            None => false,
        }
    }
}

impl ImageManager for ImageRegistry {
    fn load(&mut self, path: &str) -> ImageHandle {
        if let Some(&handle) = self.by_path.get(path)
            && let Some(entry) = self.images.get_associated_object_mut(handle)
        {
            entry.refs += 1;
            return handle;
        }
        let handle = self.images.create_handle();
        if handle.is_null() {
            tracing::warn!(path, "image handle space exhausted");
            return handle;
        }
        let entry = ImageEntry {
            path: path.to_owned(),
            size: None,
            refs: 1,
        };
        if self.images.associate_object_with_handle(handle, entry).is_err() {
            return ImageHandle::null();
        }
        self.by_path.insert(path.to_owned(), handle);
        handle
    }

    fn delete(&mut self, image: ImageHandle) {
        let Some(entry) = self.images.get_associated_object_mut(image) else {
            return;
        };
        entry.refs -= 1;
        if entry.refs > 0 {
            return;
        }
        if let Some(entry) = self.images.delete_handle(image) {
            self.by_path.remove(&entry.path);
        }
    }

    fn dimensions(&self, image: ImageHandle) -> Option<Size> {
        self.images.get_associated_object(image)?.size
    }
}

/// One drawing instruction, in absolute coordinates.
///
/// Every command carries the scissor rectangle it must be clipped to.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderCommand {
    /// Fill the border box.
    Background {
        /// Border box.
        rect: Rect,
        /// Fill color, opacity applied.
        color: Color,
        /// Clip rectangle.
        scissor: Rect,
    },
    /// Stroke the inside of the border box.
    Border {
        /// Border box.
        rect: Rect,
        /// Edge widths.
        widths: Insets,
        /// Edge colors: left, right, top, bottom.
        colors: [Color; 4],
        /// Clip rectangle.
        scissor: Rect,
    },
    /// Stretch an image over the border box.
    Image {
        /// Destination rectangle.
        rect: Rect,
        /// Image to draw.
        image: ImageHandle,
        /// Clip rectangle.
        scissor: Rect,
    },
    /// Draw a run of text.
    Text {
        /// Top-left corner of the text box.
        origin: Point,
        /// The text.
        text: String,
        /// Font to set it in.
        font: FontSpec,
        /// Text color, opacity applied.
        color: Color,
        /// Clip rectangle.
        scissor: Rect,
    },
}

impl RenderCommand {
    /// The clip rectangle of this command.
    #[must_use]
    pub fn scissor(&self) -> Rect {
        match self {
            Self::Background { scissor, .. }
            | Self::Border { scissor, .. }
            | Self::Image { scissor, .. }
            | Self::Text { scissor, .. } => *scissor,
        }
    }
}

/// Consumes finished frames.
pub trait Renderer {
    /// Draws `commands` in order.
    fn submit(&mut self, commands: &[RenderCommand]);
}

impl Renderer for Vec<RenderCommand> {
    fn submit(&mut self, commands: &[RenderCommand]) {
        self.clear();
        self.extend_from_slice(commands);
    }
}

/// Scales the alpha channel of `color` by `opacity`.
pub(crate) fn fade(color: Color, opacity: f64) -> Color {
    let opacity = opacity.clamp(0.0, 1.0);
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "alpha times a value in [0, 1] stays in 0..=255"
    )]
    let a = (f64::from(color.a) * opacity).round() as u8;
    Color::rgba(color.r, color.g, color.b, a)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font(size: f64) -> FontSpec {
        FontSpec {
            family: "sans-serif".into(),
            size,
            weight: 400,
            italic: false,
        }
    }

    #[test]
    fn approximate_metrics_count_lines_and_columns() {
        let m = ApproximateMetrics;
        assert_eq!(m.measure("", &font(10.0)), Size::ZERO);
        let s = m.measure("abcd\nab", &font(10.0));
        assert!((s.width - 24.0).abs() < 1e-9);
        assert!((s.height - 24.0).abs() < 1e-9);
    }

    #[test]
    fn registry_shares_and_counts_references() {
        let mut images = ImageRegistry::new();
        let a = images.load("ui/a.png");
        let b = images.load("ui/a.png");
        assert_eq!(a, b);
        assert_eq!(images.len(), 1);
        assert!(images.set_dimensions(a, Size::new(4.0, 2.0)));
        assert_eq!(images.dimensions(a), Some(Size::new(4.0, 2.0)));

        images.delete(a);
        assert_eq!(images.path(a), Some("ui/a.png"));
        images.delete(a);
        assert!(images.is_empty());
        assert_eq!(images.dimensions(a), None);
    }

    #[test]
    fn fade_scales_alpha() {
        assert_eq!(fade(Color::rgb(1, 2, 3), 0.5).a, 128);
        assert_eq!(fade(Color::rgb(1, 2, 3), 2.0).a, 255);
        assert_eq!(fade(Color::TRANSPARENT, 1.0), Color::TRANSPARENT);
    }
}
