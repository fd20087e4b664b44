// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed attribute values and their string forms.

use alloc::string::{String, ToString};
use core::fmt;

use crate::error::ValueError;

/// A length: pixels or a percentage of a reference length.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Length {
    /// Absolute pixels.
    Px(f64),
    /// Percentage (`50.0` means half) of the reference length.
    Percent(f64),
}

impl Length {
    /// Zero pixels.
    pub const ZERO: Self = Self::Px(0.0);

    /// Resolves against `base` (used for percentages).
    #[must_use]
    pub fn resolve(self, base: f64) -> f64 {
        match self {
            Self::Px(v) => v,
            Self::Percent(p) => base * p / 100.0,
        }
    }

    /// Returns `true` for percentages.
    #[must_use]
    pub fn is_relative(self) -> bool {
        matches!(self, Self::Percent(_))
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(v) => write!(f, "{v}px"),
            Self::Percent(p) => write!(f, "{p}%"),
        }
    }
}

/// A length that may also be `auto`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Size {
    /// Determined by layout (content, flex distribution, or flow).
    Auto,
    /// Absolute pixels.
    Px(f64),
    /// Percentage of the parent's reference length.
    Percent(f64),
}

impl Size {
    /// Returns the length, or `None` for `auto`.
    #[must_use]
    pub fn length(self) -> Option<Length> {
        match self {
            Self::Auto => None,
            Self::Px(v) => Some(Length::Px(v)),
            Self::Percent(p) => Some(Length::Percent(p)),
        }
    }

    /// Returns `true` for `auto`.
    #[must_use]
    pub fn is_auto(self) -> bool {
        matches!(self, Self::Auto)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Px(v) => write!(f, "{v}px"),
            Self::Percent(p) => write!(f, "{p}%"),
        }
    }
}

/// An 8-bit-per-channel RGBA color.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha; `255` is opaque.
    pub a: u8,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Creates an opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Creates a color with alpha.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Returns `true` if the color has no visible contribution.
    #[must_use]
    pub const fn is_transparent(self) -> bool {
        self.a == 0
    }

    fn named(name: &str) -> Option<Self> {
        let color = match name {
            "transparent" => Self::TRANSPARENT,
            "black" => Self::BLACK,
            "white" => Self::WHITE,
            "red" => Self::rgb(255, 0, 0),
            "green" => Self::rgb(0, 128, 0),
            "blue" => Self::rgb(0, 0, 255),
            "gray" | "grey" => Self::rgb(128, 128, 128),
            "yellow" => Self::rgb(255, 255, 0),
            _ => return None,
        };
        Some(color)
    }

    /// Parses `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(..)`, `rgba(..)` or a color name.
    pub fn parse(raw: &str) -> Result<Self, ValueError> {
        let raw = raw.trim();
        let invalid = || ValueError::InvalidColor(raw.to_string());

        if let Some(hex) = raw.strip_prefix('#') {
            let digits: Option<alloc::vec::Vec<u8>> = hex
                .chars()
                .map(|c| c.to_digit(16).and_then(|d| u8::try_from(d).ok()))
                .collect();
            let digits = digits.ok_or_else(invalid)?;
            return match digits.as_slice() {
                [r, g, b] => Ok(Self::rgb(r * 17, g * 17, b * 17)),
                [r1, r0, g1, g0, b1, b0] => Ok(Self::rgb(r1 * 16 + r0, g1 * 16 + g0, b1 * 16 + b0)),
                [r1, r0, g1, g0, b1, b0, a1, a0] => Ok(Self::rgba(
                    r1 * 16 + r0,
                    g1 * 16 + g0,
                    b1 * 16 + b0,
                    a1 * 16 + a0,
                )),
                _ => Err(invalid()),
            };
        }

        let functional = raw
            .strip_prefix("rgba(")
            .map(|rest| (rest, true))
            .or_else(|| raw.strip_prefix("rgb(").map(|rest| (rest, false)));
        if let Some((rest, has_alpha)) = functional {
            let body = rest.strip_suffix(')').ok_or_else(invalid)?;
            let mut parts = body.split(',').map(str::trim);
            let mut channel = || -> Result<u8, ValueError> {
                let part = parts.next().ok_or_else(invalid)?;
                part.parse::<u8>().map_err(|_| invalid())
            };
            let (r, g, b) = (channel()?, channel()?, channel()?);
            let a = if has_alpha {
                let part = parts.next().ok_or_else(invalid)?;
                let alpha = part.parse::<f64>().map_err(|_| invalid())?;
                if !(0.0..=1.0).contains(&alpha) {
                    return Err(invalid());
                }
                unit_to_u8(alpha)
            } else {
                255
            };
            if parts.next().is_some() {
                return Err(invalid());
            }
            return Ok(Self::rgba(r, g, b, a));
        }

        Self::named(raw).ok_or_else(invalid)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            /// Every keyword accepted for this value, in declaration order.
            pub const KEYWORDS: &'static [&'static str] = &[$($text),+];

            /// Parses a keyword.
            pub fn parse(raw: &str) -> Result<Self, ValueError> {
                match raw.trim() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ValueError::UnknownKeyword {
                        value: other.to_string(),
                        expected: Self::KEYWORDS,
                    }),
                }
            }

            /// Returns the keyword text.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

keyword_enum! {
    /// How an element is placed within its parent.
    Positioning {
        /// Stacked flow after the provoking sibling.
        Auto => "auto",
        /// Flow position plus an offset.
        Relative => "relative",
        /// Offset from the parent's inner rectangle, outside the flow.
        Absolute => "absolute",
    }
}

keyword_enum! {
    /// Axis along which auto-positioned children are stacked.
    Plane {
        /// Left to right.
        Horizontal => "horizontal",
        /// Top to bottom.
        Vertical => "vertical",
    }
}

keyword_enum! {
    /// Placement on the horizontal axis when children stack vertically.
    HorizontalAlign {
        /// Flush with the left inner edge.
        Left => "left",
        /// Centered.
        Center => "center",
        /// Flush with the right inner edge.
        Right => "right",
    }
}

keyword_enum! {
    /// Placement on the vertical axis when children stack horizontally.
    VerticalAlign {
        /// Flush with the top inner edge.
        Top => "top",
        /// Centered.
        Center => "center",
        /// Flush with the bottom inner edge.
        Bottom => "bottom",
    }
}

keyword_enum! {
    /// Which parent rectangle percentages resolve against.
    RelativeMode {
        /// The parent's inner (content) size.
        Inner => "inner",
        /// The parent's outer (border-box) size.
        Outer => "outer",
    }
}

keyword_enum! {
    /// Whether children are clipped to the inner rectangle.
    Overflow {
        /// Children may paint outside.
        Visible => "visible",
        /// Children are clipped.
        Hidden => "hidden",
    }
}

keyword_enum! {
    /// Font slant.
    FontStyle {
        /// Upright.
        Normal => "normal",
        /// Slanted.
        Italic => "italic",
    }
}

/// A resolved, validated attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum StyleValue {
    /// `auto` or a length.
    Size(Size),
    /// A length.
    Length(Length),
    /// `none` or a length.
    Limit(Option<Length>),
    /// A plain number.
    Number(f64),
    /// `auto` or an explicit stacking bucket.
    ZIndex(Option<i32>),
    /// `true` or `false`.
    Bool(bool),
    /// A color.
    Color(Color),
    /// Positioning mode.
    Positioning(Positioning),
    /// Stacking plane.
    Plane(Plane),
    /// Horizontal alignment.
    HorizontalAlign(HorizontalAlign),
    /// Vertical alignment.
    VerticalAlign(VerticalAlign),
    /// Percentage reference.
    RelativeMode(RelativeMode),
    /// Overflow behavior.
    Overflow(Overflow),
    /// Font slant.
    FontStyle(FontStyle),
    /// Font weight, `100..=900`.
    FontWeight(u16),
    /// Free text (font family).
    Text(String),
    /// `none` or an image path.
    Image(Option<String>),
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Size(v) => v.fmt(f),
            Self::Length(v) => v.fmt(f),
            Self::Limit(None) | Self::Image(None) => f.write_str("none"),
            Self::Limit(Some(v)) => v.fmt(f),
            Self::Number(v) => write!(f, "{v}"),
            Self::ZIndex(None) => f.write_str("auto"),
            Self::ZIndex(Some(z)) => write!(f, "{z}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Color(c) => c.fmt(f),
            Self::Positioning(v) => v.fmt(f),
            Self::Plane(v) => v.fmt(f),
            Self::HorizontalAlign(v) => v.fmt(f),
            Self::VerticalAlign(v) => v.fmt(f),
            Self::RelativeMode(v) => v.fmt(f),
            Self::Overflow(v) => v.fmt(f),
            Self::FontStyle(v) => v.fmt(f),
            Self::FontWeight(w) => write!(f, "{w}"),
            Self::Text(t) => f.write_str(t),
            Self::Image(Some(path)) => f.write_str(path),
        }
    }
}

/// The value domain of an attribute: how raw text is parsed and validated.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ValueKind {
    /// `auto` | non-negative length.
    Size,
    /// `auto` | any length (offsets may be negative).
    Offset,
    /// Non-negative length.
    Length,
    /// `none` | non-negative length.
    Limit,
    /// Non-negative pixels only.
    Pixels,
    /// Strictly positive pixels.
    FontSize,
    /// Number within an inclusive range.
    Number {
        /// Smallest accepted value.
        min: f64,
        /// Largest accepted value.
        max: f64,
    },
    /// `auto` | integer.
    ZIndex,
    /// `true` | `false`.
    Bool,
    /// Color.
    Color,
    /// See [`Positioning`].
    Positioning,
    /// See [`Plane`].
    Plane,
    /// See [`HorizontalAlign`].
    HorizontalAlign,
    /// See [`VerticalAlign`].
    VerticalAlign,
    /// See [`RelativeMode`].
    RelativeMode,
    /// See [`Overflow`].
    Overflow,
    /// See [`FontStyle`].
    FontStyle,
    /// `normal` | `bold` | `100..=900`.
    FontWeight,
    /// Any non-empty text; surrounding quotes are stripped.
    Text,
    /// `none` | path | `url(path)`.
    Image,
}

impl ValueKind {
    /// Parses and validates `raw` for this kind.
    ///
    /// Keywords handled by the style server (`inherit`, the empty string) are
    /// not accepted here.
    pub fn parse(self, raw: &str) -> Result<StyleValue, ValueError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValueError::Empty);
        }
        let value = match self {
            Self::Size => StyleValue::Size(parse_size(raw, false)?),
            Self::Offset => StyleValue::Size(parse_size(raw, true)?),
            Self::Length => StyleValue::Length(non_negative(parse_length(raw)?)?),
            Self::Limit => StyleValue::Limit(if raw == "none" {
                None
            } else {
                Some(non_negative(parse_length(raw)?)?)
            }),
            Self::Pixels => match non_negative(parse_length(raw)?)? {
                px @ Length::Px(_) => StyleValue::Length(px),
                Length::Percent(_) => return Err(ValueError::InvalidLength(raw.to_string())),
            },
            Self::FontSize => match parse_length(raw)? {
                Length::Px(v) if v > 0.0 => StyleValue::Length(Length::Px(v)),
                Length::Px(v) => {
                    return Err(ValueError::OutOfRange {
                        value: v,
                        min: f64::MIN_POSITIVE,
                        max: f64::MAX,
                    });
                }
                Length::Percent(_) => return Err(ValueError::InvalidLength(raw.to_string())),
            },
            Self::Number { min, max } => {
                let v = parse_number(raw)?;
                if !(min..=max).contains(&v) {
                    return Err(ValueError::OutOfRange { value: v, min, max });
                }
                StyleValue::Number(v)
            }
            Self::ZIndex => StyleValue::ZIndex(if raw == "auto" {
                None
            } else {
                Some(
                    raw.parse::<i32>()
                        .map_err(|_| ValueError::InvalidInteger(raw.to_string()))?,
                )
            }),
            Self::Bool => StyleValue::Bool(match raw {
                "true" => true,
                "false" => false,
                other => {
                    return Err(ValueError::UnknownKeyword {
                        value: other.to_string(),
                        expected: &["true", "false"],
                    });
                }
            }),
            Self::Color => StyleValue::Color(Color::parse(raw)?),
            Self::Positioning => StyleValue::Positioning(Positioning::parse(raw)?),
            Self::Plane => StyleValue::Plane(Plane::parse(raw)?),
            Self::HorizontalAlign => StyleValue::HorizontalAlign(HorizontalAlign::parse(raw)?),
            Self::VerticalAlign => StyleValue::VerticalAlign(VerticalAlign::parse(raw)?),
            Self::RelativeMode => StyleValue::RelativeMode(RelativeMode::parse(raw)?),
            Self::Overflow => StyleValue::Overflow(Overflow::parse(raw)?),
            Self::FontStyle => StyleValue::FontStyle(FontStyle::parse(raw)?),
            Self::FontWeight => StyleValue::FontWeight(parse_font_weight(raw)?),
            Self::Text => StyleValue::Text(unquote(raw).to_string()),
            Self::Image => StyleValue::Image(if raw == "none" {
                None
            } else {
                let path = raw
                    .strip_prefix("url(")
                    .and_then(|p| p.strip_suffix(')'))
                    .unwrap_or(raw);
                Some(unquote(path.trim()).to_string())
            }),
        };
        Ok(value)
    }

    /// Returns `true` for kinds whose text names a file relative to the
    /// loading script.
    #[must_use]
    pub fn is_path(self) -> bool {
        matches!(self, Self::Image)
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "input is validated to 0.0..=1.0"
)]
fn unit_to_u8(v: f64) -> u8 {
    (v * 255.0 + 0.5) as u8
}

fn unquote(raw: &str) -> &str {
    raw.strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .or_else(|| raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')))
        .unwrap_or(raw)
}

fn parse_number(raw: &str) -> Result<f64, ValueError> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ValueError::InvalidNumber(raw.to_string())),
    }
}

/// Parses `10px`, `10` (pixels) or `50%`.
pub(crate) fn parse_length(raw: &str) -> Result<Length, ValueError> {
    let invalid = || ValueError::InvalidLength(raw.to_string());
    if let Some(number) = raw.strip_suffix('%') {
        return parse_number(number.trim_end()).map(Length::Percent).map_err(|_| invalid());
    }
    let number = raw.strip_suffix("px").unwrap_or(raw).trim_end();
    parse_number(number).map(Length::Px).map_err(|_| invalid())
}

fn non_negative(length: Length) -> Result<Length, ValueError> {
    let v = match length {
        Length::Px(v) | Length::Percent(v) => v,
    };
    if v < 0.0 {
        return Err(ValueError::OutOfRange {
            value: v,
            min: 0.0,
            max: f64::MAX,
        });
    }
    Ok(length)
}

fn parse_size(raw: &str, allow_negative: bool) -> Result<Size, ValueError> {
    if raw == "auto" {
        return Ok(Size::Auto);
    }
    let length = parse_length(raw)?;
    let length = if allow_negative {
        length
    } else {
        non_negative(length)?
    };
    Ok(match length {
        Length::Px(v) => Size::Px(v),
        Length::Percent(p) => Size::Percent(p),
    })
}

fn parse_font_weight(raw: &str) -> Result<u16, ValueError> {
    match raw {
        "normal" => Ok(400),
        "bold" => Ok(700),
        _ => {
            let w = raw
                .parse::<u16>()
                .map_err(|_| ValueError::InvalidInteger(raw.to_string()))?;
            if !(100..=900).contains(&w) || w % 100 != 0 {
                return Err(ValueError::OutOfRange {
                    value: f64::from(w),
                    min: 100.0,
                    max: 900.0,
                });
            }
            Ok(w)
        }
    }
}
