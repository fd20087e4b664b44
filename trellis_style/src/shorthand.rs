// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Expansion of compound attributes into primitives, and the reverse.

use alloc::format;
use alloc::string::{String, ToString};
use smallvec::SmallVec;

use crate::attribute::{AttributeId, ShorthandInfo, ShorthandLayout};
use crate::class::StyleAttribute;
use crate::error::ValueError;
use crate::value::StyleValue;

/// Components produced by one compound assignment.
pub type Expansion = SmallVec<[(AttributeId, StyleValue); 8]>;

/// Splits on whitespace, keeping parenthesized groups such as
/// `rgb(1, 2, 3)` together.
pub(crate) fn split_tokens(raw: &str) -> SmallVec<[&str; 4]> {
    let mut tokens = SmallVec::new();
    let mut depth = 0_u32;
    let mut start = None;
    for (i, c) in raw.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if c.is_whitespace() && depth == 0 {
            if let Some(s) = start.take() {
                tokens.push(&raw[s..i]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(&raw[s..]);
    }
    tokens
}

fn parse_component(id: AttributeId, raw: &str) -> Result<StyleValue, ValueError> {
    id.info().kind.parse(raw)
}

/// Expands `raw` into typed primitive values.
///
/// `inherit` and the empty string are handled by the caller; here every
/// token must be a concrete value.
pub fn expand(info: &ShorthandInfo, raw: &str) -> Result<Expansion, ValueError> {
    let tokens = split_tokens(raw);
    let mut out = Expansion::new();
    match info.layout {
        ShorthandLayout::Sides([left, right, top, bottom]) => {
            let (l, r, t, b) = match tokens.as_slice() {
                [all] => (*all, *all, *all, *all),
                [h, v] => (*h, *h, *v, *v),
                [l, r, t, b] => (*l, *r, *t, *b),
                other => return Err(ValueError::TokenCount { found: other.len() }),
            };
            out.push((left, parse_component(left, l)?));
            out.push((right, parse_component(right, r)?));
            out.push((top, parse_component(top, t)?));
            out.push((bottom, parse_component(bottom, b)?));
        }
        ShorthandLayout::Border { widths, colors } => {
            if tokens.is_empty() || tokens.len() > 2 {
                return Err(ValueError::TokenCount {
                    found: tokens.len(),
                });
            }
            let mut width = None;
            let mut color = None;
            for token in tokens {
                let Some(&first_width) = widths.first() else {
                    break;
                };
                if width.is_none()
                    && let Ok(w) = parse_component(first_width, token)
                {
                    width = Some(w);
                    continue;
                }
                let Some(&first_color) = colors.first() else {
                    break;
                };
                if color.is_none()
                    && let Ok(c) = parse_component(first_color, token)
                {
                    color = Some(c);
                    continue;
                }
                return Err(ValueError::UnexpectedToken(token.to_string()));
            }
            if let Some(w) = width {
                out.extend(widths.iter().map(|&id| (id, w.clone())));
            }
            if let Some(c) = color {
                out.extend(colors.iter().map(|&id| (id, c.clone())));
            }
        }
    }
    Ok(out)
}

/// Rebuilds the shortest script text for a compound attribute from its
/// component slots, as returned by `component(id)`.
///
/// Returns `None` if any component is unset, if only some components
/// inherit, or if the components cannot be expressed by this compound.
pub fn collapse<'a>(
    info: &ShorthandInfo,
    component: impl Fn(AttributeId) -> &'a StyleAttribute,
) -> Option<String> {
    let mut inherit = 0;
    let mut total = 0;
    for id in info.components() {
        let slot = component(id);
        if !slot.is_set() {
            return None;
        }
        total += 1;
        if slot.is_inherit() {
            inherit += 1;
        }
    }
    if inherit == total {
        return Some("inherit".to_string());
    }
    if inherit > 0 {
        return None;
    }
    let text = |id: AttributeId| component(id).value().to_string();

    match info.layout {
        ShorthandLayout::Sides([left, right, top, bottom]) => {
            let (l, r, t, b) = (text(left), text(right), text(top), text(bottom));
            if l == r && t == b {
                if l == t {
                    Some(l)
                } else {
                    Some(format!("{l} {t}"))
                }
            } else {
                Some(format!("{l} {r} {t} {b}"))
            }
        }
        ShorthandLayout::Border { widths, colors } => {
            let uniform = |ids: &[AttributeId]| -> Option<String> {
                let (first, rest) = ids.split_first()?;
                let value = text(*first);
                rest.iter().all(|&id| text(id) == value).then_some(value)
            };
            let width = uniform(widths)?;
            let color = uniform(colors)?;
            Some(format!("{width} {color}"))
        }
    }
}
