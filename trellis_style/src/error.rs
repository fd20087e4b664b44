// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for value parsing, style mutation, and script loading.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// A raw value that does not fit its attribute's domain.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueError {
    /// No value text was given where one is required.
    Empty,
    /// Not a finite number.
    InvalidNumber(String),
    /// Not a length (`10px`, `10`, `50%`).
    InvalidLength(String),
    /// Not an integer.
    InvalidInteger(String),
    /// Not a color.
    InvalidColor(String),
    /// Numeric value outside the accepted range.
    OutOfRange {
        /// The offending value.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },
    /// Keyword outside the accepted set.
    UnknownKeyword {
        /// The offending keyword.
        value: String,
        /// Accepted keywords.
        expected: &'static [&'static str],
    },
    /// A compound attribute received an unsupported number of tokens.
    TokenCount {
        /// Tokens found.
        found: usize,
    },
    /// A compound attribute token matched no component.
    UnexpectedToken(String),
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("missing value"),
            Self::InvalidNumber(v) => write!(f, "`{v}` is not a number"),
            Self::InvalidLength(v) => write!(f, "`{v}` is not a length"),
            Self::InvalidInteger(v) => write!(f, "`{v}` is not an integer"),
            Self::InvalidColor(v) => write!(f, "`{v}` is not a color"),
            Self::OutOfRange { value, min, max } => {
                write!(f, "{value} is outside {min}..={max}")
            }
            Self::UnknownKeyword { value, expected } => {
                write!(f, "`{value}` is not one of {}", expected.join(", "))
            }
            Self::TokenCount { found } => {
                write!(f, "expected 1, 2 or 4 values, found {found}")
            }
            Self::UnexpectedToken(v) => write!(f, "unexpected `{v}`"),
        }
    }
}

impl core::error::Error for ValueError {}

/// Failure of a programmatic style mutation. Nothing is modified when this
/// is returned.
#[derive(Clone, Debug, PartialEq)]
pub enum StyleError {
    /// No attribute or compound attribute with this name.
    UnknownAttribute(String),
    /// No class with this name, or a stale class handle.
    UnknownClass(String),
    /// A `$name` reference to an undefined variable.
    UnknownVariable(String),
    /// Not a valid class or variable name.
    InvalidName(String),
    /// No more class handles can be allocated.
    ClassLimit,
    /// The value does not fit the attribute.
    InvalidValue {
        /// Attribute being set.
        attribute: &'static str,
        /// What went wrong.
        error: ValueError,
    },
}

impl fmt::Display for StyleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAttribute(name) => write!(f, "unknown attribute `{name}`"),
            Self::UnknownClass(name) => write!(f, "unknown style class `{name}`"),
            Self::UnknownVariable(name) => write!(f, "undefined variable `${name}`"),
            Self::InvalidName(name) => write!(f, "`{name}` is not a valid name"),
            Self::ClassLimit => f.write_str("style class limit reached"),
            Self::InvalidValue { attribute, error } => {
                write!(f, "invalid value for `{attribute}`: {error}")
            }
        }
    }
}

impl core::error::Error for StyleError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::InvalidValue { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// A diagnostic produced while compiling a style script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileError {
    /// Identifier of the script being compiled.
    pub source: String,
    /// 1-based line number.
    pub line: u32,
    /// Human readable description.
    pub message: String,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.source, self.line, self.message)
    }
}

impl core::error::Error for CompileError {}

/// Receives compile diagnostics.
pub trait ErrorSink {
    /// Records one diagnostic.
    fn report(&mut self, error: CompileError);
}

impl ErrorSink for Vec<CompileError> {
    fn report(&mut self, error: CompileError) {
        self.push(error);
    }
}

/// A stack of diagnostics, queried newest first.
#[derive(Clone, Debug, Default)]
pub struct ErrorStack {
    errors: Vec<CompileError>,
}

impl ErrorStack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the newest diagnostic without removing it.
    #[must_use]
    pub fn last_error(&self) -> Option<&CompileError> {
        self.errors.last()
    }

    /// Removes and returns the newest diagnostic.
    pub fn pop_last_error(&mut self) -> Option<CompileError> {
        self.errors.pop()
    }

    /// Iterates diagnostics oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &CompileError> {
        self.errors.iter()
    }

    /// Drops every diagnostic.
    pub fn clear(&mut self) {
        self.errors.clear();
    }
}

impl ErrorSink for ErrorStack {
    fn report(&mut self, error: CompileError) {
        self.errors.push(error);
    }
}

/// A style script failed to load. Details went to the [`ErrorSink`]; the
/// server state is unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadError {
    /// Identifier of the rejected script.
    pub source: String,
    /// Number of diagnostics reported.
    pub errors: usize,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "style script `{}` rejected with {} error(s)",
            self.source, self.errors
        )
    }
}

impl core::error::Error for LoadError {}
