// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style script syntax.
//!
//! ```text
//! script      := (variable | rule)*
//! variable    := '$' ident ':' value ';'
//! rule        := ident (':' ident)? '{' declaration* '}'
//! declaration := ident ':' value ';'
//! ```
//!
//! A value is the raw text up to the next `;` or `}`. Comments are `/* .. */`
//! and `// ..` to end of line, and may appear anywhere except inside a value.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// A `name: value;` pair with its line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Declaration<'a> {
    pub(crate) name: &'a str,
    pub(crate) value: &'a str,
    pub(crate) line: u32,
}

/// `class[:modifier] { .. }`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Rule<'a> {
    pub(crate) class: &'a str,
    pub(crate) modifier: Option<&'a str>,
    pub(crate) line: u32,
    pub(crate) declarations: Vec<Declaration<'a>>,
}

/// A top-level item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Item<'a> {
    /// `$name: value;`
    Variable(Declaration<'a>),
    /// A class rule.
    Rule(Rule<'a>),
}

/// A syntax error at a line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SyntaxError {
    pub(crate) line: u32,
    pub(crate) message: String,
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    line: u32,
}

pub(crate) fn is_ident(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        && !text.starts_with(|c: char| c.is_ascii_digit())
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Skips whitespace and comments. An unterminated block comment runs to
    /// the end of input.
    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            if rest.starts_with("/*") {
                self.pos += 2;
                while !self.rest().is_empty() && !self.rest().starts_with("*/") {
                    self.bump();
                }
                self.pos = (self.pos + 2).min(self.src.len());
            } else if rest.starts_with("//") {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else if self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn ident(&mut self) -> &'a str {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    /// Reads raw value text up to `;` or `}`, honoring quotes.
    fn value(&mut self) -> &'a str {
        let start = self.pos;
        let mut quote = None;
        let mut end = self.pos;
        while let Some(c) = self.peek() {
            match quote {
                Some(q) if c == q => quote = None,
                Some(_) => {}
                None if c == '"' || c == '\'' => quote = Some(c),
                None if c == ';' || c == '}' => break,
                None => {}
            }
            self.bump();
            if !c.is_whitespace() {
                end = self.pos;
            }
        }
        self.src[start..end].trim()
    }

    /// Skips past the next `;`, stopping before a `}`.
    fn recover_declaration(&mut self) {
        while let Some(c) = self.peek() {
            if c == '}' {
                return;
            }
            self.bump();
            if c == ';' {
                return;
            }
        }
    }

    /// Skips past the next `}`.
    fn recover_rule(&mut self) {
        while let Some(c) = self.bump() {
            if c == '}' {
                return;
            }
        }
    }

    fn declaration(&mut self, errors: &mut Vec<SyntaxError>) -> Option<Declaration<'a>> {
        let line = self.line;
        let name = self.ident();
        if name.is_empty() {
            let found = self.peek().map_or_else(|| String::from("end of input"), String::from);
            errors.push(SyntaxError {
                line,
                message: format!("expected a name, found `{found}`"),
            });
            self.recover_declaration();
            return None;
        }
        self.skip_trivia();
        if !self.eat(':') {
            errors.push(SyntaxError {
                line,
                message: format!("expected `:` after `{name}`"),
            });
            self.recover_declaration();
            return None;
        }
        self.skip_trivia();
        let value = self.value();
        if !self.eat(';') && self.peek() != Some('}') {
            errors.push(SyntaxError {
                line,
                message: format!("expected `;` after value of `{name}`"),
            });
            return None;
        }
        Some(Declaration { name, value, line })
    }

    fn rule(&mut self, errors: &mut Vec<SyntaxError>) -> Option<Rule<'a>> {
        let line = self.line;
        let class = self.ident();
        if !is_ident(class) {
            let found = if class.is_empty() {
                self.peek().map_or_else(|| String::from("end of input"), String::from)
            } else {
                String::from(class)
            };
            errors.push(SyntaxError {
                line,
                message: format!("expected a class name, found `{found}`"),
            });
            self.recover_rule();
            return None;
        }
        self.skip_trivia();
        let modifier = if self.eat(':') {
            self.skip_trivia();
            Some(self.ident())
        } else {
            None
        };
        self.skip_trivia();
        if !self.eat('{') {
            errors.push(SyntaxError {
                line,
                message: format!("expected `{{` after `{class}`"),
            });
            self.recover_rule();
            return None;
        }

        let mut declarations = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => {
                    errors.push(SyntaxError {
                        line,
                        message: format!("unterminated rule `{class}`"),
                    });
                    return None;
                }
                Some('}') => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    if let Some(decl) = self.declaration(errors) {
                        declarations.push(decl);
                    }
                }
            }
        }
        Some(Rule {
            class,
            modifier,
            line,
            declarations,
        })
    }
}

/// Parses a whole script, collecting every syntax error.
pub(crate) fn parse(src: &str) -> Result<Vec<Item<'_>>, Vec<SyntaxError>> {
    let mut cursor = Cursor::new(src);
    let mut items = Vec::new();
    let mut errors = Vec::new();
    loop {
        cursor.skip_trivia();
        if cursor.peek().is_none() {
            break;
        }
        if cursor.eat('$') {
            if let Some(decl) = cursor.declaration(&mut errors) {
                items.push(Item::Variable(decl));
            }
        } else if let Some(rule) = cursor.rule(&mut errors) {
            items.push(Item::Rule(rule));
        }
    }
    if errors.is_empty() {
        Ok(items)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule<'a>(items: &'a [Item<'a>], i: usize) -> &'a Rule<'a> {
        match &items[i] {
            Item::Rule(rule) => rule,
            Item::Variable(_) => panic!("item {i} is a variable"),
        }
    }

    #[test]
    fn parses_rules_variables_and_comments() {
        let src = "\
            /* palette */\n\
            $accent: #ff0000;\n\
            button {\n\
              width: 10px; // fixed\n\
              border: 1px $accent;\n\
            }\n\
            button:hovered { background-color: $accent; }\n";
        let items = parse(src).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(
            items[0],
            Item::Variable(Declaration {
                name: "accent",
                value: "#ff0000",
                line: 2,
            })
        );
        let button = rule(&items, 1);
        assert_eq!(button.class, "button");
        assert_eq!(button.modifier, None);
        assert_eq!(button.line, 3);
        assert_eq!(button.declarations.len(), 2);
        assert_eq!(button.declarations[0].value, "10px");
        assert_eq!(button.declarations[1].line, 5);
        let hovered = rule(&items, 2);
        assert_eq!(hovered.modifier, Some("hovered"));
    }

    #[test]
    fn last_declaration_may_omit_semicolon() {
        let items = parse("a { width: 1px }").unwrap();
        assert_eq!(rule(&items, 0).declarations[0].value, "1px");
    }

    #[test]
    fn quoted_values_keep_separators() {
        let items = parse("a { font-family: \"A; B\"; }").unwrap();
        assert_eq!(rule(&items, 0).declarations[0].value, "\"A; B\"");
    }

    #[test]
    fn collects_multiple_errors_with_lines() {
        let errors = parse("a {\n width 1px;\n}\nb {\n : 2px;\n}\n").unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line, 2);
        assert_eq!(errors[1].line, 5);
    }

    #[test]
    fn unterminated_rule_is_an_error() {
        let errors = parse("a { width: 1px;").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("unterminated"));
    }

    #[test]
    fn ident_rules() {
        assert!(is_ident("my-class_2"));
        assert!(!is_ident("2col"));
        assert!(!is_ident(""));
        assert!(!is_ident("a.b"));
    }
}
