// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Turns script syntax into a compiled unit of typed slot assignments.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::attribute::{AttributeId, AttributeName, lookup};
use crate::class::{Declaration, StateModifier};
use crate::error::{CompileError, ErrorSink, StyleError};
use crate::script::{self, Item, is_ident};
use crate::shorthand;
use crate::value::StyleValue;

/// Primitive declarations produced by one `name: value` pair.
pub(crate) type Declarations = SmallVec<[(AttributeId, Declaration); 8]>;

/// What a unit entry writes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Target {
    Attribute(AttributeId),
    Includes,
}

/// Identifies one writable slot: a class (or one of its modifiers) and a
/// target within it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct SlotKey {
    pub(crate) class: String,
    pub(crate) modifier: Option<StateModifier>,
    pub(crate) target: Target,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum EntryValue {
    Declared(Declaration),
    Includes(Vec<String>),
}

/// A compiled, validated style script.
#[derive(Clone, Debug)]
pub(crate) struct CompiledUnit {
    pub(crate) id: String,
    pub(crate) variables: Vec<(String, String)>,
    /// Every class (and modifier) the script mentions, in first-seen order.
    pub(crate) classes: Vec<(String, Option<StateModifier>)>,
    pub(crate) entries: Vec<(SlotKey, EntryValue)>,
    index: HashMap<SlotKey, usize>,
}

impl CompiledUnit {
    pub(crate) fn value(&self, key: &SlotKey) -> Option<&EntryValue> {
        let &i = self.index.get(key)?;
        Some(&self.entries[i].1)
    }

    pub(crate) fn variable(&self, name: &str) -> Option<&str> {
        self.variables
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v.as_str()))
    }

    pub(crate) fn mentions_class(&self, name: &str) -> bool {
        self.classes.iter().any(|(c, _)| c == name)
    }
}

/// Replaces every `$name` token of `raw` with the variable's value.
///
/// Tokens are split the way compound values are, so a reference may stand
/// alone or sit among other tokens (`1px $accent`). Substituted text is not
/// scanned again. Returns the name of the first undefined variable as the
/// error.
pub(crate) fn substitute(
    raw: &str,
    variable: impl Fn(&str) -> Option<String>,
) -> Result<String, String> {
    if !raw.contains('$') {
        return Ok(raw.to_string());
    }
    let mut out = String::with_capacity(raw.len());
    for token in shorthand::split_tokens(raw) {
        if !out.is_empty() {
            out.push(' ');
        }
        match token.strip_prefix('$') {
            Some(name) => out.push_str(&variable(name).ok_or_else(|| name.to_string())?),
            None => out.push_str(token),
        }
    }
    Ok(out)
}

/// Joins a relative path onto `base_dir`.
pub(crate) fn resolve_path(base_dir: &str, path: &str) -> String {
    if base_dir.is_empty() || path.starts_with('/') || path.contains("://") {
        path.to_string()
    } else {
        format!("{}/{}", base_dir.trim_end_matches('/'), path)
    }
}

/// Parses `raw` (already variable-substituted) for the primitive or compound
/// attribute `name`.
///
/// `inherit` applies to every component. The empty string is not accepted.
pub(crate) fn declarations(
    name: &str,
    raw: &str,
    base_dir: &str,
) -> Result<Declarations, StyleError> {
    let raw = raw.trim();
    let attribute = lookup(name).ok_or_else(|| StyleError::UnknownAttribute(name.to_string()))?;
    let mut out = Declarations::new();
    match attribute {
        AttributeName::Primitive(id) => {
            if raw == "inherit" {
                out.push((id, Declaration::Inherit));
                return Ok(out);
            }
            let info = id.info();
            let mut value = info
                .kind
                .parse(raw)
                .map_err(|error| StyleError::InvalidValue {
                    attribute: info.name,
                    error,
                })?;
            if let StyleValue::Image(Some(path)) = &mut value {
                *path = resolve_path(base_dir, path);
            }
            out.push((id, Declaration::Value(value)));
        }
        AttributeName::Shorthand(info) => {
            if raw == "inherit" {
                out.extend(info.components().map(|id| (id, Declaration::Inherit)));
                return Ok(out);
            }
            let expanded =
                shorthand::expand(info, raw).map_err(|error| StyleError::InvalidValue {
                    attribute: info.name,
                    error,
                })?;
            out.extend(
                expanded
                    .into_iter()
                    .map(|(id, value)| (id, Declaration::Value(value))),
            );
        }
    }
    Ok(out)
}

/// Parses an `include` list.
pub(crate) fn include_list(raw: &str) -> Result<Vec<String>, String> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "none" {
        return Ok(Vec::new());
    }
    raw.split(',')
        .map(str::trim)
        .map(|name| {
            if is_ident(name) {
                Ok(name.to_string())
            } else {
                Err(format!("`{name}` is not a class name"))
            }
        })
        .collect()
}

struct Compiler<'s> {
    id: &'s str,
    base_dir: &'s str,
    known: &'s dyn Fn(&str) -> Option<String>,
    variables: Vec<(String, String)>,
    classes: Vec<(String, Option<StateModifier>)>,
    entries: Vec<(SlotKey, EntryValue)>,
    index: HashMap<SlotKey, usize>,
    errors: usize,
}

impl Compiler<'_> {
    fn error(&mut self, sink: &mut dyn ErrorSink, line: u32, message: String) {
        self.errors += 1;
        sink.report(CompileError {
            source: self.id.to_string(),
            line,
            message,
        });
    }

    fn variable(&self, name: &str) -> Option<String> {
        self.variables
            .iter()
            .find_map(|(n, v)| (n == name).then(|| v.clone()))
            .or_else(|| (self.known)(name))
    }

    fn write(&mut self, key: SlotKey, value: EntryValue) {
        if let Some(&i) = self.index.get(&key) {
            self.entries[i].1 = value;
        } else {
            self.index.insert(key.clone(), self.entries.len());
            self.entries.push((key, value));
        }
    }

    fn rule(&mut self, rule: &script::Rule<'_>, sink: &mut dyn ErrorSink) {
        let modifier = match rule.modifier {
            None => None,
            Some(name) => match StateModifier::parse(name) {
                Some(m) => Some(m),
                None => {
                    self.error(sink, rule.line, format!("unknown modifier `:{name}`"));
                    return;
                }
            },
        };
        let class = rule.class.to_string();
        if !self
            .classes
            .iter()
            .any(|(c, m)| *c == class && *m == modifier)
        {
            self.classes.push((class.clone(), modifier));
        }

        for decl in &rule.declarations {
            let substituted = match substitute(decl.value, |name| self.variable(name)) {
                Ok(value) => value,
                Err(name) => {
                    self.error(sink, decl.line, format!("undefined variable `${name}`"));
                    continue;
                }
            };

            if decl.name == "include" {
                if modifier.is_some() {
                    self.error(
                        sink,
                        decl.line,
                        "`include` is not allowed in a modifier block".to_string(),
                    );
                    continue;
                }
                match include_list(&substituted) {
                    Ok(list) => self.write(
                        SlotKey {
                            class: class.clone(),
                            modifier,
                            target: Target::Includes,
                        },
                        EntryValue::Includes(list),
                    ),
                    Err(message) => self.error(sink, decl.line, message),
                }
                continue;
            }

            if substituted.trim().is_empty() {
                self.error(sink, decl.line, format!("missing value for `{}`", decl.name));
                continue;
            }
            match declarations(decl.name, &substituted, self.base_dir) {
                Ok(list) => {
                    for (id, declaration) in list {
                        self.write(
                            SlotKey {
                                class: class.clone(),
                                modifier,
                                target: Target::Attribute(id),
                            },
                            EntryValue::Declared(declaration),
                        );
                    }
                }
                Err(error) => self.error(sink, decl.line, error.to_string()),
            }
        }
    }
}

/// Compiles a script in isolation. Every diagnostic goes to `sink`; the
/// result is `None` if there was any.
///
/// `known` resolves variables defined by previously loaded scripts.
pub(crate) fn compile(
    id: &str,
    text: &str,
    base_dir: &str,
    known: &dyn Fn(&str) -> Option<String>,
    sink: &mut dyn ErrorSink,
) -> Option<CompiledUnit> {
    let items = match script::parse(text) {
        Ok(items) => items,
        Err(errors) => {
            for error in errors {
                sink.report(CompileError {
                    source: id.to_string(),
                    line: error.line,
                    message: error.message,
                });
            }
            return None;
        }
    };

    let mut compiler = Compiler {
        id,
        base_dir,
        known,
        variables: Vec::new(),
        classes: Vec::new(),
        entries: Vec::new(),
        index: HashMap::new(),
        errors: 0,
    };

    // Variables are visible to every rule of the script, wherever declared.
    for item in &items {
        if let Item::Variable(decl) = item {
            if !is_ident(decl.name) {
                compiler.error(sink, decl.line, format!("invalid variable name `${}`", decl.name));
                continue;
            }
            let value = decl.value.to_string();
            match compiler.variables.iter_mut().find(|(n, _)| n == decl.name) {
                Some((_, existing)) => *existing = value,
                None => compiler.variables.push((decl.name.to_string(), value)),
            }
        }
    }
    for item in &items {
        if let Item::Rule(rule) = item {
            compiler.rule(rule, sink);
        }
    }

    if compiler.errors > 0 {
        return None;
    }
    Some(CompiledUnit {
        id: id.to_string(),
        variables: compiler.variables,
        classes: compiler.classes,
        entries: compiler.entries,
        index: compiler.index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Color, Length, Size};

    fn no_vars(_: &str) -> Option<String> {
        None
    }

    fn compile_ok(text: &str) -> CompiledUnit {
        let mut errors = Vec::new();
        let unit = compile("test", text, "", &no_vars, &mut errors);
        assert!(errors.is_empty(), "{errors:?}");
        unit.unwrap()
    }

    fn key(class: &str, modifier: Option<StateModifier>, id: AttributeId) -> SlotKey {
        SlotKey {
            class: class.to_string(),
            modifier,
            target: Target::Attribute(id),
        }
    }

    #[test]
    fn later_declarations_win_within_a_unit() {
        let unit = compile_ok("a { width: 1px; width: 2px; }");
        assert_eq!(unit.entries.len(), 1);
        assert_eq!(
            unit.value(&key("a", None, AttributeId::WIDTH)),
            Some(&EntryValue::Declared(Declaration::Value(StyleValue::Size(
                Size::Px(2.0)
            ))))
        );
    }

    #[test]
    fn variables_are_substituted_once() {
        let unit = compile_ok("a { color: $fg; }\n$fg: red;");
        assert_eq!(
            unit.value(&key("a", None, AttributeId::COLOR)),
            Some(&EntryValue::Declared(Declaration::Value(StyleValue::Color(
                Color::rgb(255, 0, 0)
            ))))
        );
    }

    #[test]
    fn variables_are_substituted_inside_compound_values() {
        let unit = compile_ok("$c: red;\na { border: 1px $c; margin: $c2 2px; }\n$c2: 3px;");
        assert_eq!(
            unit.value(&key("a", None, AttributeId::BORDER_TOP_COLOR)),
            Some(&EntryValue::Declared(Declaration::Value(StyleValue::Color(
                Color::rgb(255, 0, 0)
            ))))
        );
        assert_eq!(
            unit.value(&key("a", None, AttributeId::MARGIN_LEFT)),
            Some(&EntryValue::Declared(Declaration::Value(StyleValue::Length(
                Length::Px(3.0)
            ))))
        );
    }

    #[test]
    fn substitution_keeps_parenthesized_groups() {
        let lookup = |name: &str| (name == "w").then(|| "2px".to_string());
        assert_eq!(
            substitute("$w rgb(1, 2, 3)", lookup).as_deref(),
            Ok("2px rgb(1, 2, 3)")
        );
        assert_eq!(substitute("1px $nope", lookup), Err("nope".to_string()));
        assert_eq!(substitute("b, c", lookup).as_deref(), Ok("b, c"));
    }

    #[test]
    fn known_variables_come_from_earlier_loads() {
        let known = |name: &str| (name == "gap").then(|| "4px".to_string());
        let mut errors = Vec::new();
        let unit = compile("t", "a { margin-left: $gap; }", "", &known, &mut errors).unwrap();
        assert_eq!(
            unit.value(&key("a", None, AttributeId::MARGIN_LEFT)),
            Some(&EntryValue::Declared(Declaration::Value(StyleValue::Length(
                Length::Px(4.0)
            ))))
        );
    }

    #[test]
    fn modifiers_and_includes_are_recorded() {
        let unit = compile_ok("a { include: b, c; } a:hovered { color: blue; }");
        assert_eq!(
            unit.classes,
            [
                ("a".to_string(), None),
                ("a".to_string(), Some(StateModifier::Hovered))
            ]
        );
        let includes = SlotKey {
            class: "a".to_string(),
            modifier: None,
            target: Target::Includes,
        };
        assert_eq!(
            unit.value(&includes),
            Some(&EntryValue::Includes(alloc::vec!["b".to_string(), "c".to_string()]))
        );
    }

    #[test]
    fn semantic_errors_carry_lines() {
        let mut errors = Vec::new();
        let text = "a {\n  bogus: 1px;\n  margin: 1px 2px 3px;\n  color: $nope;\n}\nb:shaking { width: 1px; }\n";
        assert!(compile("theme", text, "", &no_vars, &mut errors).is_none());
        let lines: Vec<u32> = errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, [2, 3, 4, 6]);
        assert!(errors.iter().all(|e| e.source == "theme"));
    }

    #[test]
    fn image_paths_join_the_base_directory() {
        let mut errors = Vec::new();
        let unit = compile(
            "t",
            "a { background-image: img/x.png; } b { background-image: /abs.png; }",
            "themes/dark/",
            &no_vars,
            &mut errors,
        )
        .unwrap();
        assert_eq!(
            unit.value(&key("a", None, AttributeId::BACKGROUND_IMAGE)),
            Some(&EntryValue::Declared(Declaration::Value(StyleValue::Image(
                Some("themes/dark/img/x.png".to_string())
            ))))
        );
        assert_eq!(
            unit.value(&key("b", None, AttributeId::BACKGROUND_IMAGE)),
            Some(&EntryValue::Declared(Declaration::Value(StyleValue::Image(
                Some("/abs.png".to_string())
            ))))
        );
    }

    #[test]
    fn include_is_rejected_in_modifiers() {
        let mut errors = Vec::new();
        assert!(compile("t", "a:focused { include: b; }", "", &no_vars, &mut errors).is_none());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn inherit_expands_through_shorthands() {
        let unit = compile_ok("a { padding: inherit; }");
        assert_eq!(unit.entries.len(), 4);
        assert!(
            unit.entries
                .iter()
                .all(|(_, v)| *v == EntryValue::Declared(Declaration::Inherit))
        );
    }
}
