// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The style server: classes, variables, and the stack of loaded scripts.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use hashbrown::HashMap;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use trellis_handle::{GenerationCheck, HandleManager};

use crate::attribute::{AttributeId, AttributeName, lookup};
use crate::class::{ClassId, ClassKind, Declaration, StateModifier, StyleClass};
use crate::compiler::{self, CompiledUnit, EntryValue, SlotKey, Target};
use crate::error::{CompileError, ErrorSink, LoadError, StyleError};
use crate::script::is_ident;
use crate::shorthand;
use crate::value::StyleValue;

/// Name of the class every element carries at the bottom of its stack.
pub const DEFAULT_CLASS: &str = "default";
/// Name of the class the root element carries above [`DEFAULT_CLASS`].
pub const ROOT_CLASS: &str = "root";

/// Class slots and structure touched since the last
/// [`StyleServer::take_changes`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleChanges {
    slots: Vec<(ClassId, AttributeId)>,
    removed: Vec<ClassId>,
    structure: bool,
}

impl StyleChanges {
    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty() && self.removed.is_empty() && !self.structure
    }

    /// Changed `(class, attribute)` slots, sorted and deduplicated.
    #[must_use]
    pub fn slots(&self) -> &[(ClassId, AttributeId)] {
        &self.slots
    }

    /// Classes that were deleted.
    #[must_use]
    pub fn removed_classes(&self) -> &[ClassId] {
        &self.removed
    }

    /// Whether class creation, deletion, modifiers, or include lists changed,
    /// so element stacks must be re-expanded.
    #[must_use]
    pub fn structure_changed(&self) -> bool {
        self.structure
    }
}

/// Forwards diagnostics while counting them.
struct Counted<'a> {
    sink: &'a mut dyn ErrorSink,
    count: usize,
}

impl ErrorSink for Counted<'_> {
    fn report(&mut self, error: CompileError) {
        warn!(
            source = %error.source,
            line = error.line,
            "style script error: {}",
            error.message
        );
        self.count += 1;
        self.sink.report(error);
    }
}

/// Owns every [`StyleClass`] and variable, and the stack of loaded scripts.
///
/// Scripts compose like a stack: for each `(class, modifier, attribute)` slot
/// the most recently loaded script that sets it wins, and unloading any
/// script restores what the remaining scripts say.
///
/// Mutations are not pushed anywhere; they accumulate as [`StyleChanges`] for
/// the owner of the element stacks to drain.
#[derive(Debug)]
pub struct StyleServer {
    classes: HandleManager<ClassId, StyleClass>,
    names: HashMap<String, ClassId>,
    variables: HashMap<String, String>,
    units: Vec<CompiledUnit>,
    defaults: Vec<StyleValue>,
    default_class: ClassId,
    root_class: ClassId,
    changes: StyleChanges,
}

impl Default for StyleServer {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleServer {
    /// Creates a server holding only the built-in `default` and `root` classes.
    ///
    /// `default` sets every inheriting attribute to `inherit` and every other
    /// attribute to its default; `root` sets every attribute to a concrete
    /// default so inheritance always terminates at the root element.
    ///
    /// # Panics
    ///
    /// Panics if a row of the attribute table has a default that does not
    /// parse, which is a bug in the table. Associating the two built-in
    /// classes with handles fresh from an empty manager cannot fail.
    #[must_use]
    pub fn new() -> Self {
        let defaults: Vec<StyleValue> = AttributeId::all()
            .map(|id| {
                let info = id.info();
                info.kind
                    .parse(info.default)
                    .unwrap_or_else(|e| panic!("bad default for `{}`: {e}", info.name))
            })
            .collect();

        let mut classes = HandleManager::with_generation_check(GenerationCheck::Strict);
        let mut builtin = |name: &str, concrete: bool| {
            let id: ClassId = classes.create_handle();
            let mut class = StyleClass::new(name.to_string(), ClassKind::Normal, &defaults);
            class.builtin = true;
            for attr in AttributeId::all() {
                let declaration = if attr.info().inherits && !concrete {
                    Declaration::Inherit
                } else {
                    Declaration::Value(defaults[attr.index()].clone())
                };
                class.attributes[attr.index()].declare(declaration);
            }
            classes
                .associate_object_with_handle(id, class)
                .expect("fresh handle from an empty manager");
            id
        };
        let default_class = builtin(DEFAULT_CLASS, false);
        let root_class = builtin(ROOT_CLASS, true);

        let mut names = HashMap::new();
        names.insert(DEFAULT_CLASS.to_string(), default_class);
        names.insert(ROOT_CLASS.to_string(), root_class);

        Self {
            classes,
            names,
            variables: HashMap::new(),
            units: Vec::new(),
            defaults,
            default_class,
            root_class,
            changes: StyleChanges::default(),
        }
    }

    /// The built-in class at the bottom of every element's stack.
    #[must_use]
    pub fn default_class(&self) -> ClassId {
        self.default_class
    }

    /// The built-in class carried by the root element.
    #[must_use]
    pub fn root_class(&self) -> ClassId {
        self.root_class
    }

    /// The default value of `attribute`.
    #[must_use]
    pub fn default_value(&self, attribute: AttributeId) -> &StyleValue {
        &self.defaults[attribute.index()]
    }

    /// Looks up a named class.
    #[must_use]
    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.names.get(name).copied()
    }

    /// Returns a live class.
    #[must_use]
    pub fn class(&self, id: ClassId) -> Option<&StyleClass> {
        self.classes.get_associated_object(id)
    }

    /// Names of every named class, in no particular order.
    pub fn class_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.keys().map(String::as_str)
    }

    /// Every live class, including modifiers.
    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &StyleClass)> + '_ {
        self.classes.iterate_associated_objects()
    }

    /// The modifier of `class` for `state`, if it exists.
    #[must_use]
    pub fn modifier(&self, class: ClassId, state: StateModifier) -> Option<ClassId> {
        self.class(class)?.modifier(state)
    }

    /// A variable's text.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    /// Sets a variable for subsequent loads and attribute sets.
    ///
    /// Values already substituted into classes are not revisited.
    pub fn set_variable(&mut self, name: &str, value: &str) -> Result<(), StyleError> {
        if !is_ident(name) {
            return Err(StyleError::InvalidName(name.to_string()));
        }
        self.variables
            .insert(name.to_string(), value.trim().to_string());
        Ok(())
    }

    /// Identifiers of loaded scripts, oldest first.
    pub fn loaded_scripts(&self) -> impl Iterator<Item = &str> + '_ {
        self.units.iter().map(|u| u.id.as_str())
    }

    /// Drains the accumulated change report.
    pub fn take_changes(&mut self) -> StyleChanges {
        let mut changes = core::mem::take(&mut self.changes);
        changes.slots.sort_unstable();
        changes.slots.dedup();
        changes
    }

    /// Returns `true` if a change report is waiting.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Creates (or fetches) a class that unloading scripts never deletes.
    pub fn create_style_class(&mut self, name: &str) -> Result<ClassId, StyleError> {
        if !is_ident(name) {
            return Err(StyleError::InvalidName(name.to_string()));
        }
        let id = self.get_or_create(name).ok_or(StyleError::ClassLimit)?;
        if let Some(class) = self.classes.get_associated_object_mut(id) {
            class.programmatic = true;
        }
        Ok(id)
    }

    /// Creates (or fetches) the `state` modifier of `class`.
    pub fn create_modifier(
        &mut self,
        class: ClassId,
        state: StateModifier,
    ) -> Result<ClassId, StyleError> {
        match self.class(class).map(StyleClass::kind) {
            Some(ClassKind::Normal) => {}
            Some(ClassKind::Modifier { .. }) | None => {
                return Err(StyleError::UnknownClass(format!("{class:?}")));
            }
        }
        self.get_or_create_modifier(class, state)
            .ok_or(StyleError::ClassLimit)
    }

    /// Drops the programmatic mark of a class and deletes it unless a loaded
    /// script still defines it. Built-in classes cannot be removed.
    pub fn remove_style_class(&mut self, name: &str) -> bool {
        let Some(id) = self.class_id(name) else {
            return false;
        };
        let Some(class) = self.classes.get_associated_object_mut(id) else {
            return false;
        };
        if class.builtin {
            return false;
        }
        class.programmatic = false;
        if self.units.iter().any(|u| u.mentions_class(name)) {
            return false;
        }
        self.delete_class(id);
        true
    }

    /// Replaces the include list of a normal class.
    pub fn set_includes(&mut self, class: ClassId, includes: &[&str]) -> Result<(), StyleError> {
        if let Some(bad) = includes.iter().find(|name| !is_ident(name)) {
            return Err(StyleError::InvalidName((*bad).to_string()));
        }
        let list = includes.iter().map(|s| (*s).to_string()).collect();
        match self.class(class).map(StyleClass::kind) {
            Some(ClassKind::Normal) => {
                self.write_includes(class, list);
                Ok(())
            }
            _ => Err(StyleError::UnknownClass(format!("{class:?}"))),
        }
    }

    /// Sets a primitive or compound attribute on a class from text.
    ///
    /// The empty string unsets, `inherit` defers to the parent element, and
    /// every `$name` token is replaced by that variable. Anything else is
    /// parsed for the attribute; on error nothing changes.
    pub fn set_style_attribute(
        &mut self,
        class: ClassId,
        name: &str,
        value: &str,
    ) -> Result<(), StyleError> {
        if self.class(class).is_none() {
            return Err(StyleError::UnknownClass(format!("{class:?}")));
        }
        let value = value.trim();
        let result = if value.is_empty() {
            self.unset_attribute(class, name)
        } else {
            let raw = compiler::substitute(value, |var| self.variables.get(var).cloned())
                .map_err(StyleError::UnknownVariable)?;
            compiler::declarations(name, &raw, "").map(|list| {
                for (id, declaration) in list {
                    self.write_slot(class, id, Some(declaration));
                }
            })
        };
        if let Err(error) = &result {
            debug!(attribute = name, value, "rejected style attribute: {error}");
        }
        result
    }

    fn unset_attribute(&mut self, class: ClassId, name: &str) -> Result<(), StyleError> {
        let ids: SmallVec<[AttributeId; 8]> =
            match lookup(name).ok_or_else(|| StyleError::UnknownAttribute(name.to_string()))? {
                AttributeName::Primitive(id) => smallvec::smallvec![id],
                AttributeName::Shorthand(info) => info.components().collect(),
            };
        for id in ids {
            self.write_slot(class, id, None);
        }
        Ok(())
    }

    /// Serializes an attribute of a class.
    ///
    /// Returns `Ok(None)` if the slot is unset. Compound attributes rebuild a
    /// compact token string and are `None` when their components cannot be
    /// expressed together.
    pub fn get_style_attribute(
        &self,
        class: ClassId,
        name: &str,
    ) -> Result<Option<String>, StyleError> {
        let class = self
            .class(class)
            .ok_or_else(|| StyleError::UnknownClass(format!("{class:?}")))?;
        match lookup(name).ok_or_else(|| StyleError::UnknownAttribute(name.to_string()))? {
            AttributeName::Primitive(id) => {
                let slot = class.attribute(id);
                Ok(slot.declaration().map(|d| match d {
                    Declaration::Inherit => "inherit".to_string(),
                    Declaration::Value(v) => v.to_string(),
                }))
            }
            AttributeName::Shorthand(info) => {
                Ok(shorthand::collapse(info, |id| class.attribute(id)))
            }
        }
    }

    /// Compiles `text` and merges it on top of every loaded script.
    ///
    /// Diagnostics go to `sink`. If there are any, nothing is modified.
    /// Relative image paths are joined onto `base_dir`.
    pub fn load_script(
        &mut self,
        id: &str,
        text: &str,
        base_dir: &str,
        sink: &mut dyn ErrorSink,
    ) -> Result<(), LoadError> {
        let mut counted = Counted { sink, count: 0 };
        let variables = &self.variables;
        let known = |name: &str| variables.get(name).cloned();
        let Some(unit) = compiler::compile(id, text, base_dir, &known, &mut counted) else {
            return Err(LoadError {
                source: id.to_string(),
                errors: counted.count,
            });
        };

        for (name, value) in &unit.variables {
            self.variables.insert(name.clone(), value.clone());
        }
        for (class, modifier) in &unit.classes {
            let created = match modifier {
                None => self.get_or_create(class),
                Some(state) => self
                    .get_or_create(class)
                    .and_then(|owner| self.get_or_create_modifier(owner, *state)),
            };
            if created.is_none() {
                warn!(class = %class, "style class limit reached; rules for it are ignored");
            }
        }
        for (key, value) in &unit.entries {
            self.apply(key, Some(value));
        }
        debug!(
            script = id,
            classes = unit.classes.len(),
            entries = unit.entries.len(),
            "loaded style script"
        );
        self.units.push(unit);
        Ok(())
    }

    /// Unloads the most recent script loaded as `id`.
    ///
    /// Each slot it set is left alone if a later script also sets it,
    /// restored from the nearest earlier script that sets it, or cleared.
    /// Classes no longer defined by any script are deleted unless they were
    /// created with [`StyleServer::create_style_class`].
    ///
    /// Returns `false` if no such script is loaded.
    pub fn unload_script(&mut self, id: &str) -> bool {
        let Some(pos) = self.units.iter().rposition(|u| u.id == id) else {
            return false;
        };
        let unit = self.units.remove(pos);
        let (earlier, later) = self.units.split_at(pos);

        let mut restores: Vec<(&SlotKey, Option<EntryValue>)> = Vec::new();
        for (key, _) in &unit.entries {
            if later.iter().any(|u| u.value(key).is_some()) {
                continue;
            }
            let previous = earlier.iter().rev().find_map(|u| u.value(key)).cloned();
            restores.push((key, previous));
        }
        let mut variables: Vec<(&str, Option<String>)> = Vec::new();
        for (name, _) in &unit.variables {
            if later.iter().any(|u| u.variable(name).is_some()) {
                continue;
            }
            let previous = earlier
                .iter()
                .rev()
                .find_map(|u| u.variable(name))
                .map(ToString::to_string);
            variables.push((name, previous));
        }

        for (key, value) in restores {
            self.apply(key, value.as_ref());
        }
        for (name, value) in variables {
            match value {
                Some(v) => self.variables.insert(name.to_string(), v),
                None => self.variables.remove(name),
            };
        }

        for (class, _) in &unit.classes {
            if self.units.iter().any(|u| u.mentions_class(class)) {
                continue;
            }
            if let Some(cid) = self.class_id(class)
                && let Some(c) = self.class(cid)
                && !c.programmatic
                && !c.builtin
            {
                self.delete_class(cid);
            }
        }
        debug!(script = id, "unloaded style script");
        true
    }

    fn get_or_create(&mut self, name: &str) -> Option<ClassId> {
        if let Some(id) = self.class_id(name) {
            return Some(id);
        }
        let id = self.alloc(StyleClass::new(
            name.to_string(),
            ClassKind::Normal,
            &self.defaults,
        ))?;
        self.names.insert(name.to_string(), id);
        trace!(class = name, "created style class");
        Some(id)
    }

    fn get_or_create_modifier(&mut self, owner: ClassId, state: StateModifier) -> Option<ClassId> {
        let class = self.class(owner)?;
        if let Some(existing) = class.modifier(state) {
            return Some(existing);
        }
        let modifier = StyleClass::new(
            class.name.clone(),
            ClassKind::Modifier { owner, state },
            &self.defaults,
        );
        let id = self.alloc(modifier)?;
        if let Some(class) = self.classes.get_associated_object_mut(owner) {
            class.modifiers[state.index()] = Some(id);
        }
        Some(id)
    }

    fn alloc(&mut self, class: StyleClass) -> Option<ClassId> {
        let id: ClassId = self.classes.create_handle();
        self.classes.associate_object_with_handle(id, class).ok()?;
        self.changes.structure = true;
        Some(id)
    }

    fn delete_class(&mut self, id: ClassId) {
        let Some(class) = self.classes.delete_handle(id) else {
            return;
        };
        for modifier in class.modifiers.into_iter().flatten() {
            self.classes.delete_handle(modifier);
            self.changes.removed.push(modifier);
        }
        if class.kind == ClassKind::Normal {
            self.names.remove(&class.name);
        }
        self.changes.removed.push(id);
        self.changes.structure = true;
        trace!(class = %class.name, "deleted style class");
    }

    fn resolve_key(&self, key: &SlotKey) -> Option<ClassId> {
        let class = self.class_id(&key.class)?;
        match key.modifier {
            None => Some(class),
            Some(state) => self.modifier(class, state),
        }
    }

    fn apply(&mut self, key: &SlotKey, value: Option<&EntryValue>) {
        let Some(class) = self.resolve_key(key) else {
            return;
        };
        match (key.target, value) {
            (Target::Attribute(id), Some(EntryValue::Declared(declaration))) => {
                self.write_slot(class, id, Some(declaration.clone()));
            }
            (Target::Attribute(id), _) => self.write_slot(class, id, None),
            (Target::Includes, Some(EntryValue::Includes(list))) => {
                self.write_includes(class, list.clone());
            }
            (Target::Includes, _) => self.write_includes(class, Vec::new()),
        }
    }

    /// The declaration a built-in class falls back to when unset.
    fn baseline(&self, class: ClassId, id: AttributeId) -> Option<Declaration> {
        if class == self.root_class {
            Some(Declaration::Value(self.defaults[id.index()].clone()))
        } else if class == self.default_class {
            Some(if id.info().inherits {
                Declaration::Inherit
            } else {
                Declaration::Value(self.defaults[id.index()].clone())
            })
        } else {
            None
        }
    }

    fn write_slot(&mut self, class: ClassId, id: AttributeId, declaration: Option<Declaration>) {
        let declaration = declaration.or_else(|| self.baseline(class, id));
        let default = self.defaults[id.index()].clone();
        let Some(target) = self.classes.get_associated_object_mut(class) else {
            return;
        };
        let slot = &mut target.attributes[id.index()];
        let changed = match declaration {
            Some(d) => slot.declare(d),
            None => slot.clear(default),
        };
        if changed {
            self.changes.slots.push((class, id));
        }
    }

    fn write_includes(&mut self, class: ClassId, includes: Vec<String>) {
        if let Some(target) = self.classes.get_associated_object_mut(class)
            && target.includes != includes
        {
            target.includes = includes;
            self.changes.structure = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorStack;
    use crate::value::{Color, Length, Size};

    fn load(server: &mut StyleServer, id: &str, text: &str) {
        let mut errors = ErrorStack::new();
        server
            .load_script(id, text, "", &mut errors)
            .unwrap_or_else(|e| panic!("{e}: {:?}", errors.last_error()));
    }

    fn get(server: &StyleServer, class: &str, name: &str) -> Option<String> {
        let id = server.class_id(class).unwrap();
        server.get_style_attribute(id, name).unwrap()
    }

    #[test]
    fn builtin_root_class_is_fully_concrete() {
        let server = StyleServer::new();
        let root = server.class(server.root_class()).unwrap();
        assert!(AttributeId::all().all(|id| {
            let slot = root.attribute(id);
            slot.is_set() && !slot.is_inherit()
        }));
        let default = server.class(server.default_class()).unwrap();
        assert!(default.attribute(AttributeId::COLOR).is_inherit());
        assert!(!default.attribute(AttributeId::WIDTH).is_inherit());
    }

    #[test]
    fn load_creates_classes_and_modifiers() {
        let mut server = StyleServer::new();
        load(&mut server, "a", "button { width: 10px; } button:hovered { color: red; }");
        let button = server.class_id("button").unwrap();
        let hovered = server.modifier(button, StateModifier::Hovered).unwrap();
        assert_eq!(
            server.class(hovered).unwrap().attribute(AttributeId::COLOR).value(),
            &StyleValue::Color(Color::rgb(255, 0, 0))
        );
        assert_eq!(get(&server, "button", "width").as_deref(), Some("10px"));
        let changes = server.take_changes();
        assert!(changes.structure_changed());
        assert!(changes.slots().contains(&(button, AttributeId::WIDTH)));
        assert!(server.take_changes().is_empty());
    }

    #[test]
    fn failed_load_changes_nothing() {
        let mut server = StyleServer::new();
        load(&mut server, "a", "x { width: 1px; }");
        server.take_changes();
        let mut errors = ErrorStack::new();
        let err = server
            .load_script("b", "x { width: 2px; height: wide; } y { }", "", &mut errors)
            .unwrap_err();
        assert_eq!(err.errors, 1);
        assert_eq!(errors.last_error().unwrap().line, 1);
        assert_eq!(get(&server, "x", "width").as_deref(), Some("1px"));
        assert!(server.class_id("y").is_none());
        assert!(server.take_changes().is_empty());
        assert_eq!(server.loaded_scripts().collect::<Vec<_>>(), ["a"]);
    }

    #[test]
    fn unloading_the_top_script_restores_the_previous_values() {
        let mut server = StyleServer::new();
        load(&mut server, "a", "x { width: 1px; color: red; }");
        load(&mut server, "b", "x { width: 2px; height: 3px; }");
        assert_eq!(get(&server, "x", "width").as_deref(), Some("2px"));

        assert!(server.unload_script("b"));
        assert_eq!(get(&server, "x", "width").as_deref(), Some("1px"));
        assert_eq!(get(&server, "x", "height"), None);
        assert_eq!(get(&server, "x", "color").as_deref(), Some("#ff0000"));
        assert!(!server.unload_script("b"));
    }

    #[test]
    fn unloading_a_buried_script_keeps_later_values() {
        let mut server = StyleServer::new();
        load(&mut server, "a", "x { width: 1px; color: red; } only-a { width: 5px; }");
        load(&mut server, "b", "x { width: 2px; }");

        assert!(server.unload_script("a"));
        assert_eq!(get(&server, "x", "width").as_deref(), Some("2px"));
        assert_eq!(get(&server, "x", "color"), None);
        assert!(server.class_id("only-a").is_none());
        let changes = server.take_changes();
        assert!(!changes.removed_classes().is_empty());
    }

    #[test]
    fn three_layers_restore_the_nearest_earlier_value() {
        let mut server = StyleServer::new();
        load(&mut server, "a", "x { width: 1px; }");
        load(&mut server, "b", "x { width: 2px; }");
        load(&mut server, "c", "x { width: 3px; }");
        assert!(server.unload_script("c"));
        assert_eq!(get(&server, "x", "width").as_deref(), Some("2px"));
        assert!(server.unload_script("a"));
        assert_eq!(get(&server, "x", "width").as_deref(), Some("2px"));
        assert!(server.unload_script("b"));
        assert!(server.class_id("x").is_none());
    }

    #[test]
    fn programmatic_classes_survive_unload() {
        let mut server = StyleServer::new();
        let x = server.create_style_class("x").unwrap();
        load(&mut server, "a", "x { width: 1px; }");
        assert_eq!(server.class_id("x"), Some(x));
        server.unload_script("a");
        assert_eq!(server.class_id("x"), Some(x));
        assert_eq!(get(&server, "x", "width"), None);
        assert!(server.remove_style_class("x"));
        assert!(server.class(x).is_none());
    }

    #[test]
    fn set_handles_unset_inherit_and_variables() {
        let mut server = StyleServer::new();
        let x = server.create_style_class("x").unwrap();
        server.set_variable("gap", "6px").unwrap();

        server.set_style_attribute(x, "margin-left", "$gap").unwrap();
        assert_eq!(get(&server, "x", "margin-left").as_deref(), Some("6px"));

        server.set_style_attribute(x, "color", "inherit").unwrap();
        assert_eq!(get(&server, "x", "color").as_deref(), Some("inherit"));

        server.set_style_attribute(x, "color", "").unwrap();
        assert_eq!(get(&server, "x", "color"), None);

        assert_eq!(
            server.set_style_attribute(x, "width", "$missing"),
            Err(StyleError::UnknownVariable("missing".to_string()))
        );
    }

    #[test]
    fn rejected_sets_keep_the_previous_value() {
        let mut server = StyleServer::new();
        let x = server.create_style_class("x").unwrap();
        server.set_style_attribute(x, "width", "40px").unwrap();
        server.take_changes();

        assert!(matches!(
            server.set_style_attribute(x, "width", "forty"),
            Err(StyleError::InvalidValue { attribute: "width", .. })
        ));
        assert!(matches!(
            server.set_style_attribute(x, "margin", "1px 2px x"),
            Err(StyleError::InvalidValue { attribute: "margin", .. })
        ));
        assert_eq!(
            server.set_style_attribute(x, "wdith", "1px"),
            Err(StyleError::UnknownAttribute("wdith".to_string()))
        );
        assert_eq!(get(&server, "x", "width").as_deref(), Some("40px"));
        assert_eq!(get(&server, "x", "margin"), None);
        assert!(server.take_changes().is_empty());
    }

    #[test]
    fn shorthand_set_then_get_components() {
        let mut server = StyleServer::new();
        let x = server.create_style_class("x").unwrap();
        server.set_style_attribute(x, "border", "2px red").unwrap();
        for side in ["left", "right", "top", "bottom"] {
            assert_eq!(
                get(&server, "x", &format!("border-{side}-width")).as_deref(),
                Some("2px")
            );
            assert_eq!(
                get(&server, "x", &format!("border-{side}-color")).as_deref(),
                Some("#ff0000")
            );
        }
        assert_eq!(get(&server, "x", "border").as_deref(), Some("2px #ff0000"));

        server
            .set_style_attribute(x, "border-width", "1px 2px 3px 4px")
            .unwrap();
        let text = get(&server, "x", "border-width").unwrap();
        assert_eq!(text, "1px 2px 3px 4px");
        assert_eq!(get(&server, "x", "border"), None);
    }

    #[test]
    fn unsetting_a_builtin_restores_its_baseline() {
        let mut server = StyleServer::new();
        let root = server.root_class();
        server.set_style_attribute(root, "font-size", "20px").unwrap();
        server.set_style_attribute(root, "font-size", "").unwrap();
        let slot = server.class(root).unwrap().attribute(AttributeId::FONT_SIZE);
        assert!(slot.is_set());
        assert_eq!(slot.value(), &StyleValue::Length(Length::Px(14.0)));
    }

    #[test]
    fn unload_restores_includes_and_variables() {
        let mut server = StyleServer::new();
        load(&mut server, "a", "$w: 1px; x { include: y; }");
        load(&mut server, "b", "$w: 2px; x { include: z; }");
        let x = server.class_id("x").unwrap();
        assert_eq!(server.class(x).unwrap().includes(), ["z"]);
        assert_eq!(server.variable("w"), Some("2px"));
        server.unload_script("b");
        assert_eq!(server.class(x).unwrap().includes(), ["y"]);
        assert_eq!(server.variable("w"), Some("1px"));
        server.unload_script("a");
        assert_eq!(server.variable("w"), None);
    }

    #[test]
    fn modifiers_are_deleted_with_their_owner() {
        let mut server = StyleServer::new();
        load(&mut server, "a", "x:pushed { width: 1px; }");
        let x = server.class_id("x").unwrap();
        let pushed = server.modifier(x, StateModifier::Pushed).unwrap();
        server.unload_script("a");
        assert!(server.class(pushed).is_none());
        assert!(server.class(x).is_none());
        let changes = server.take_changes();
        assert!(changes.removed_classes().contains(&pushed));
        assert!(changes.removed_classes().contains(&x));
    }

    #[test]
    fn sizes_survive_a_reload_cycle() {
        let mut server = StyleServer::new();
        load(&mut server, "a", "x { width: 50%; }");
        let x = server.class_id("x").unwrap();
        assert_eq!(
            server.class(x).unwrap().attribute(AttributeId::WIDTH).value(),
            &StyleValue::Size(Size::Percent(50.0))
        );
    }
}
