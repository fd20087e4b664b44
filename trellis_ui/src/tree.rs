// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lookup of elements by their string id.

use hashbrown::HashMap;

use crate::element::ElementId;
use crate::error::TreeError;

/// Index from element ids to elements.
///
/// Ids are unique within a document. An element without an id is not
/// indexed.
#[derive(Clone, Debug, Default)]
pub struct ElementTree {
    ids: HashMap<String, ElementId>,
}

impl ElementTree {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if no id is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Registers `id` for `element`.
    ///
    /// Fails with [`TreeError::DuplicateId`] if another element already uses
    /// it. Registering the same pair twice is a no-op.
    pub fn insert(&mut self, id: &str, element: ElementId) -> Result<(), TreeError> {
        match self.ids.get(id) {
            Some(&existing) if existing == element => Ok(()),
            Some(_) => Err(TreeError::DuplicateId(id.to_owned())),
            None => {
                self.ids.insert(id.to_owned(), element);
                Ok(())
            }
        }
    }

    /// Unregisters `id` if it currently names `element`.
    pub fn remove(&mut self, id: &str, element: ElementId) -> bool {
        if self.ids.get(id) == Some(&element) {
            self.ids.remove(id);
            true
        } else {
            false
        }
    }

    /// The element registered under `id`.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<ElementId> {
        self.ids.get(id).copied()
    }

    /// Every indexed pair, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ElementId)> + '_ {
        self.ids.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
