// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Intrusive, insertion-ordered list of invalid keys.

use alloc::vec::Vec;

use crate::flags::DirtyFlags;

/// A key that owns a stable link slot.
///
/// Two live keys must never share a slot. Generational handles satisfy this
/// by using their index.
pub trait SlotKey: Copy + Eq {
    /// Returns the link slot of this key.
    fn slot(self) -> u32;
}

impl SlotKey for u32 {
    #[inline]
    fn slot(self) -> u32 {
        self
    }
}

#[derive(Clone, Debug)]
struct Link<K> {
    key: Option<K>,
    flags: DirtyFlags,
    prev: Option<u32>,
    next: Option<u32>,
}

impl<K> Default for Link<K> {
    fn default() -> Self {
        Self {
            key: None,
            flags: DirtyFlags::empty(),
            prev: None,
            next: None,
        }
    }
}

/// Insertion-ordered set of invalid keys with per-key [`DirtyFlags`].
///
/// A key is a member exactly while its flags are non-empty. Marking an
/// existing member only adds flags; it keeps the member's position.
///
/// Like the dirty set it grew out of, the list carries a generation counter
/// bumped on every mutation, which callers can use to detect whether anything
/// was invalidated since a previous observation.
#[derive(Clone, Debug)]
pub struct InvalidList<K> {
    links: Vec<Link<K>>,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
    generation: u64,
}

impl<K: SlotKey> Default for InvalidList<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: SlotKey> InvalidList<K> {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            links: Vec::new(),
            head: None,
            tail: None,
            len: 0,
            generation: 0,
        }
    }

    /// Returns the number of member keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no key is invalid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the mutation counter.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `true` if `key` is a member.
    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.link(key).is_some()
    }

    /// Returns the flags recorded for `key` (empty if not a member).
    #[must_use]
    pub fn flags(&self, key: K) -> DirtyFlags {
        self.link(key).map_or(DirtyFlags::empty(), |l| l.flags)
    }

    /// Returns `true` if any member has any of `flags`.
    #[must_use]
    pub fn has_dirty(&self, flags: DirtyFlags) -> bool {
        self.iter_flags().any(|(_, f)| f.intersects(flags))
    }

    /// Adds `flags` to `key`, appending it to the list if it was not a member.
    ///
    /// Returns `true` if the key was newly linked.
    pub fn mark(&mut self, key: K, flags: DirtyFlags) -> bool {
        if flags.is_empty() {
            return false;
        }
        self.generation = self.generation.wrapping_add(1);
        let slot = key.slot();
        let idx = slot as usize;
        if idx >= self.links.len() {
            self.links.resize_with(idx + 1, Link::default);
        }

        if let Some(existing) = self.links[idx].key {
            if existing == key {
                self.links[idx].flags |= flags;
                return false;
            }
            // A previous occupant of the slot was never removed.
            self.unlink(slot);
        }

        let link = &mut self.links[idx];
        link.key = Some(key);
        link.flags = flags;
        link.prev = self.tail;
        link.next = None;
        match self.tail {
            Some(tail) => self.links[tail as usize].next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.len += 1;
        true
    }

    /// Removes `flags` from `key`, unlinking it once no flag is left.
    ///
    /// Returns the flags that were actually cleared.
    pub fn clear(&mut self, key: K, flags: DirtyFlags) -> DirtyFlags {
        let Some(link) = self.link(key) else {
            return DirtyFlags::empty();
        };
        let cleared = link.flags & flags;
        if cleared.is_empty() {
            return cleared;
        }
        self.generation = self.generation.wrapping_add(1);
        let slot = key.slot();
        let link = &mut self.links[slot as usize];
        link.flags.remove(cleared);
        if link.flags.is_empty() {
            self.unlink(slot);
        }
        cleared
    }

    /// Clears `flags` from `key` and reports whether any of them were set.
    pub fn take(&mut self, key: K, flags: DirtyFlags) -> bool {
        !self.clear(key, flags).is_empty()
    }

    /// Unlinks `key` regardless of its flags.
    pub fn remove_key(&mut self, key: K) -> DirtyFlags {
        let Some(link) = self.link(key) else {
            return DirtyFlags::empty();
        };
        let flags = link.flags;
        self.generation = self.generation.wrapping_add(1);
        self.unlink(key.slot());
        flags
    }

    /// Unlinks every member.
    pub fn clear_all(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.links.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Iterates over members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.iter_flags().map(|(k, _)| k)
    }

    /// Iterates over members and their flags in insertion order.
    pub fn iter_flags(&self) -> impl Iterator<Item = (K, DirtyFlags)> + '_ {
        let mut cursor = self.head;
        core::iter::from_fn(move || {
            let slot = cursor?;
            let link = &self.links[slot as usize];
            cursor = link.next;
            link.key.map(|k| (k, link.flags))
        })
    }

    /// Appends every member having any of `flags` to `out`, in list order.
    ///
    /// `out` is cleared first so a scratch vector can be reused across passes.
    pub fn collect_with(&self, flags: DirtyFlags, out: &mut Vec<K>) {
        out.clear();
        out.extend(
            self.iter_flags()
                .filter(|(_, f)| f.intersects(flags))
                .map(|(k, _)| k),
        );
    }

    fn link(&self, key: K) -> Option<&Link<K>> {
        let link = self.links.get(key.slot() as usize)?;
        (link.key == Some(key)).then_some(link)
    }

    fn unlink(&mut self, slot: u32) {
        let (prev, next) = {
            let link = &mut self.links[slot as usize];
            let pair = (link.prev, link.next);
            *link = Link::default();
            pair
        };
        match prev {
            Some(p) => self.links[p as usize].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.links[n as usize].prev = prev,
            None => self.tail = prev,
        }
        self.len -= 1;
    }
}
