// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slot storage and free-list recycling for handles.

use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

use crate::handle::{Handle, RawHandle};

/// Maximum number of slots a manager can ever allocate (`2^24`).
pub const MAX_SLOTS: usize = 1 << 24;

/// Generation given to a freshly allocated slot.
const FIRST_GENERATION: u8 = 1;

/// How lookups treat the generation encoded in a handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum GenerationCheck {
    /// Only the slot's occupancy is checked; the generation is ignored.
    ///
    /// A stale handle to a recycled slot resolves to whatever object is
    /// associated with that slot now.
    #[default]
    Lenient,
    /// The handle's generation must equal the slot's current generation.
    Strict,
}

/// Why a handle could not be used.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HandleError {
    /// The null handle was passed.
    Null,
    /// The index does not name an allocated slot.
    OutOfRange(RawHandle),
    /// The slot has been deleted and not handed out again.
    Released(RawHandle),
    /// The generation does not match the slot (strict checking only).
    Stale(RawHandle),
}

impl fmt::Display for HandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null handle"),
            Self::OutOfRange(h) => write!(f, "handle {h:?} is out of range"),
            Self::Released(h) => write!(f, "handle {h:?} refers to a released slot"),
            Self::Stale(h) => write!(f, "handle {h:?} is stale"),
        }
    }
}

impl core::error::Error for HandleError {}

#[derive(Debug)]
struct Slot<T> {
    generation: u8,
    allocated: bool,
    object: Option<T>,
}

/// Allocator for recyclable handles with an associated object per slot.
///
/// `H` is the handle type handed out (see [`Handle`]); `T` is the object
/// type stored against each handle.
///
/// See the [crate documentation](crate) for the recycling rules.
pub struct HandleManager<H, T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    limit: usize,
    check: GenerationCheck,
    live: usize,
    _marker: PhantomData<fn() -> H>,
}

impl<H, T: fmt::Debug> fmt::Debug for HandleManager<H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleManager")
            .field("slots", &self.slots.len())
            .field("free", &self.free.len())
            .field("limit", &self.limit)
            .field("check", &self.check)
            .field("live", &self.live)
            .finish_non_exhaustive()
    }
}

impl<H: Handle, T> Default for HandleManager<H, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Handle, T> HandleManager<H, T> {
    /// Creates an empty manager with lenient generation checking.
    #[must_use]
    pub fn new() -> Self {
        Self::with_generation_check(GenerationCheck::Lenient)
    }

    /// Creates an empty manager with the given generation checking mode.
    #[must_use]
    pub fn with_generation_check(check: GenerationCheck) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            limit: MAX_SLOTS,
            check,
            live: 0,
            _marker: PhantomData,
        }
    }

    /// Lowers the number of slots that may ever be allocated.
    ///
    /// The limit is clamped to [`MAX_SLOTS`].
    #[must_use]
    pub fn with_slot_limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(MAX_SLOTS);
        self
    }

    /// Returns the generation checking mode.
    #[must_use]
    pub fn generation_check(&self) -> GenerationCheck {
        self.check
    }

    /// Returns the number of handles currently allocated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if no handle is currently allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Returns the number of slots ever allocated, including retired ones.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of handles that can still be created.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.limit.saturating_sub(self.slots.len()) + self.free.len()
    }

    /// Returns the number of slots waiting on the free list.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Allocates a handle.
    ///
    /// Reuses the most recently freed slot if there is one, otherwise appends
    /// a new slot. Returns the null handle once the slot limit is exhausted.
    pub fn create_handle(&mut self) -> H {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation += 1;
            slot.allocated = true;
            self.live += 1;
            return H::from_raw(RawHandle::new(index, slot.generation));
        }

        if self.slots.len() >= self.limit {
            return H::null();
        }

        #[expect(clippy::cast_possible_truncation, reason = "bounded by MAX_SLOTS")]
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: FIRST_GENERATION,
            allocated: true,
            object: None,
        });
        self.live += 1;
        H::from_raw(RawHandle::new(index, FIRST_GENERATION))
    }

    /// Deletes a handle, returning the object that was associated with it.
    ///
    /// The slot goes back on the free list unless its generation is
    /// exhausted, in which case it is retired for good. Deleting a null,
    /// out-of-range, or already deleted handle does nothing.
    pub fn delete_handle(&mut self, handle: H) -> Option<T> {
        let raw = handle.to_raw();
        let index = self.validate(raw).ok()?;
        let slot = &mut self.slots[index];
        slot.allocated = false;
        let object = slot.object.take();
        self.live -= 1;
        if slot.generation < u8::MAX {
            self.free.push(raw.index());
        }
        object
    }

    /// Associates `object` with `handle`, returning the previous object.
    pub fn associate_object_with_handle(
        &mut self,
        handle: H,
        object: T,
    ) -> Result<Option<T>, HandleError> {
        let index = self.validate(handle.to_raw())?;
        Ok(self.slots[index].object.replace(object))
    }

    /// Returns the object associated with `handle`.
    ///
    /// Returns `None` for the null handle, an out-of-range index, or a slot
    /// without an object (deleted, or created but not yet associated).
    #[must_use]
    pub fn get_associated_object(&self, handle: H) -> Option<&T> {
        let index = self.lookup(handle.to_raw())?;
        self.slots[index].object.as_ref()
    }

    /// Mutable variant of [`HandleManager::get_associated_object`].
    #[must_use]
    pub fn get_associated_object_mut(&mut self, handle: H) -> Option<&mut T> {
        let index = self.lookup(handle.to_raw())?;
        self.slots[index].object.as_mut()
    }

    /// Returns `true` if `handle` names an allocated slot.
    #[must_use]
    pub fn is_alive(&self, handle: H) -> bool {
        self.validate(handle.to_raw()).is_ok()
    }

    /// Iterates over every slot that currently has an associated object.
    ///
    /// Handles are yielded with the slot's current generation, in index order.
    pub fn iterate_associated_objects(&self) -> impl Iterator<Item = (H, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            #[expect(clippy::cast_possible_truncation, reason = "bounded by MAX_SLOTS")]
            let raw = RawHandle::new(index as u32, slot.generation);
            slot.object.as_ref().map(|object| (H::from_raw(raw), object))
        })
    }

    /// Returns the handle currently occupying slot `index`, if allocated.
    #[must_use]
    pub fn handle_at(&self, index: u32) -> Option<H> {
        let slot = self.slots.get(index as usize)?;
        slot.allocated
            .then(|| H::from_raw(RawHandle::new(index, slot.generation)))
    }

    fn lookup(&self, raw: RawHandle) -> Option<usize> {
        if raw.is_null() {
            return None;
        }
        let index = raw.index() as usize;
        let slot = self.slots.get(index)?;
        if self.check == GenerationCheck::Strict && slot.generation != raw.generation() {
            return None;
        }
        Some(index)
    }

    fn validate(&self, raw: RawHandle) -> Result<usize, HandleError> {
        if raw.is_null() {
            return Err(HandleError::Null);
        }
        let index = raw.index() as usize;
        let Some(slot) = self.slots.get(index) else {
            return Err(HandleError::OutOfRange(raw));
        };
        if !slot.allocated {
            return Err(HandleError::Released(raw));
        }
        if self.check == GenerationCheck::Strict && slot.generation != raw.generation() {
            return Err(HandleError::Stale(raw));
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    type Manager = HandleManager<RawHandle, u32>;

    #[test]
    fn first_handle_is_not_null() {
        let mut m = Manager::new();
        let h = m.create_handle();
        assert!(!h.is_null());
        assert_eq!(h.index(), 0);
        assert_eq!(h.generation(), 1);
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn created_but_unassociated_resolves_to_none() {
        let mut m = Manager::new();
        let h = m.create_handle();
        assert!(m.is_alive(h));
        assert_eq!(m.get_associated_object(h), None);
    }

    #[test]
    fn null_and_out_of_range_resolve_to_none() {
        let mut m = Manager::new();
        let _ = m.create_handle();
        assert_eq!(m.get_associated_object(RawHandle::NULL), None);
        assert_eq!(m.get_associated_object(RawHandle::new(40, 1)), None);
        assert_eq!(
            m.associate_object_with_handle(RawHandle::new(40, 1), 3),
            Err(HandleError::OutOfRange(RawHandle::new(40, 1)))
        );
        assert_eq!(
            m.associate_object_with_handle(RawHandle::NULL, 3),
            Err(HandleError::Null)
        );
    }

    #[test]
    fn delete_returns_object_and_clears_slot() {
        let mut m = Manager::new();
        let h = m.create_handle();
        m.associate_object_with_handle(h, 7).unwrap();
        assert_eq!(m.delete_handle(h), Some(7));
        assert_eq!(m.get_associated_object(h), None);
        assert!(!m.is_alive(h));
        assert!(m.is_empty());
    }

    #[test]
    fn double_delete_does_not_duplicate_free_slot() {
        let mut m = Manager::new();
        let h = m.create_handle();
        m.delete_handle(h);
        m.delete_handle(h);
        assert_eq!(m.free_count(), 1);
    }

    #[test]
    fn recycled_slot_bumps_generation() {
        let mut m = Manager::new();
        let h = m.create_handle();
        m.delete_handle(h);
        let again = m.create_handle();
        assert_eq!(again.index(), h.index());
        assert_eq!(again.generation(), h.generation() + 1);
    }

    #[test]
    fn lenient_lookup_aliases_recycled_slot() {
        let mut m = Manager::new();
        let old = m.create_handle();
        m.delete_handle(old);
        let new = m.create_handle();
        m.associate_object_with_handle(new, 9).unwrap();
        assert_eq!(m.get_associated_object(old), Some(&9));
    }

    #[test]
    fn strict_lookup_rejects_stale_generation() {
        let mut m = Manager::with_generation_check(GenerationCheck::Strict);
        let old = m.create_handle();
        m.delete_handle(old);
        let new = m.create_handle();
        m.associate_object_with_handle(new, 9).unwrap();
        assert_eq!(m.get_associated_object(old), None);
        assert_eq!(m.get_associated_object(new), Some(&9));
        assert_eq!(
            m.associate_object_with_handle(old, 1),
            Err(HandleError::Stale(old))
        );
    }

    #[test]
    fn slot_retires_after_generation_255() {
        let mut m = Manager::new();
        let mut h = m.create_handle();
        for _ in 0..254 {
            m.delete_handle(h);
            h = m.create_handle();
            assert_eq!(h.index(), 0);
        }
        assert_eq!(h.generation(), 255);

        // The 255th delete must not return the slot to the free list.
        m.delete_handle(h);
        assert_eq!(m.free_count(), 0);
        let next = m.create_handle();
        assert_eq!(next.index(), 1);
        assert_eq!(next.generation(), 1);
    }

    #[test]
    fn exhaustion_returns_null() {
        let mut m = Manager::new().with_slot_limit(2);
        assert!(!m.create_handle().is_null());
        let second = m.create_handle();
        assert!(!second.is_null());
        assert!(m.create_handle().is_null());
        assert_eq!(m.capacity(), 0, "both slots are live");

        // Recycling still works after exhaustion.
        m.delete_handle(second);
        assert_eq!(m.capacity(), 1, "the freed slot can be reused");
        assert_eq!(m.create_handle().index(), 1);
    }

    #[test]
    fn iterate_visits_only_associated_slots() {
        let mut m = Manager::new();
        let a = m.create_handle();
        let _b = m.create_handle();
        let c = m.create_handle();
        m.associate_object_with_handle(a, 1).unwrap();
        m.associate_object_with_handle(c, 3).unwrap();

        let seen: Vec<_> = m
            .iterate_associated_objects()
            .map(|(h, v)| (h.index(), *v))
            .collect();
        assert_eq!(seen, [(0, 1), (2, 3)]);
    }

    #[test]
    fn handle_at_reports_current_generation() {
        let mut m = Manager::new();
        let h = m.create_handle();
        assert_eq!(m.handle_at(0), Some(h));
        m.delete_handle(h);
        assert_eq!(m.handle_at(0), None);
        assert_eq!(m.handle_at(5), None);
    }
}
