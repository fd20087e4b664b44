// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for handle recycling across typed handles.

use trellis_handle::{GenerationCheck, Handle, HandleManager, RawHandle};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct ImageHandle(RawHandle);

impl Handle for ImageHandle {
    fn from_raw(raw: RawHandle) -> Self {
        Self(raw)
    }

    fn to_raw(self) -> RawHandle {
        self.0
    }
}

#[derive(Debug, PartialEq)]
struct Image {
    width: u32,
    height: u32,
}

#[test]
fn typed_handles_round_trip_objects() {
    let mut images = HandleManager::<ImageHandle, Image>::new();
    let h = images.create_handle();
    images
        .associate_object_with_handle(
            h,
            Image {
                width: 16,
                height: 8,
            },
        )
        .unwrap();

    let image = images.get_associated_object_mut(h).unwrap();
    image.width = 32;
    assert_eq!(
        images.get_associated_object(h),
        Some(&Image {
            width: 32,
            height: 8
        })
    );
}

#[test]
fn free_list_is_last_in_first_out() {
    let mut m = HandleManager::<ImageHandle, ()>::new();
    let a = m.create_handle();
    let b = m.create_handle();
    m.delete_handle(a);
    m.delete_handle(b);

    assert_eq!(m.create_handle().index(), b.index());
    assert_eq!(m.create_handle().index(), a.index());
}

#[test]
fn strict_manager_tracks_liveness_per_generation() {
    let mut m = HandleManager::<ImageHandle, u8>::with_generation_check(GenerationCheck::Strict);
    let first = m.create_handle();
    m.delete_handle(first);
    let second = m.create_handle();

    assert!(!m.is_alive(first));
    assert!(m.is_alive(second));
    // Deleting through the stale handle must not free the new occupant.
    assert_eq!(m.delete_handle(first), None);
    assert!(m.is_alive(second));
}
