// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! RAII device-buffer handles that return storage to the arena on drop.
//!
//! [`DeviceBuffer`] is the mechanism through which Rust's ownership model
//! enforces the pipeline's deterministic-release contract. When a buffer is
//! dropped — at the end of a convolution stage's workspace scope, during a
//! scratch-buffer resize, or when the whole pipeline is torn down — its
//! storage goes back to the arena's free list and the live-element counter
//! is decremented. The borrow checker prevents use-after-release.

use crate::arena::ArenaInner;
use std::sync::Arc;

/// A device-resident buffer of `f32` elements.
///
/// Buffers are created only by [`DeviceArena`](crate::DeviceArena) and carry
/// a stable handle id assigned when their storage is first allocated. The id
/// survives round trips through the arena's free list, so tests can observe
/// whether a resize reused storage or allocated fresh storage.
///
/// The reference implementation backs device memory with host memory; the
/// compute backend treats the contents as opaque and only its copy
/// primitives move data across the host/device boundary.
pub struct DeviceBuffer {
    /// Stable handle id. Id 0 is reserved for zero-capacity buffers.
    id: u64,
    /// The storage. Wrapped in `Option` so `drop()` can `take()` it.
    data: Option<Vec<f32>>,
    /// Handle back to the arena for release accounting.
    arena: Arc<ArenaInner>,
}

impl DeviceBuffer {
    /// Creates a buffer (called internally by the arena).
    pub(crate) fn new(id: u64, data: Vec<f32>, arena: Arc<ArenaInner>) -> Self {
        Self {
            id,
            data: Some(data),
            arena,
        }
    }

    /// Returns the stable handle id. Zero-capacity buffers share id 0.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the buffer's capacity in elements.
    pub fn capacity(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    /// Returns `true` for a zero-capacity buffer.
    pub fn is_empty(&self) -> bool {
        self.capacity() == 0
    }

    /// Returns an immutable view of the device contents.
    pub fn as_slice(&self) -> &[f32] {
        self.data.as_deref().expect("buffer already consumed")
    }

    /// Returns a mutable view of the device contents.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        self.data.as_deref_mut().expect("buffer already consumed")
    }
}

impl Drop for DeviceBuffer {
    fn drop(&mut self) {
        if let Some(storage) = self.data.take() {
            if !storage.is_empty() {
                self.arena.return_storage(self.id, storage);
            }
        }
    }
}

impl std::fmt::Debug for DeviceBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("id", &self.id)
            .field("capacity", &self.capacity())
            .finish()
    }
}
