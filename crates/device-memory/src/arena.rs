// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Arena-style device allocator with capacity enforcement.
//!
//! The [`DeviceArena`] is the central allocator for activation, weight, and
//! workspace buffers. It:
//!
//! 1. Enforces an optional hard ceiling — allocations that would exceed the
//!    configured [`DeviceCapacity`](crate::DeviceCapacity) return
//!    `Err(OutOfMemory)`.
//! 2. Maintains a free list of returned storage, binned by exact element
//!    count, to avoid repeated allocation in the per-classification hot
//!    path.
//! 3. Tracks allocation statistics for profiling.
//!
//! # Free-List Binning
//! Bins are keyed by *exact* element count rather than a rounded size
//! class: scratch-buffer growth must produce a buffer whose capacity equals
//! the request exactly, so an over-sized reuse is never acceptable. The
//! fixed pipeline cycles through a small set of recurring sizes, which an
//! exact-match cache serves well after the first classification.

use crate::{ArenaStats, DeviceBuffer, DeviceCapacity, MemoryError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Internal arena state, shared with buffers via `Arc` so they can return
/// storage on drop without a reference to the full `DeviceArena`.
pub(crate) struct ArenaInner {
    /// Optional ceiling on live elements.
    capacity: DeviceCapacity,
    /// Currently allocated elements (live, not yet returned).
    live_elements: AtomicUsize,
    /// Next handle id. Id 0 is reserved for zero-capacity buffers.
    next_id: AtomicU64,
    /// Free storage cache: element count → returned storage with its id.
    free_storage: Mutex<HashMap<usize, Vec<(u64, Vec<f32>)>>>,
    /// Total elements held in the free list.
    free_elements: AtomicUsize,
    /// Statistics (behind a Mutex since updates are infrequent).
    stats: Mutex<ArenaStats>,
}

impl ArenaInner {
    /// Called by `DeviceBuffer::drop` to return storage to the free list.
    pub(crate) fn return_storage(&self, id: u64, storage: Vec<f32>) {
        let elements = storage.len();
        self.live_elements.fetch_sub(elements, Ordering::Release);
        self.free_elements.fetch_add(elements, Ordering::Release);

        if let Ok(mut stats) = self.stats.lock() {
            stats.record_release();
        }

        if let Ok(mut free) = self.free_storage.lock() {
            free.entry(elements).or_default().push((id, storage));
        }
    }
}

/// The allocator for device buffers.
///
/// Cloning an arena is cheap and yields a handle to the same underlying
/// allocator state.
///
/// # Example
/// ```
/// use device_memory::{DeviceArena, DeviceCapacity};
///
/// let arena = DeviceArena::new(DeviceCapacity::from_elements(1024));
///
/// let buf = arena.allocate(256).unwrap();
/// assert_eq!(arena.live_elements(), 256);
///
/// // Storage is returned when the buffer is dropped.
/// drop(buf);
/// assert_eq!(arena.live_elements(), 0);
/// ```
#[derive(Clone)]
pub struct DeviceArena {
    inner: Arc<ArenaInner>,
}

impl DeviceArena {
    /// Creates a new arena with the given capacity ceiling.
    pub fn new(capacity: DeviceCapacity) -> Self {
        Self {
            inner: Arc::new(ArenaInner {
                capacity,
                live_elements: AtomicUsize::new(0),
                next_id: AtomicU64::new(1),
                free_storage: Mutex::new(HashMap::new()),
                free_elements: AtomicUsize::new(0),
                stats: Mutex::new(ArenaStats::default()),
            }),
        }
    }

    /// Creates an arena with no capacity ceiling.
    pub fn unbounded() -> Self {
        Self::new(DeviceCapacity::unbounded())
    }

    /// Allocates a zeroed buffer of exactly `elements` elements.
    ///
    /// Zero-element requests succeed and yield an empty buffer — the
    /// pipeline's scratch buffers start at capacity 0 and grow on first
    /// use. For non-zero requests, storage is reused from the free list
    /// when a bin of the exact size is available; otherwise fresh storage
    /// is allocated under a new handle id.
    ///
    /// # Errors
    /// Returns [`MemoryError::OutOfMemory`] if the allocation would push
    /// live elements past the capacity ceiling.
    pub fn allocate(&self, elements: usize) -> Result<DeviceBuffer, MemoryError> {
        if elements == 0 {
            return Ok(self.empty());
        }

        // Check the ceiling.
        let live = self.inner.live_elements.load(Ordering::Acquire);
        if let Some(ceiling) = self.inner.capacity.as_elements() {
            if live + elements > ceiling {
                if let Ok(mut stats) = self.inner.stats.lock() {
                    stats.record_oom();
                }
                return Err(MemoryError::OutOfMemory {
                    requested_elements: elements,
                    available_elements: ceiling.saturating_sub(live),
                    capacity_elements: ceiling,
                });
            }
        }

        // Try to reuse storage of the exact size from the free list.
        let mut reused = None;
        if let Ok(mut free) = self.inner.free_storage.lock() {
            if let Some(bin) = free.get_mut(&elements) {
                if let Some((id, mut storage)) = bin.pop() {
                    storage.fill(0.0);
                    self.inner.free_elements.fetch_sub(elements, Ordering::Release);
                    reused = Some((id, storage));
                }
            }
        }

        let is_hit = reused.is_some();
        let (id, storage) = reused.unwrap_or_else(|| {
            let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
            (id, vec![0.0f32; elements])
        });

        self.inner.live_elements.fetch_add(elements, Ordering::Release);

        if let Ok(mut stats) = self.inner.stats.lock() {
            if is_hit {
                stats.record_reuse_hit(elements);
            } else {
                stats.record_reuse_miss(elements);
            }
            let live_now = self.inner.live_elements.load(Ordering::Acquire);
            stats.update_peak(live_now);
        }

        tracing::trace!("allocated {elements} elements (id {id}, reuse hit: {is_hit})");
        Ok(DeviceBuffer::new(id, storage, Arc::clone(&self.inner)))
    }

    /// Returns a zero-capacity buffer (no accounting, shared id 0).
    pub fn empty(&self) -> DeviceBuffer {
        DeviceBuffer::new(0, Vec::new(), Arc::clone(&self.inner))
    }

    /// Returns the number of elements currently allocated (live).
    pub fn live_elements(&self) -> usize {
        self.inner.live_elements.load(Ordering::Acquire)
    }

    /// Returns the number of elements remaining before the ceiling, or
    /// `usize::MAX` for an unbounded arena.
    pub fn available_elements(&self) -> usize {
        match self.inner.capacity.as_elements() {
            Some(ceiling) => ceiling.saturating_sub(self.live_elements()),
            None => usize::MAX,
        }
    }

    /// Returns the configured capacity ceiling.
    pub fn capacity(&self) -> DeviceCapacity {
        self.inner.capacity
    }

    /// Returns a snapshot of allocation statistics.
    pub fn stats(&self) -> ArenaStats {
        self.inner
            .stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Returns the number of elements held in the free list.
    pub fn free_list_elements(&self) -> usize {
        self.inner.free_elements.load(Ordering::Acquire)
    }

    /// Evicts all cached free storage.
    ///
    /// Live buffers are unaffected — only the free list is cleared.
    pub fn shrink(&self) {
        if let Ok(mut free) = self.inner.free_storage.lock() {
            free.clear();
            self.inner.free_elements.store(0, Ordering::Release);
        }
    }
}

impl std::fmt::Debug for DeviceArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceArena")
            .field("capacity", &self.inner.capacity)
            .field("live_elements", &self.live_elements())
            .field("free_list_elements", &self.free_list_elements())
            .finish()
    }
}
