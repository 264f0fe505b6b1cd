// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # device-memory
//!
//! Device-buffer allocation and lifecycle management for the inference
//! pipeline.
//!
//! # Key Components
//!
//! - [`DeviceCapacity`] — an optional ceiling on live device memory, with
//!   human-readable parsing (`"64M"`, `"1G"`, etc.).
//! - [`DeviceArena`] — the allocator: hands out [`DeviceBuffer`]s, enforces
//!   the capacity ceiling, keeps returned storage in an exact-size free
//!   list, and tracks statistics.
//! - [`DeviceBuffer`] — an RAII handle to device storage with a stable id.
//!   When a buffer is dropped its storage is automatically returned to the
//!   arena, so transient per-stage scratch (e.g. the convolution workspace)
//!   is released at scope exit on success and failure paths alike.
//! - [`ScratchBuffer`] — a grow-only resizable buffer for layer outputs.
//!   Capacity never shrinks; a resize request at or below the current
//!   capacity reuses the storage in place.
//! - [`ArenaStats`] — cumulative allocator metrics.
//!
//! # Ownership Model
//!
//! ```text
//! DeviceArena::allocate(len)
//!       │
//!       ▼
//!   DeviceBuffer  ◄─── owns Vec<f32>, holds Arc<ArenaInner>
//!       │
//!       │  drop()
//!       ▼
//!   ArenaInner::return_storage()  ──► free list (exact-size bins)
//! ```
//!
//! The arena hands out buffers; each buffer holds an `Arc` back to the
//! arena's inner state and returns its storage on drop. Dropping the
//! pipeline therefore releases every owned buffer deterministically.
//!
//! # Example
//! ```
//! use device_memory::{DeviceArena, ScratchBuffer};
//!
//! let arena = DeviceArena::unbounded();
//! let mut scratch = ScratchBuffer::new(&arena);
//!
//! scratch.ensure_capacity(1024).unwrap();
//! let id = scratch.buffer().id();
//!
//! // Smaller request: same storage, same handle.
//! scratch.ensure_capacity(512).unwrap();
//! assert_eq!(scratch.buffer().id(), id);
//! assert_eq!(scratch.capacity(), 1024);
//! ```

mod arena;
mod buffer;
mod capacity;
mod error;
mod scratch;
mod stats;

pub use arena::DeviceArena;
pub use buffer::DeviceBuffer;
pub use capacity::DeviceCapacity;
pub use error::MemoryError;
pub use scratch::ScratchBuffer;
pub use stats::ArenaStats;
