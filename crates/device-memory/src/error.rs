// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for device-memory management.

/// Errors that can occur during device-buffer allocation and management.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// The requested allocation would exceed the device capacity ceiling.
    #[error("out of device memory: requested {requested_elements} elements, but only {available_elements} available (capacity: {capacity_elements})")]
    OutOfMemory {
        requested_elements: usize,
        available_elements: usize,
        capacity_elements: usize,
    },

    /// A capacity string could not be parsed.
    #[error("invalid capacity string: {0}")]
    InvalidCapacity(String),

    /// An internal arena inconsistency was detected.
    #[error("arena integrity error: {0}")]
    ArenaCorruption(String),
}
