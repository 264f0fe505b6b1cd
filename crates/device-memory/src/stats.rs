// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Allocation statistics for profiling and diagnostics.
//!
//! [`ArenaStats`] tracks cumulative metrics about arena usage: reuse rates,
//! peak live elements, and OOM events. The pipeline's resource tests lean
//! on the allocation/release counters to prove nothing leaks across
//! classifications or on failure paths.

/// Cumulative statistics about device-arena usage.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ArenaStats {
    /// Total number of allocation requests (excluding zero-sized ones).
    pub total_allocations: u64,
    /// Allocations served from the free list.
    pub reuse_hits: u64,
    /// Allocations that required fresh storage.
    pub reuse_misses: u64,
    /// Allocation requests rejected by the capacity ceiling.
    pub oom_count: u64,
    /// Peak live elements.
    pub peak_live_elements: usize,
    /// Total elements ever allocated (including reused storage).
    pub cumulative_allocated_elements: u64,
    /// Total number of buffer returns (drops).
    pub total_releases: u64,
}

impl ArenaStats {
    /// Returns the free-list reuse ratio as a fraction in `[0.0, 1.0]`.
    ///
    /// Returns `0.0` if no allocations have been made.
    pub fn reuse_ratio(&self) -> f64 {
        let total = self.reuse_hits + self.reuse_misses;
        if total == 0 {
            return 0.0;
        }
        self.reuse_hits as f64 / total as f64
    }

    /// Records an allocation served from the free list.
    pub(crate) fn record_reuse_hit(&mut self, elements: usize) {
        self.total_allocations += 1;
        self.reuse_hits += 1;
        self.cumulative_allocated_elements += elements as u64;
    }

    /// Records an allocation that required fresh storage.
    pub(crate) fn record_reuse_miss(&mut self, elements: usize) {
        self.total_allocations += 1;
        self.reuse_misses += 1;
        self.cumulative_allocated_elements += elements as u64;
    }

    /// Records an OOM event.
    pub(crate) fn record_oom(&mut self) {
        self.total_allocations += 1;
        self.oom_count += 1;
    }

    /// Records a buffer return.
    pub(crate) fn record_release(&mut self) {
        self.total_releases += 1;
    }

    /// Updates the peak-live high-water mark if needed.
    pub(crate) fn update_peak(&mut self, current_elements: usize) {
        if current_elements > self.peak_live_elements {
            self.peak_live_elements = current_elements;
        }
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        let peak_kb = (self.peak_live_elements * 4) as f64 / 1024.0;
        format!(
            "Device allocations: {} total ({} reused, {} fresh, {:.0}% reuse), \
             {} OOMs, peak {:.1} KB, {} releases",
            self.total_allocations,
            self.reuse_hits,
            self.reuse_misses,
            self.reuse_ratio() * 100.0,
            self.oom_count,
            peak_kb,
            self.total_releases,
        )
    }
}
