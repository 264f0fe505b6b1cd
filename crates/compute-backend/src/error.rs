// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for backend primitives.

/// Errors a backend primitive can report.
///
/// All of these are fatal to the in-flight classification; the pipeline
/// propagates them unchanged and never retries.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// A buffer handed to a primitive is smaller than the geometry needs.
    #[error("{op}: buffer too small: needs {needed} elements, has {actual}")]
    BufferTooSmall {
        op: &'static str,
        needed: usize,
        actual: usize,
    },

    /// Shapes or dimensions handed to a primitive are inconsistent.
    #[error("{op}: geometry mismatch: {detail}")]
    Geometry { op: &'static str, detail: String },

    /// The underlying accelerated primitive failed to execute.
    ///
    /// The CPU reference backend never produces this; accelerator-backed
    /// implementations surface driver/launch failures through it.
    #[error("{op}: primitive launch failed: {detail}")]
    Launch { op: &'static str, detail: String },
}
