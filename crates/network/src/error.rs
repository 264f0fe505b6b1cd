// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the inference pipeline.
//!
//! A classification either fully succeeds or fully fails; every variant
//! here is fatal to the in-flight call, and stage-scoped variants carry the
//! name of the stage that failed.

/// Errors that can occur while building or running the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// A stage's geometry preconditions were violated (bad kernel/input
    /// combination, unsupported batch size, weight/shape mismatch).
    #[error("configuration error in stage '{stage}': {source}")]
    StageConfig {
        stage: &'static str,
        #[source]
        source: tensor_core::ShapeError,
    },

    /// A backend primitive failed during a stage. Not retried.
    #[error("backend failure in stage '{stage}': {source}")]
    Backend {
        stage: &'static str,
        #[source]
        source: compute_backend::BackendError,
    },

    /// Device-buffer allocation or growth failed.
    #[error("device memory error: {0}")]
    Memory(#[from] device_memory::MemoryError),

    /// Failed to load weights for a layer.
    #[error("weight loading failed for layer '{layer}': {detail}")]
    WeightLoad { layer: String, detail: String },

    /// Failed to load or decode the input image.
    #[error("image loading failed for '{path}': {detail}")]
    ImageLoad { path: String, detail: String },

    /// Pipeline configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
