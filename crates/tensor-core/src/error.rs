// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for shape propagation.

/// Errors that can occur while deriving a layer's output shape.
#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    /// The convolution kernel does not fit inside the input plane.
    #[error("kernel {kernel_dim}x{kernel_dim} does not fit input plane {height}x{width}")]
    InvalidKernel {
        kernel_dim: usize,
        height: usize,
        width: usize,
    },

    /// The pipeline only supports single-image inference.
    #[error("unsupported batch size {batch}: only batch size 1 is supported")]
    UnsupportedBatch { batch: usize },

    /// The input channel count does not match the layer's weights.
    #[error("channel mismatch: layer expects {expected} input channels, shape has {actual}")]
    ChannelMismatch { expected: usize, actual: usize },

    /// The flattened input length does not match the layer's weights.
    #[error("dimension mismatch: layer expects {expected} inputs, flattened shape has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
