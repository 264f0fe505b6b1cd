// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # compute-backend
//!
//! The accelerated tensor-primitive seam of the inference pipeline, plus a
//! portable CPU reference implementation.
//!
//! The pipeline core never performs numeric work itself: every stage
//! delegates to a [`Backend`] — convolution, 2×2 max pooling, transposed
//! matrix-vector multiply, ReLU, channel-normalised softmax, broadcast bias
//! add, and the host/device copy primitives. The core depends only on the
//! documented numeric contracts (shapes, scale pairs, overwrite-vs-
//! accumulate semantics), never on a backend's implementation.
//!
//! # Scale Pairs
//! Each primitive takes a [`Blend`], the `(alpha, beta)` scale pair that
//! decides whether the destination is overwritten (`beta == 0`) or
//! accumulated into (`beta == 1`):
//!
//! ```text
//! dst[i] = alpha · result[i] + beta · dst[i]
//! ```
//!
//! The pipeline only ever uses the two named constants
//! [`Blend::OVERWRITE`] and [`Blend::ACCUMULATE`].

mod error;

pub mod cpu;

pub use cpu::CpuBackend;
pub use error::BackendError;

use device_memory::DeviceBuffer;
use tensor_core::TensorShape;

/// The `(alpha, beta)` scale pair applied when a primitive writes its
/// destination: `dst = alpha · result + beta · dst`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blend {
    /// Scale on the freshly computed result.
    pub alpha: f32,
    /// Scale on the destination's existing contents.
    pub beta: f32,
}

impl Blend {
    /// Replace the destination's contents: `(1.0, 0.0)`.
    pub const OVERWRITE: Blend = Blend {
        alpha: 1.0,
        beta: 0.0,
    };

    /// Add onto the destination's existing contents: `(1.0, 1.0)`.
    pub const ACCUMULATE: Blend = Blend {
        alpha: 1.0,
        beta: 1.0,
    };

    /// Applies the scale pair to one element.
    #[inline]
    pub fn apply(&self, result: f32, current: f32) -> f32 {
        self.alpha * result + self.beta * current
    }
}

/// The accelerated-primitive backend the pipeline drives.
///
/// Implementations promise the numeric contracts below and nothing more;
/// the pipeline performs all shape inference and buffer sizing before any
/// call, and a backend is free to reject undersized buffers or
/// inconsistent geometry with a [`BackendError`]. Primitive failures are
/// fatal to the classification — the pipeline never retries.
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// Human-readable backend name.
    fn name(&self) -> &'static str;

    /// Returns the workspace size in elements this backend needs for a
    /// stride-1 valid convolution over `src` with a square `kernel_dim`
    /// kernel and `out_channels` filters. May be 0.
    fn conv_workspace_len(
        &self,
        src: &TensorShape,
        kernel_dim: usize,
        out_channels: usize,
    ) -> usize;

    /// Stride-1, zero-padding cross-correlation of `src` with `filters`.
    ///
    /// `filters` is laid out `[out_channels, in_channels, k, k]` row-major.
    /// `dst_shape` must be the shape derived by
    /// [`TensorShape::conv_output`]; `workspace` must hold at least
    /// [`conv_workspace_len`](Backend::conv_workspace_len) elements.
    #[allow(clippy::too_many_arguments)]
    fn conv_forward(
        &self,
        src_shape: &TensorShape,
        dst_shape: &TensorShape,
        kernel_dim: usize,
        filters: &DeviceBuffer,
        src: &DeviceBuffer,
        workspace: &mut DeviceBuffer,
        blend: Blend,
        dst: &mut DeviceBuffer,
    ) -> Result<(), BackendError>;

    /// Adds the per-channel `bias` (shape `(1, c, 1, 1)`) to every element
    /// of `dst`, broadcast across batch and both plane dimensions.
    fn add_bias_broadcast(
        &self,
        dst_shape: &TensorShape,
        bias: &DeviceBuffer,
        blend: Blend,
        dst: &mut DeviceBuffer,
    ) -> Result<(), BackendError>;

    /// 2×2, stride-2 max pooling. `dst_shape` must be
    /// [`TensorShape::pooled_2x2`] of `src_shape`; trailing odd rows and
    /// columns of the input are ignored.
    fn max_pool_2x2(
        &self,
        src_shape: &TensorShape,
        dst_shape: &TensorShape,
        src: &DeviceBuffer,
        blend: Blend,
        dst: &mut DeviceBuffer,
    ) -> Result<(), BackendError>;

    /// Transposed matrix-vector multiply:
    /// `dst[i] = blend.apply(Σ_j matrix[i·inputs + j] · src[j], dst[i])`.
    ///
    /// `matrix` stores one contiguous `inputs`-length row per output
    /// neuron (the transposed-operation layout of the underlying GEMV).
    fn mat_vec_transposed(
        &self,
        inputs: usize,
        outputs: usize,
        matrix: &DeviceBuffer,
        src: &DeviceBuffer,
        blend: Blend,
        dst: &mut DeviceBuffer,
    ) -> Result<(), BackendError>;

    /// Element-wise rectification: negative values clamp to zero.
    fn relu(
        &self,
        shape: &TensorShape,
        src: &DeviceBuffer,
        blend: Blend,
        dst: &mut DeviceBuffer,
    ) -> Result<(), BackendError>;

    /// Numerically stable softmax normalised along the channel axis: for
    /// every `(n, h, w)` position, the values across `c` sum to 1.
    fn softmax_channels(
        &self,
        shape: &TensorShape,
        src: &DeviceBuffer,
        blend: Blend,
        dst: &mut DeviceBuffer,
    ) -> Result<(), BackendError>;

    /// Copies `host` into the start of `dst`.
    fn copy_host_to_device(
        &self,
        host: &[f32],
        dst: &mut DeviceBuffer,
    ) -> Result<(), BackendError>;

    /// Copies the first `len` elements of `src` into `host`.
    fn copy_device_to_host(
        &self,
        src: &DeviceBuffer,
        len: usize,
        host: &mut [f32],
    ) -> Result<(), BackendError>;

    /// Copies the first `len` elements of `src` into the start of `dst`.
    fn copy_device_to_device(
        &self,
        src: &DeviceBuffer,
        len: usize,
        dst: &mut DeviceBuffer,
    ) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_constants() {
        assert_eq!(Blend::OVERWRITE.alpha, 1.0);
        assert_eq!(Blend::OVERWRITE.beta, 0.0);
        assert_eq!(Blend::ACCUMULATE.alpha, 1.0);
        assert_eq!(Blend::ACCUMULATE.beta, 1.0);
    }

    #[test]
    fn test_blend_apply() {
        assert_eq!(Blend::OVERWRITE.apply(3.0, 100.0), 3.0);
        assert_eq!(Blend::ACCUMULATE.apply(3.0, 100.0), 103.0);
    }
}
