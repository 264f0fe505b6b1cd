// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The five layer operations of the fixed pipeline.
//!
//! Each operation is a stateless value: descriptor configuration lives in
//! the call arguments (shape + weights), never in the operation itself, so
//! one instance is reusable across classifications. Every `forward` follows
//! the same contract:
//!
//! 1. Derive the output shape from the input shape (and weights).
//! 2. Grow the destination scratch buffer to the *post-operation* element
//!    count.
//! 3. Invoke the backend primitives.
//! 4. Return the new shape — the caller threads it to the next stage.
//!
//! Errors carry the stage label handed in by the driver, so a failure
//! anywhere in the chain names the stage that caused it.

use crate::{ConvWeights, DenseWeights, NetworkError};
use compute_backend::{Backend, Blend};
use device_memory::{DeviceArena, ScratchBuffer};
use tensor_core::{ShapeError, TensorShape};

/// Stride-1, zero-padding convolution followed by a broadcast bias add.
#[derive(Debug, Default, Clone, Copy)]
pub struct Convolution;

impl Convolution {
    /// The convolution result replaces the destination's contents.
    const BLEND: Blend = Blend::OVERWRITE;
    /// The bias is added on top of the freshly written result.
    const BIAS_BLEND: Blend = Blend::ACCUMULATE;

    /// Runs the convolution stage.
    ///
    /// The backend's transient workspace is acquired from the arena for
    /// the duration of this call and returned when the function exits,
    /// whether it succeeds or fails.
    #[allow(clippy::too_many_arguments)]
    pub fn forward(
        &self,
        stage: &'static str,
        backend: &dyn Backend,
        arena: &DeviceArena,
        weights: &ConvWeights,
        shape: TensorShape,
        src: &ScratchBuffer,
        dst: &mut ScratchBuffer,
    ) -> Result<TensorShape, NetworkError> {
        if shape.c != weights.in_channels {
            return Err(NetworkError::StageConfig {
                stage,
                source: ShapeError::ChannelMismatch {
                    expected: weights.in_channels,
                    actual: shape.c,
                },
            });
        }

        let out = shape
            .conv_output(weights.kernel_dim, weights.out_channels)
            .map_err(|source| NetworkError::StageConfig { stage, source })?;

        dst.ensure_capacity(out.element_count())?;

        let ws_len = backend.conv_workspace_len(&shape, weights.kernel_dim, weights.out_channels);
        let mut workspace = arena.allocate(ws_len)?;

        backend
            .conv_forward(
                &shape,
                &out,
                weights.kernel_dim,
                &weights.filters,
                src.buffer(),
                &mut workspace,
                Self::BLEND,
                dst.buffer_mut(),
            )
            .map_err(|source| NetworkError::Backend { stage, source })?;

        backend
            .add_bias_broadcast(&out, &weights.bias, Self::BIAS_BLEND, dst.buffer_mut())
            .map_err(|source| NetworkError::Backend { stage, source })?;

        tracing::debug!("{stage}: {shape} -> {out}");
        Ok(out)
    }
}

/// Fixed 2×2, stride-2 max pooling.
#[derive(Debug, Default, Clone, Copy)]
pub struct Pooling;

impl Pooling {
    const BLEND: Blend = Blend::OVERWRITE;

    pub fn forward(
        &self,
        stage: &'static str,
        backend: &dyn Backend,
        shape: TensorShape,
        src: &ScratchBuffer,
        dst: &mut ScratchBuffer,
    ) -> Result<TensorShape, NetworkError> {
        let out = shape.pooled_2x2();
        dst.ensure_capacity(out.element_count())?;

        backend
            .max_pool_2x2(&shape, &out, src.buffer(), Self::BLEND, dst.buffer_mut())
            .map_err(|source| NetworkError::Backend { stage, source })?;

        tracing::debug!("{stage}: {shape} -> {out}");
        Ok(out)
    }
}

/// Fully-connected layer: `output = Wᵀ·input + bias` over the flattened
/// input.
#[derive(Debug, Default, Clone, Copy)]
pub struct FullyConnected;

impl FullyConnected {
    /// The matrix-vector product accumulates onto the preloaded bias.
    ///
    /// The ordering is load-bearing: the bias is copied into the
    /// destination *first*, then the product is added with accumulate
    /// semantics. Reversing it would drop the bias or count it twice.
    const BLEND: Blend = Blend::ACCUMULATE;

    pub fn forward(
        &self,
        stage: &'static str,
        backend: &dyn Backend,
        weights: &DenseWeights,
        shape: TensorShape,
        src: &ScratchBuffer,
        dst: &mut ScratchBuffer,
    ) -> Result<TensorShape, NetworkError> {
        let out = shape
            .flattened(weights.outputs)
            .map_err(|source| NetworkError::StageConfig { stage, source })?;

        let flat = shape.flat_len();
        if flat != weights.inputs {
            return Err(NetworkError::StageConfig {
                stage,
                source: ShapeError::DimensionMismatch {
                    expected: weights.inputs,
                    actual: flat,
                },
            });
        }

        dst.ensure_capacity(out.element_count())?;

        backend
            .copy_device_to_device(&weights.bias, weights.outputs, dst.buffer_mut())
            .map_err(|source| NetworkError::Backend { stage, source })?;

        backend
            .mat_vec_transposed(
                weights.inputs,
                weights.outputs,
                &weights.matrix,
                src.buffer(),
                Self::BLEND,
                dst.buffer_mut(),
            )
            .map_err(|source| NetworkError::Backend { stage, source })?;

        tracing::debug!("{stage}: {shape} -> {out}");
        Ok(out)
    }
}

/// Element-wise rectification. Shape-preserving.
#[derive(Debug, Default, Clone, Copy)]
pub struct Activation;

impl Activation {
    const BLEND: Blend = Blend::OVERWRITE;

    pub fn forward(
        &self,
        stage: &'static str,
        backend: &dyn Backend,
        shape: TensorShape,
        src: &ScratchBuffer,
        dst: &mut ScratchBuffer,
    ) -> Result<TensorShape, NetworkError> {
        dst.ensure_capacity(shape.element_count())?;

        backend
            .relu(&shape, src.buffer(), Self::BLEND, dst.buffer_mut())
            .map_err(|source| NetworkError::Backend { stage, source })?;

        Ok(shape)
    }
}

/// Channel-normalised softmax. Shape-preserving.
#[derive(Debug, Default, Clone, Copy)]
pub struct Softmax;

impl Softmax {
    const BLEND: Blend = Blend::OVERWRITE;

    pub fn forward(
        &self,
        stage: &'static str,
        backend: &dyn Backend,
        shape: TensorShape,
        src: &ScratchBuffer,
        dst: &mut ScratchBuffer,
    ) -> Result<TensorShape, NetworkError> {
        dst.ensure_capacity(shape.element_count())?;

        backend
            .softmax_channels(&shape, src.buffer(), Self::BLEND, dst.buffer_mut())
            .map_err(|source| NetworkError::Backend { stage, source })?;

        Ok(shape)
    }
}
