// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Portable CPU reference backend.
//!
//! Every primitive is a plain loop nest over slices, written for
//! correctness and reasonable cache behaviour rather than peak throughput.
//! The convolution uses an im2col expansion through the caller-provided
//! workspace followed by a saxpy-ordered filter multiply, which is what
//! gives the conv stage a real workspace requirement to size and scope.

mod activation;
mod conv;
mod matvec;
mod pool;
mod softmax;

use crate::{Backend, BackendError, Blend};
use device_memory::DeviceBuffer;
use tensor_core::TensorShape;

/// The reference backend: device memory is host memory and every primitive
/// runs synchronously on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Fails with [`BackendError::BufferTooSmall`] when `buf` cannot hold
/// `needed` elements.
fn check_len(op: &'static str, buf: &DeviceBuffer, needed: usize) -> Result<(), BackendError> {
    if buf.capacity() < needed {
        return Err(BackendError::BufferTooSmall {
            op,
            needed,
            actual: buf.capacity(),
        });
    }
    Ok(())
}

impl Backend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn conv_workspace_len(
        &self,
        src: &TensorShape,
        kernel_dim: usize,
        _out_channels: usize,
    ) -> usize {
        // im2col matrix for one image: (c·k·k) rows × (oh·ow) columns.
        if kernel_dim == 0 || kernel_dim > src.h || kernel_dim > src.w {
            return 0;
        }
        let oh = src.h - kernel_dim + 1;
        let ow = src.w - kernel_dim + 1;
        src.c * kernel_dim * kernel_dim * oh * ow
    }

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
    ) -> Result<(), BackendError> {
        const OP: &str = "conv_forward";

        if kernel_dim == 0
            || kernel_dim > src_shape.h
            || kernel_dim > src_shape.w
            || dst_shape.n != src_shape.n
            || dst_shape.h != src_shape.h - kernel_dim + 1
            || dst_shape.w != src_shape.w - kernel_dim + 1
        {
            return Err(BackendError::Geometry {
                op: OP,
                detail: format!(
                    "destination {dst_shape} is not the k={kernel_dim} conv output of {src_shape}"
                ),
            });
        }

        let patch_len = src_shape.c * kernel_dim * kernel_dim;
        check_len(OP, src, src_shape.element_count())?;
        check_len(OP, dst, dst_shape.element_count())?;
        check_len(OP, filters, dst_shape.c * patch_len)?;
        let ws_needed = self.conv_workspace_len(src_shape, kernel_dim, dst_shape.c);
        check_len(OP, workspace, ws_needed)?;

        conv::conv_forward(
            src.as_slice(),
            filters.as_slice(),
            workspace.as_mut_slice(),
            dst.as_mut_slice(),
            src_shape,
            dst_shape,
            kernel_dim,
            blend,
        );
        Ok(())
    }

    fn add_bias_broadcast(
        &self,
        dst_shape: &TensorShape,
        bias: &DeviceBuffer,
        blend: Blend,
        dst: &mut DeviceBuffer,
    ) -> Result<(), BackendError> {
        const OP: &str = "add_bias_broadcast";
        check_len(OP, bias, dst_shape.c)?;
        check_len(OP, dst, dst_shape.element_count())?;

        let plane = dst_shape.h * dst_shape.w;
        let dst = dst.as_mut_slice();
        let bias = bias.as_slice();
        for n in 0..dst_shape.n {
            for c in 0..dst_shape.c {
                let base = (n * dst_shape.c + c) * plane;
                let b = bias[c];
                for x in &mut dst[base..base + plane] {
                    *x = blend.apply(b, *x);
                }
            }
        }
        Ok(())
    }

    fn max_pool_2x2(
        &self,
        src_shape: &TensorShape,
        dst_shape: &TensorShape,
        src: &DeviceBuffer,
        blend: Blend,
        dst: &mut DeviceBuffer,
    ) -> Result<(), BackendError> {
        const OP: &str = "max_pool_2x2";

        if dst_shape.n != src_shape.n
            || dst_shape.c != src_shape.c
            || dst_shape.h != src_shape.h / 2
            || dst_shape.w != src_shape.w / 2
        {
            return Err(BackendError::Geometry {
                op: OP,
                detail: format!("destination {dst_shape} is not the 2x2 pool of {src_shape}"),
            });
        }
        check_len(OP, src, src_shape.element_count())?;
        check_len(OP, dst, dst_shape.element_count())?;

        pool::max_pool_2x2(
            src.as_slice(),
            dst.as_mut_slice(),
            src_shape,
            dst_shape,
            blend,
        );
        Ok(())
    }

    fn mat_vec_transposed(
        &self,
        inputs: usize,
        outputs: usize,
        matrix: &DeviceBuffer,
        src: &DeviceBuffer,
        blend: Blend,
        dst: &mut DeviceBuffer,
    ) -> Result<(), BackendError> {
        const OP: &str = "mat_vec_transposed";
        check_len(OP, matrix, inputs * outputs)?;
        check_len(OP, src, inputs)?;
        check_len(OP, dst, outputs)?;

        matvec::mat_vec_transposed(
            matrix.as_slice(),
            src.as_slice(),
            dst.as_mut_slice(),
            inputs,
            outputs,
            blend,
        );
        Ok(())
    }

    fn relu(
        &self,
        shape: &TensorShape,
        src: &DeviceBuffer,
        blend: Blend,
        dst: &mut DeviceBuffer,
    ) -> Result<(), BackendError> {
        const OP: &str = "relu";
        let count = shape.element_count();
        check_len(OP, src, count)?;
        check_len(OP, dst, count)?;

        activation::relu(src.as_slice(), dst.as_mut_slice(), count, blend);
        Ok(())
    }

    fn softmax_channels(
        &self,
        shape: &TensorShape,
        src: &DeviceBuffer,
        blend: Blend,
        dst: &mut DeviceBuffer,
    ) -> Result<(), BackendError> {
        const OP: &str = "softmax_channels";
        let count = shape.element_count();
        check_len(OP, src, count)?;
        check_len(OP, dst, count)?;

        softmax::softmax_channels(src.as_slice(), dst.as_mut_slice(), shape, blend);
        Ok(())
    }

    fn copy_host_to_device(
        &self,
        host: &[f32],
        dst: &mut DeviceBuffer,
    ) -> Result<(), BackendError> {
        check_len("copy_host_to_device", dst, host.len())?;
        dst.as_mut_slice()[..host.len()].copy_from_slice(host);
        Ok(())
    }

    fn copy_device_to_host(
        &self,
        src: &DeviceBuffer,
        len: usize,
        host: &mut [f32],
    ) -> Result<(), BackendError> {
        const OP: &str = "copy_device_to_host";
        check_len(OP, src, len)?;
        if host.len() < len {
            return Err(BackendError::Geometry {
                op: OP,
                detail: format!("host buffer holds {} elements, need {len}", host.len()),
            });
        }
        host[..len].copy_from_slice(&src.as_slice()[..len]);
        Ok(())
    }

    fn copy_device_to_device(
        &self,
        src: &DeviceBuffer,
        len: usize,
        dst: &mut DeviceBuffer,
    ) -> Result<(), BackendError> {
        const OP: &str = "copy_device_to_device";
        check_len(OP, src, len)?;
        check_len(OP, dst, len)?;
        dst.as_mut_slice()[..len].copy_from_slice(&src.as_slice()[..len]);
        Ok(())
    }
}
