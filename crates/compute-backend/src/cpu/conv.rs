// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! im2col-based convolution kernel.

use crate::Blend;
use tensor_core::TensorShape;

/// Stride-1, zero-padding cross-correlation.
///
/// For each image in the batch the input is expanded into the workspace as
/// an im2col matrix — one row per `(channel, ky, kx)` filter tap, one
/// column per output position — and each output channel is then a
/// `patch_len`-term saxpy over those rows. The inner loop walks a
/// contiguous output row, which keeps the write stream sequential.
#[allow(clippy::too_many_arguments)]
pub(crate) fn conv_forward(
    src: &[f32],
    filters: &[f32],
    workspace: &mut [f32],
    dst: &mut [f32],
    src_shape: &TensorShape,
    dst_shape: &TensorShape,
    kernel_dim: usize,
    blend: Blend,
) {
    let (c, h, w) = (src_shape.c, src_shape.h, src_shape.w);
    let (out_c, oh, ow) = (dst_shape.c, dst_shape.h, dst_shape.w);
    let spatial = oh * ow;
    let patch_len = c * kernel_dim * kernel_dim;
    let col = &mut workspace[..patch_len * spatial];

    for n in 0..src_shape.n {
        let image = &src[n * c * h * w..(n + 1) * c * h * w];
        im2col(image, col, c, h, w, kernel_dim, oh, ow);

        let out_image = &mut dst[n * out_c * spatial..(n + 1) * out_c * spatial];
        for o in 0..out_c {
            let row = &mut out_image[o * spatial..(o + 1) * spatial];

            // Fold beta in first, then accumulate alpha-scaled taps.
            if blend.beta == 0.0 {
                row.fill(0.0);
            } else if blend.beta != 1.0 {
                row.iter_mut().for_each(|x| *x *= blend.beta);
            }

            let filter = &filters[o * patch_len..(o + 1) * patch_len];
            for (p, &f) in filter.iter().enumerate() {
                let a = blend.alpha * f;
                if a == 0.0 {
                    continue;
                }
                let col_row = &col[p * spatial..(p + 1) * spatial];
                for (r, &v) in row.iter_mut().zip(col_row.iter()) {
                    *r += a * v;
                }
            }
        }
    }
}

/// Expands one image into the im2col matrix.
///
/// Row `(ci·k + ky)·k + kx` holds, for every output position `(oy, ox)`,
/// the input value at `(ci, oy + ky, ox + kx)`.
fn im2col(image: &[f32], col: &mut [f32], c: usize, h: usize, w: usize, k: usize, oh: usize, ow: usize) {
    let spatial = oh * ow;
    for ci in 0..c {
        let plane = &image[ci * h * w..(ci + 1) * h * w];
        for ky in 0..k {
            for kx in 0..k {
                let row = ((ci * k + ky) * k + kx) * spatial;
                for oy in 0..oh {
                    let src_off = (oy + ky) * w + kx;
                    let dst_off = row + oy * ow;
                    col[dst_off..dst_off + ow].copy_from_slice(&plane[src_off..src_off + ow]);
                }
            }
        }
    }
}
