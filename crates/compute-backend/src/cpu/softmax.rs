// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Channel-normalised softmax kernel.

use crate::Blend;
use tensor_core::TensorShape;

/// Numerically stable softmax along the channel axis.
///
/// For every `(n, h, w)` position the values across the `c` channels are
/// shifted by their maximum before exponentiation (preventing overflow)
/// and normalised so the group sums to 1. The channel stride in a flat
/// NCHW buffer is `h·w`, so each group is a strided walk.
pub(crate) fn softmax_channels(src: &[f32], dst: &mut [f32], shape: &TensorShape, blend: Blend) {
    let plane = shape.h * shape.w;
    let image = shape.c * plane;

    for n in 0..shape.n {
        for s in 0..plane {
            let base = n * image + s;

            let mut max_val = f32::NEG_INFINITY;
            for c in 0..shape.c {
                max_val = max_val.max(src[base + c * plane]);
            }

            let mut sum = 0.0f32;
            for c in 0..shape.c {
                sum += (src[base + c * plane] - max_val).exp();
            }

            let inv_sum = if sum > 0.0 { 1.0 / sum } else { 0.0 };
            for c in 0..shape.c {
                let idx = base + c * plane;
                let e = (src[idx] - max_val).exp() * inv_sum;
                dst[idx] = blend.apply(e, dst[idx]);
            }
        }
    }
}
