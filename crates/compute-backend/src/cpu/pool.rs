// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! 2×2 stride-2 max-pooling kernel.

use crate::Blend;
use tensor_core::TensorShape;

/// Max-pools each plane with a 2×2 window and stride 2.
///
/// Output dimensions come from truncating division, so for odd input
/// planes the last row/column never enters any window.
pub(crate) fn max_pool_2x2(
    src: &[f32],
    dst: &mut [f32],
    src_shape: &TensorShape,
    dst_shape: &TensorShape,
    blend: Blend,
) {
    let (h, w) = (src_shape.h, src_shape.w);
    let (oh, ow) = (dst_shape.h, dst_shape.w);

    for plane_idx in 0..src_shape.n * src_shape.c {
        let plane = &src[plane_idx * h * w..(plane_idx + 1) * h * w];
        let out = &mut dst[plane_idx * oh * ow..(plane_idx + 1) * oh * ow];
        for oy in 0..oh {
            let top = &plane[(2 * oy) * w..];
            let bottom = &plane[(2 * oy + 1) * w..];
            for ox in 0..ow {
                let m = top[2 * ox]
                    .max(top[2 * ox + 1])
                    .max(bottom[2 * ox])
                    .max(bottom[2 * ox + 1]);
                let cell = &mut out[oy * ow + ox];
                *cell = blend.apply(m, *cell);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(src: &[f32], shape: TensorShape) -> (Vec<f32>, TensorShape) {
        let out_shape = shape.pooled_2x2();
        let mut dst = vec![0.0; out_shape.element_count()];
        max_pool_2x2(src, &mut dst, &shape, &out_shape, Blend::OVERWRITE);
        (dst, out_shape)
    }

    #[test]
    fn test_basic_max() {
        let src = vec![
            1.0, 2.0, 5.0, 6.0, //
            3.0, 4.0, 7.0, 8.0, //
            -1.0, -2.0, 0.0, 0.5, //
            -3.0, -4.0, 0.25, 0.75,
        ];
        let (dst, shape) = pool(&src, TensorShape::single(1, 4, 4));
        assert_eq!(shape, TensorShape::new(1, 1, 2, 2));
        assert_eq!(dst, vec![4.0, 8.0, -1.0, 0.75]);
    }

    #[test]
    fn test_odd_dims_drop_trailing() {
        // 3×3 plane: only the top-left 2×2 window exists.
        let src = vec![
            1.0, 2.0, 100.0, //
            3.0, 4.0, 100.0, //
            100.0, 100.0, 100.0,
        ];
        let (dst, shape) = pool(&src, TensorShape::single(1, 3, 3));
        assert_eq!(shape, TensorShape::new(1, 1, 1, 1));
        assert_eq!(dst, vec![4.0]);
    }

    #[test]
    fn test_per_channel_independence() {
        let src = vec![
            // channel 0
            1.0, 2.0, 3.0, 4.0, //
            // channel 1
            -1.0, -2.0, -3.0, -4.0,
        ];
        let (dst, _) = pool(&src, TensorShape::single(2, 2, 2));
        assert_eq!(dst, vec![4.0, -1.0]);
    }

    #[test]
    fn test_negative_values_survive() {
        // All-negative window: max pooling must not clamp to zero.
        let src = vec![-5.0, -2.0, -8.0, -3.0];
        let (dst, _) = pool(&src, TensorShape::single(1, 2, 2));
        assert_eq!(dst, vec![-2.0]);
    }
}
