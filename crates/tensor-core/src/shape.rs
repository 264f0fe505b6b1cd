// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! NCHW shape descriptors and per-layer output-shape derivation.

use crate::ShapeError;
use std::fmt;

/// The 4-D shape of an activation tensor flowing through the pipeline,
/// in NCHW order (batch, channels, height, width).
///
/// Shapes are immutable `Copy` values: each layer operation derives its
/// output shape from the input shape and returns the new value, so no
/// shared mutable shape state exists anywhere in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TensorShape {
    /// Batch size. The pipeline only ever runs with `n == 1`.
    pub n: usize,
    /// Channel count (feature maps).
    pub c: usize,
    /// Plane height.
    pub h: usize,
    /// Plane width.
    pub w: usize,
}

impl TensorShape {
    /// Creates a shape from explicit NCHW dimensions.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::TensorShape;
    /// let s = TensorShape::new(1, 20, 24, 24);
    /// assert_eq!(s.element_count(), 20 * 24 * 24);
    /// ```
    pub fn new(n: usize, c: usize, h: usize, w: usize) -> Self {
        Self { n, c, h, w }
    }

    /// Creates a single-image shape: `(1, c, h, w)`.
    pub fn single(c: usize, h: usize, w: usize) -> Self {
        Self { n: 1, c, h, w }
    }

    /// Returns the total number of elements (`n·c·h·w`).
    pub fn element_count(&self) -> usize {
        self.n * self.c * self.h * self.w
    }

    /// Returns `Ok(())` when the batch dimension is exactly 1.
    pub fn require_single_batch(&self) -> Result<(), ShapeError> {
        if self.n == 1 {
            Ok(())
        } else {
            Err(ShapeError::UnsupportedBatch { batch: self.n })
        }
    }

    /// Derives the output shape of a stride-1, zero-padding convolution
    /// with a square `kernel_dim` kernel and `out_channels` filters:
    /// `(n, out_channels, h − k + 1, w − k + 1)`.
    ///
    /// # Errors
    /// Returns [`ShapeError::InvalidKernel`] when the kernel is empty or
    /// larger than either input plane dimension (which would produce a
    /// negative output dimension).
    pub fn conv_output(
        &self,
        kernel_dim: usize,
        out_channels: usize,
    ) -> Result<TensorShape, ShapeError> {
        if kernel_dim == 0 || kernel_dim > self.h || kernel_dim > self.w {
            return Err(ShapeError::InvalidKernel {
                kernel_dim,
                height: self.h,
                width: self.w,
            });
        }
        Ok(TensorShape {
            n: self.n,
            c: out_channels,
            h: self.h - kernel_dim + 1,
            w: self.w - kernel_dim + 1,
        })
    }

    /// Derives the output shape of the fixed 2×2, stride-2 max pooling:
    /// `(n, c, h / 2, w / 2)` with truncating division.
    ///
    /// Odd plane dimensions drop the trailing row/column. This matches the
    /// pooling primitive's window placement and is intentional, not a
    /// rounding bug.
    pub fn pooled_2x2(&self) -> TensorShape {
        TensorShape {
            n: self.n,
            c: self.c,
            h: self.h / 2,
            w: self.w / 2,
        }
    }

    /// Derives the output shape of a fully-connected layer that collapses
    /// `(c, h, w)` into a flat vector and emits `outputs` values:
    /// `(1, outputs, 1, 1)`.
    ///
    /// # Errors
    /// Returns [`ShapeError::UnsupportedBatch`] when `n != 1`.
    pub fn flattened(&self, outputs: usize) -> Result<TensorShape, ShapeError> {
        self.require_single_batch()?;
        Ok(TensorShape {
            n: 1,
            c: outputs,
            h: 1,
            w: 1,
        })
    }

    /// Returns the flat vector length a fully-connected layer sees: `c·h·w`.
    pub fn flat_len(&self) -> usize {
        self.c * self.h * self.w
    }
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.n, self.c, self.h, self.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_count() {
        let s = TensorShape::single(1, 28, 28);
        assert_eq!(s.element_count(), 784);
        assert_eq!(s.flat_len(), 784);
    }

    #[test]
    fn test_conv_output_dims() {
        let s = TensorShape::single(1, 28, 28);
        let out = s.conv_output(5, 20).unwrap();
        assert_eq!(out, TensorShape::new(1, 20, 24, 24));
    }

    #[test]
    fn test_conv_output_all_valid_kernels() {
        // outputDim = inputDim − k + 1 must hold for every kernel that fits.
        let s = TensorShape::single(3, 11, 9);
        for k in 1..=9 {
            let out = s.conv_output(k, 7).unwrap();
            assert_eq!(out.h, 11 - k + 1);
            assert_eq!(out.w, 9 - k + 1);
            assert_eq!(out.c, 7);
            assert_eq!(out.n, 1);
        }
    }

    #[test]
    fn test_conv_kernel_too_large() {
        let s = TensorShape::single(1, 8, 12);
        // Taller than the plane.
        assert!(matches!(
            s.conv_output(9, 4),
            Err(ShapeError::InvalidKernel { kernel_dim: 9, .. })
        ));
        // Wider than the plane.
        let s = TensorShape::single(1, 12, 8);
        assert!(matches!(
            s.conv_output(9, 4),
            Err(ShapeError::InvalidKernel { .. })
        ));
    }

    #[test]
    fn test_conv_zero_kernel() {
        let s = TensorShape::single(1, 8, 8);
        assert!(s.conv_output(0, 4).is_err());
    }

    #[test]
    fn test_conv_kernel_equals_plane() {
        // k == h == w collapses the plane to 1×1.
        let s = TensorShape::single(2, 6, 6);
        let out = s.conv_output(6, 10).unwrap();
        assert_eq!(out, TensorShape::new(1, 10, 1, 1));
    }

    #[test]
    fn test_pooled_even_dims() {
        let s = TensorShape::new(1, 20, 24, 24);
        assert_eq!(s.pooled_2x2(), TensorShape::new(1, 20, 12, 12));
    }

    #[test]
    fn test_pooled_truncates_odd_dims() {
        // Documented behaviour: the trailing row/column is dropped.
        let s = TensorShape::new(1, 4, 27, 27);
        assert_eq!(s.pooled_2x2(), TensorShape::new(1, 4, 13, 13));

        let s = TensorShape::new(1, 1, 1, 5);
        assert_eq!(s.pooled_2x2(), TensorShape::new(1, 1, 0, 2));
    }

    #[test]
    fn test_flattened() {
        let s = TensorShape::new(1, 50, 4, 4);
        let out = s.flattened(500).unwrap();
        assert_eq!(out, TensorShape::new(1, 500, 1, 1));
    }

    #[test]
    fn test_flattened_rejects_batch() {
        let s = TensorShape::new(2, 50, 4, 4);
        assert!(matches!(
            s.flattened(500),
            Err(ShapeError::UnsupportedBatch { batch: 2 })
        ));
    }

    #[test]
    fn test_require_single_batch() {
        assert!(TensorShape::single(1, 4, 4).require_single_batch().is_ok());
        assert!(TensorShape::new(8, 1, 4, 4).require_single_batch().is_err());
    }

    #[test]
    fn test_display() {
        let s = TensorShape::new(1, 20, 24, 24);
        assert_eq!(format!("{s}"), "[1, 20, 24, 24]");
    }

    #[test]
    fn test_serde_roundtrip() {
        let s = TensorShape::new(1, 50, 8, 8);
        let json = serde_json::to_string(&s).unwrap();
        let back: TensorShape = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
