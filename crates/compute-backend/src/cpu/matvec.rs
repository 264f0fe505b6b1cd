// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Transposed matrix-vector multiply kernel.

use crate::Blend;

/// Computes `dst[i] = blend.apply(Σ_j matrix[i·inputs + j] · src[j], dst[i])`.
///
/// The matrix stores one contiguous `inputs`-length row per output neuron,
/// so each output is a single sequential dot product.
pub(crate) fn mat_vec_transposed(
    matrix: &[f32],
    src: &[f32],
    dst: &mut [f32],
    inputs: usize,
    outputs: usize,
    blend: Blend,
) {
    let x = &src[..inputs];
    for i in 0..outputs {
        let row = &matrix[i * inputs..(i + 1) * inputs];
        let acc: f32 = row.iter().zip(x.iter()).map(|(&m, &v)| m * v).sum();
        dst[i] = blend.apply(acc, dst[i]);
    }
}
