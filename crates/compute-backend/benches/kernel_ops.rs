// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for the CPU reference kernels at the default topology sizes.

use compute_backend::{Backend, Blend, CpuBackend};
use criterion::{criterion_group, criterion_main, Criterion};
use device_memory::DeviceArena;
use tensor_core::TensorShape;

fn bench_conv_forward(c: &mut Criterion) {
    let backend = CpuBackend::new();
    let arena = DeviceArena::unbounded();

    // First conv layer of the default topology: 1×28×28, k=5, 20 features.
    let src_shape = TensorShape::single(1, 28, 28);
    let dst_shape = src_shape.conv_output(5, 20).unwrap();

    let src = arena.allocate(src_shape.element_count()).unwrap();
    let filters = arena.allocate(20 * 25).unwrap();
    let mut workspace = arena
        .allocate(backend.conv_workspace_len(&src_shape, 5, 20))
        .unwrap();
    let mut dst = arena.allocate(dst_shape.element_count()).unwrap();

    c.bench_function("conv_forward 28x28 k5 c20", |b| {
        b.iter(|| {
            backend
                .conv_forward(
                    &src_shape,
                    &dst_shape,
                    5,
                    &filters,
                    &src,
                    &mut workspace,
                    Blend::OVERWRITE,
                    &mut dst,
                )
                .unwrap();
        })
    });
}

fn bench_mat_vec(c: &mut Criterion) {
    let backend = CpuBackend::new();
    let arena = DeviceArena::unbounded();

    // First fully-connected layer: 800 → 500.
    let matrix = arena.allocate(800 * 500).unwrap();
    let src = arena.allocate(800).unwrap();
    let mut dst = arena.allocate(500).unwrap();

    c.bench_function("mat_vec_transposed 800x500", |b| {
        b.iter(|| {
            backend
                .mat_vec_transposed(800, 500, &matrix, &src, Blend::ACCUMULATE, &mut dst)
                .unwrap();
        })
    });
}

fn bench_max_pool(c: &mut Criterion) {
    let backend = CpuBackend::new();
    let arena = DeviceArena::unbounded();

    let src_shape = TensorShape::single(20, 24, 24);
    let dst_shape = src_shape.pooled_2x2();
    let src = arena.allocate(src_shape.element_count()).unwrap();
    let mut dst = arena.allocate(dst_shape.element_count()).unwrap();

    c.bench_function("max_pool_2x2 20x24x24", |b| {
        b.iter(|| {
            backend
                .max_pool_2x2(&src_shape, &dst_shape, &src, Blend::OVERWRITE, &mut dst)
                .unwrap();
        })
    });
}

criterion_group!(benches, bench_conv_forward, bench_mat_vec, bench_max_pool);
criterion_main!(benches);
