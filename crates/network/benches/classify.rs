// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! End-to-end forward-pass benchmark at the default topology.

use criterion::{criterion_group, criterion_main, Criterion};
use network::{Network, NetworkConfig};

fn bench_forward_lenet(c: &mut Criterion) {
    let config = NetworkConfig {
        model_path: std::path::PathBuf::from("<synthetic>"),
        device_capacity: "unlimited".into(),
        enable_profiling: false,
        ..Default::default()
    };
    let mut net = Network::new(config).unwrap().load_weights().unwrap();
    let pixels = vec![0.5f32; 28 * 28];

    c.bench_function("forward 28x28 lenet", |b| {
        b.iter(|| net.forward(&pixels).unwrap().label)
    });
}

criterion_group!(benches, bench_forward_lenet);
criterion_main!(benches);
