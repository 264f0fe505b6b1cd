// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Integration tests: end-to-end classification pipeline.
//!
//! These exercise the complete flow from configuration → topology →
//! weight upload → forward pass, proving that shape propagation, the
//! ping-pong buffer lifecycle, and the error taxonomy compose correctly
//! across all four crates.

use network::{
    ConvWeights, DenseWeights, Network, NetworkConfig, NetworkError, NetworkWeights, Ready,
};

// ── Helpers ────────────────────────────────────────────────────

/// A small topology that keeps tests fast:
/// 12×12 → conv k3 ×2 → pool → conv k3 ×3 → pool → fc 8 → fc 4.
fn tiny_config() -> NetworkConfig {
    NetworkConfig {
        model_path: std::path::PathBuf::from("<synthetic>"),
        device_capacity: "unlimited".into(),
        image_height: 12,
        image_width: 12,
        kernel_dim: 3,
        conv1_features: 2,
        conv2_features: 3,
        hidden_units: 8,
        num_classes: 4,
        ..Default::default()
    }
}

/// Builds a `Ready` network with custom per-layer weight data.
///
/// `fc2_matrix` and the bias vectors default to zeros when `None`.
fn network_with_weights(
    config: NetworkConfig,
    conv1_bias: f32,
    conv2_bias: f32,
    fc1_bias: f32,
    fc2_bias: Vec<f32>,
    fc2_matrix: Option<Vec<f32>>,
) -> Network<Ready> {
    let idle = Network::new(config).unwrap();
    let topology = idle.topology().clone();
    let arena = idle.arena().clone();
    let backend = idle.backend();

    let conv1 = ConvWeights::from_host(
        &arena,
        backend,
        "conv1",
        topology.conv1.kernel_dim,
        topology.conv1.in_channels,
        topology.conv1.out_channels,
        &vec![0.0; topology.conv1.filter_elements()],
        &vec![conv1_bias; topology.conv1.out_channels],
    )
    .unwrap();
    let conv2 = ConvWeights::from_host(
        &arena,
        backend,
        "conv2",
        topology.conv2.kernel_dim,
        topology.conv2.in_channels,
        topology.conv2.out_channels,
        &vec![0.0; topology.conv2.filter_elements()],
        &vec![conv2_bias; topology.conv2.out_channels],
    )
    .unwrap();
    let fc1 = DenseWeights::from_host(
        &arena,
        backend,
        "fc1",
        topology.fc1.inputs,
        topology.fc1.outputs,
        &vec![0.0; topology.fc1.matrix_elements()],
        &vec![fc1_bias; topology.fc1.outputs],
    )
    .unwrap();
    let matrix = fc2_matrix.unwrap_or_else(|| vec![0.0; topology.fc2.matrix_elements()]);
    let fc2 = DenseWeights::from_host(
        &arena,
        backend,
        "fc2",
        topology.fc2.inputs,
        topology.fc2.outputs,
        &matrix,
        &fc2_bias,
    )
    .unwrap();

    idle.with_weights(NetworkWeights {
        conv1,
        conv2,
        fc1,
        fc2,
    })
}

// ── End-to-End Classification ──────────────────────────────────

#[test]
fn test_zero_image_zero_weights_returns_class_zero() {
    // Default 28×28 topology, synthetic zero weights, all-zero image:
    // softmax is uniform and the first-seen tie-break picks index 0.
    let config = NetworkConfig {
        model_path: std::path::PathBuf::from("<synthetic>"),
        device_capacity: "unlimited".into(),
        ..Default::default()
    };
    let mut net = Network::new(config).unwrap().load_weights().unwrap();

    let result = net.forward(&vec![0.0; 28 * 28]).unwrap();
    assert_eq!(result.label, 0);
    assert_eq!(result.scores.len(), 10);

    let sum: f32 = result.scores.iter().sum();
    assert!((sum - 1.0).abs() < 1e-5);
    for &s in &result.scores {
        assert!((s - 0.1).abs() < 1e-5);
    }
}

#[test]
fn test_fc2_bias_decides_label() {
    // Everything zero except fc2's bias, which favours class 3.
    let mut net = network_with_weights(
        tiny_config(),
        0.0,
        0.0,
        0.0,
        vec![0.0, 0.0, 0.0, 1.0],
        None,
    );

    let result = net.forward(&vec![0.5; 144]).unwrap();
    assert_eq!(result.label, 3);
    assert!(result.scores[3] > result.scores[0]);
}

#[test]
fn test_signal_flows_through_biases_and_fc2_matrix() {
    // Conv biases push a constant signal through the zero filters, fc1's
    // bias lifts it to 3.0 per hidden unit, and fc2's matrix routes the
    // accumulated signal to class 2.
    let config = tiny_config();
    let hidden = config.hidden_units;
    let mut matrix = vec![0.0; hidden * config.num_classes];
    for j in 0..hidden {
        matrix[2 * hidden + j] = 0.1;
    }

    let mut net = network_with_weights(config, 1.0, 2.0, 3.0, vec![0.0; 4], Some(matrix));
    let result = net.forward(&vec![0.0; 144]).unwrap();

    assert_eq!(result.label, 2);
    // Class 2 logit before softmax: 8 × 3.0 × 0.1 = 2.4, others 0.
    let expected = (2.4f32).exp() / ((2.4f32).exp() + 3.0);
    assert!((result.scores[2] - expected).abs() < 1e-5);
}

#[test]
fn test_classify_from_pgm_file() {
    let mut data = b"P5\n12 12\n255\n".to_vec();
    data.extend_from_slice(&[128u8; 144]);
    let path = std::env::temp_dir().join("convnet_rt_e2e.pgm");
    std::fs::write(&path, data).unwrap();

    let mut net = network_with_weights(
        tiny_config(),
        0.0,
        0.0,
        0.0,
        vec![0.0, 2.0, 0.0, 0.0],
        None,
    );
    let result = net.classify(&path).unwrap();
    assert_eq!(result.label, 1);

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_metrics_cover_all_stages() {
    let mut net = Network::new(tiny_config()).unwrap().load_weights().unwrap();
    let result = net.forward(&vec![0.0; 144]).unwrap();

    let stages: Vec<&str> = result.metrics.stage_metrics.iter().map(|s| s.stage).collect();
    assert_eq!(
        stages,
        vec!["conv1", "pool1", "conv2", "pool2", "fc1", "relu1", "fc2", "softmax"]
    );
    assert!(result.metrics.total_duration.as_nanos() > 0);
    assert!(result.metrics.peak_device_elements > 0);
}

#[test]
fn test_profiling_disabled_skips_stage_metrics() {
    let config = NetworkConfig {
        enable_profiling: false,
        ..tiny_config()
    };
    let mut net = Network::new(config).unwrap().load_weights().unwrap();
    let result = net.forward(&vec![0.0; 144]).unwrap();
    assert!(result.metrics.stage_metrics.is_empty());
}

// ── Buffer Lifecycle ───────────────────────────────────────────

#[test]
fn test_repeated_runs_reuse_buffers() {
    let mut net = Network::new(tiny_config()).unwrap().load_weights().unwrap();

    for _ in 0..5 {
        let result = net.forward(&vec![0.25; 144]).unwrap();
        assert_eq!(result.scores.len(), 4);
    }

    // The conv workspace cycles through the arena every run; after the
    // first classification it is always served from the free list.
    let stats = net.arena_stats();
    assert!(stats.reuse_hits > 0, "later runs should reuse workspace storage");

    // Live memory is stable: repeated runs must not accumulate buffers.
    let live_after_five = net.arena().live_elements();
    net.forward(&vec![0.25; 144]).unwrap();
    assert_eq!(net.arena().live_elements(), live_after_five);
}

#[test]
fn test_failed_classification_releases_transient_buffers() {
    // fc1 weights disagree with the topology, so the run dies mid-chain
    // after both conv stages have grown buffers and taken workspace.
    let idle = Network::new(tiny_config()).unwrap();
    let topology = idle.topology().clone();
    let arena = idle.arena().clone();
    let backend = idle.backend();

    let conv1 = ConvWeights::from_host(
        &arena, backend, "conv1",
        topology.conv1.kernel_dim, topology.conv1.in_channels, topology.conv1.out_channels,
        &vec![0.0; topology.conv1.filter_elements()],
        &vec![0.0; topology.conv1.out_channels],
    ).unwrap();
    let conv2 = ConvWeights::from_host(
        &arena, backend, "conv2",
        topology.conv2.kernel_dim, topology.conv2.in_channels, topology.conv2.out_channels,
        &vec![0.0; topology.conv2.filter_elements()],
        &vec![0.0; topology.conv2.out_channels],
    ).unwrap();
    // Wrong input width: topology says fc1.inputs, these claim 7.
    let fc1 = DenseWeights::from_host(&arena, backend, "fc1", 7, 8, &vec![0.0; 56], &vec![0.0; 8])
        .unwrap();
    let fc2 = DenseWeights::from_host(&arena, backend, "fc2", 8, 4, &vec![0.0; 32], &vec![0.0; 4])
        .unwrap();

    let mut net = idle.with_weights(NetworkWeights { conv1, conv2, fc1, fc2 });

    let err = net.forward(&vec![0.0; 144]).unwrap_err();
    assert!(matches!(err, NetworkError::StageConfig { stage: "fc1", .. }));

    // The failure path released its transient workspace: a second failing
    // run reaches the same state without growing live memory.
    let live_after_first = net.arena().live_elements();
    let _ = net.forward(&vec![0.0; 144]).unwrap_err();
    assert_eq!(net.arena().live_elements(), live_after_first);
    assert!(net.arena().free_list_elements() > 0);
}

#[test]
fn test_capacity_ceiling_aborts_weight_load() {
    // 256 bytes (64 elements) cannot hold even the tiny topology's weights.
    let config = NetworkConfig {
        device_capacity: "256".into(),
        ..tiny_config()
    };
    let result = Network::new(config).unwrap().load_weights();
    assert!(matches!(result, Err(NetworkError::Memory(_))));
}

#[test]
fn test_drop_releases_all_device_memory() {
    let idle = Network::new(tiny_config()).unwrap();
    let arena = idle.arena().clone();

    let mut net = idle.load_weights().unwrap();
    net.forward(&vec![0.0; 144]).unwrap();
    assert!(arena.live_elements() > 0);

    drop(net);
    assert_eq!(arena.live_elements(), 0, "teardown must release every buffer");
}

// ── Configuration Errors ───────────────────────────────────────

#[test]
fn test_kernel_larger_than_image_rejected_at_construction() {
    let config = NetworkConfig {
        image_height: 4,
        image_width: 4,
        kernel_dim: 5,
        ..tiny_config()
    };
    let err = Network::new(config).unwrap_err();
    assert!(matches!(err, NetworkError::StageConfig { stage: "conv1", .. }));
}

#[test]
fn test_config_toml_roundtrip() {
    let config = tiny_config();
    let toml = config.to_toml().unwrap();
    let back = NetworkConfig::from_toml(&toml).unwrap();
    assert_eq!(back.image_height, config.image_height);
    assert_eq!(back.conv2_features, config.conv2_features);
    assert_eq!(back.num_classes, config.num_classes);
}
