// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `convnet classify` command: run one image through the pipeline.
//!
//! Demonstrates the full type-state flow:
//! ```text
//! Network<Idle> → load_weights → Network<Ready> → classify
//! ```
//! When the model directory has no weight files, the loader falls back to
//! synthetic zero weights so the pipeline stays runnable as a demo.

use network::{Network, NetworkConfig, WeightLoader};
use std::path::PathBuf;

pub fn execute(config: NetworkConfig, image: PathBuf) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║             convnet · Image Classifier               ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
    println!("  Config:");
    println!("   Model:    {}", config.model_path.display());
    println!("   Image:    {}", image.display());
    println!("   Backend:  {}", config.backend);
    println!("   Capacity: {}", config.device_capacity);
    println!();

    // Step 1: Idle — resolve topology, backend, arena.
    println!("  [1/3] Building pipeline...");
    let net = Network::new(config)?;
    println!("        Input {}, {} weight elements", net.topology().input, net.topology().weight_elements());

    // Step 2: Idle → Ready — upload all four layers' weights.
    let loader_mode = if WeightLoader::new(net.config().model_path.clone()).is_file_backed() {
        "file-backed"
    } else {
        "synthetic (no weight files found)"
    };
    println!("  [2/3] Loading weights ({loader_mode})...");
    let mut net = net.load_weights()?;

    // Step 3: classify.
    println!("  [3/3] Running forward pass...");
    let result = net.classify(&image)?;
    println!();

    println!("  Results:");
    println!("   Label:  {}", result.label);
    println!("   Scores:");
    for (i, score) in result.scores.iter().enumerate() {
        let marker = if i == result.label { " ◄" } else { "" };
        println!("     class {i}: {score:.6}{marker}");
    }
    println!();
    println!("  Metrics:");
    println!("   {}", result.metrics.summary());
    for stage in &result.metrics.stage_metrics {
        println!(
            "     {:<8} {:>9.3}ms  -> {}",
            stage.stage,
            stage.duration.as_secs_f64() * 1000.0,
            stage.output_shape,
        );
    }
    println!();
    println!("  Device:");
    println!("   {}", net.arena_stats().summary());

    Ok(())
}
