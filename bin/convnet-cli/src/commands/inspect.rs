// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `convnet inspect` command: print the resolved topology.

use network::{NetworkConfig, Topology, WeightLoader};

pub fn execute(config: NetworkConfig) -> anyhow::Result<()> {
    let topology = Topology::resolve(&config)?;
    let loader = WeightLoader::new(config.model_path.clone());

    println!("Model directory: {}", config.model_path.display());
    println!(
        "Weight files:    {}",
        if loader.is_file_backed() { "present" } else { "absent (synthetic mode)" },
    );
    println!();
    println!("Shape walk:");
    for line in topology.summary().lines() {
        println!("  {line}");
    }
    println!();
    println!("Per-layer weights:");
    println!(
        "  conv1: {} filters + {} bias",
        topology.conv1.filter_elements(),
        topology.conv1.out_channels,
    );
    println!(
        "  conv2: {} filters + {} bias",
        topology.conv2.filter_elements(),
        topology.conv2.out_channels,
    );
    println!(
        "  fc1:   {} matrix + {} bias",
        topology.fc1.matrix_elements(),
        topology.fc1.outputs,
    );
    println!(
        "  fc2:   {} matrix + {} bias",
        topology.fc2.matrix_elements(),
        topology.fc2.outputs,
    );
    println!();
    println!(
        "Peak activation: {} elements ({:.1} KB)",
        topology.peak_activation_elements(),
        (topology.peak_activation_elements() * 4) as f64 / 1024.0,
    );

    Ok(())
}
