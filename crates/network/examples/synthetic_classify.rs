// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Runs a classification with synthetic weights and prints the per-stage
//! shape walk, metrics, and arena statistics.
//!
//! ```bash
//! cargo run -p network --example synthetic_classify
//! ```

use network::{Network, NetworkConfig};

fn main() -> Result<(), network::NetworkError> {
    let config = NetworkConfig {
        model_path: std::path::PathBuf::from("<synthetic>"),
        ..Default::default()
    };

    let net = Network::new(config)?;
    println!("Topology:\n{}\n", net.topology().summary());

    let mut net = net.load_weights()?;

    // A mid-gray image; with zero weights every class ties and the
    // lowest index wins.
    let pixels = vec![0.5f32; 28 * 28];
    let result = net.forward(&pixels)?;

    println!("Label:  {}", result.label);
    println!("Scores: {:?}", result.scores);
    println!("{}", result.metrics.summary());
    println!("{}", net.arena_stats().summary());

    Ok(())
}
