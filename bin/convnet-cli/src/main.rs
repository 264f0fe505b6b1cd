// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # convnet
//!
//! Command-line interface for the convnet-rt inference pipeline.
//!
//! ## Usage
//! ```bash
//! # Classify a grayscale image
//! convnet classify --image seven.pgm --model ./models/mnist-lenet
//!
//! # Print the resolved topology and weight footprint
//! convnet inspect --model ./models/mnist-lenet
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "convnet",
    about = "Feed-forward convolutional-network inference pipeline",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file (CLI flags override its values).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a grayscale image (binary PGM or raw intensity bytes).
    Classify {
        /// Path to the input image.
        #[arg(short, long)]
        image: std::path::PathBuf,

        /// Path to the model directory with per-layer weight files.
        #[arg(short, long)]
        model: Option<std::path::PathBuf>,

        /// Compute backend name.
        #[arg(short, long)]
        backend: Option<String>,

        /// Device capacity ceiling (e.g. "64M", "unlimited").
        #[arg(short = 'd', long)]
        device_capacity: Option<String>,
    },

    /// Print the resolved topology, shape walk, and weight footprint.
    Inspect {
        /// Path to the model directory.
        #[arg(short, long)]
        model: Option<std::path::PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    let mut config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Classify {
            image,
            model,
            backend,
            device_capacity,
        } => {
            if let Some(model) = model {
                config.model_path = model;
            }
            if let Some(backend) = backend {
                config.backend = backend;
            }
            if let Some(capacity) = device_capacity {
                config.device_capacity = capacity;
            }
            commands::classify::execute(config, image)
        }
        Commands::Inspect { model } => {
            if let Some(model) = model {
                config.model_path = model;
            }
            commands::inspect::execute(config)
        }
    }
}
