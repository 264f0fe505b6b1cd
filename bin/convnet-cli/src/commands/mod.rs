// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! CLI subcommands and shared setup.

pub mod classify;
pub mod inspect;

use network::NetworkConfig;
use std::path::Path;

/// Initialises tracing based on `-v` count. `RUST_LOG` wins when set.
pub fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Loads the configuration file when given, otherwise the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<NetworkConfig> {
    match path {
        Some(path) => NetworkConfig::from_file(path)
            .map_err(|e| anyhow::anyhow!("failed to load config: {e}")),
        None => Ok(NetworkConfig::default()),
    }
}
