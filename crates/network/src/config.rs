// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Pipeline configuration loaded from TOML files or constructed
//! programmatically.
//!
//! # TOML Format
//! ```toml
//! model_path = "./models/mnist-lenet"
//! backend = "cpu"
//! device_capacity = "64M"
//! image_height = 28
//! image_width = 28
//! num_classes = 10
//! kernel_dim = 5
//! conv1_features = 20
//! conv2_features = 50
//! hidden_units = 500
//! enable_profiling = true
//! ```

use compute_backend::{Backend, CpuBackend};
use device_memory::DeviceCapacity;
use std::path::{Path, PathBuf};

/// Configuration for the inference pipeline.
///
/// The layer geometry fields describe the fixed
/// conv → pool → conv → pool → fc → relu → fc → softmax topology; the
/// defaults are the classic MNIST LeNet dimensions.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NetworkConfig {
    /// Path to the directory holding per-layer weight files.
    pub model_path: PathBuf,
    /// Backend name. Currently `"cpu"`.
    pub backend: String,
    /// Device capacity ceiling (human-readable, e.g. `"64M"`, `"unlimited"`).
    pub device_capacity: String,
    /// Input image height in pixels.
    pub image_height: usize,
    /// Input image width in pixels.
    pub image_width: usize,
    /// Number of output classes read back after the final softmax.
    pub num_classes: usize,
    /// Square kernel dimension shared by both convolution layers.
    pub kernel_dim: usize,
    /// Feature maps produced by the first convolution layer.
    pub conv1_features: usize,
    /// Feature maps produced by the second convolution layer.
    pub conv2_features: usize,
    /// Width of the first fully-connected layer.
    pub hidden_units: usize,
    /// Whether to record per-stage timing metrics.
    #[serde(default = "default_true")]
    pub enable_profiling: bool,
}

fn default_true() -> bool {
    true
}

impl NetworkConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, super::NetworkError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            super::NetworkError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, super::NetworkError> {
        toml::from_str(toml_str)
            .map_err(|e| super::NetworkError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, super::NetworkError> {
        toml::to_string_pretty(self)
            .map_err(|e| super::NetworkError::Config(format!("TOML serialise error: {e}")))
    }

    /// Parses the device capacity string.
    pub fn parse_device_capacity(&self) -> Result<DeviceCapacity, super::NetworkError> {
        DeviceCapacity::parse(&self.device_capacity)
            .map_err(|e| super::NetworkError::Config(format!("invalid device capacity: {e}")))
    }

    /// Creates the compute backend named by this config.
    pub fn create_backend(&self) -> Result<Box<dyn Backend>, super::NetworkError> {
        match self.backend.to_lowercase().as_str() {
            "cpu" => Ok(Box::new(CpuBackend::new())),
            other => Err(super::NetworkError::Config(format!(
                "unknown backend '{other}'; expected 'cpu'"
            ))),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("./models/mnist-lenet"),
            backend: "cpu".to_string(),
            device_capacity: "64M".to_string(),
            image_height: 28,
            image_width: 28,
            num_classes: 10,
            kernel_dim: 5,
            conv1_features: 20,
            conv2_features: 50,
            hidden_units: 500,
            enable_profiling: true,
        }
    }
}
