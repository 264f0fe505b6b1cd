// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Topology resolution: the per-stage shape walk.
//!
//! The pipeline's stage sequence is fixed, so the entire shape chain can be
//! derived once from the configuration — before any weights are loaded or
//! buffers allocated. [`Topology::resolve`] performs that walk and rejects
//! impossible geometry (a kernel larger than the image, a plane pooled down
//! to nothing) up front, with the failing stage named in the error.

use crate::{NetworkConfig, NetworkError};
use tensor_core::TensorShape;

/// Geometry of one convolution layer, with its resolved input and output
/// activation shapes.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConvGeometry {
    pub name: &'static str,
    pub kernel_dim: usize,
    pub in_channels: usize,
    pub out_channels: usize,
    pub input: TensorShape,
    pub output: TensorShape,
}

impl ConvGeometry {
    /// Elements in the filter tensor: `out·in·k·k`.
    pub fn filter_elements(&self) -> usize {
        self.out_channels * self.in_channels * self.kernel_dim * self.kernel_dim
    }
}

/// Geometry of one fully-connected layer.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DenseGeometry {
    pub name: &'static str,
    pub inputs: usize,
    pub outputs: usize,
    pub input: TensorShape,
    pub output: TensorShape,
}

impl DenseGeometry {
    /// Elements in the weight matrix: `inputs·outputs`.
    pub fn matrix_elements(&self) -> usize {
        self.inputs * self.outputs
    }
}

/// The resolved shape chain of the fixed
/// conv → pool → conv → pool → fc → relu → fc → softmax pipeline.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Topology {
    pub input: TensorShape,
    pub conv1: ConvGeometry,
    pub pool1_output: TensorShape,
    pub conv2: ConvGeometry,
    pub pool2_output: TensorShape,
    pub fc1: DenseGeometry,
    pub fc2: DenseGeometry,
}

impl Topology {
    /// Walks the shape chain from the configuration.
    ///
    /// # Errors
    /// Returns [`NetworkError::StageConfig`] naming the first stage whose
    /// geometry is impossible, or [`NetworkError::Config`] when pooling
    /// collapses the plane to zero elements before the fully-connected
    /// layers.
    pub fn resolve(config: &NetworkConfig) -> Result<Self, NetworkError> {
        let input = TensorShape::single(1, config.image_height, config.image_width);

        let conv1_out = input
            .conv_output(config.kernel_dim, config.conv1_features)
            .map_err(|source| NetworkError::StageConfig {
                stage: "conv1",
                source,
            })?;
        let pool1_output = conv1_out.pooled_2x2();

        let conv2_out = pool1_output
            .conv_output(config.kernel_dim, config.conv2_features)
            .map_err(|source| NetworkError::StageConfig {
                stage: "conv2",
                source,
            })?;
        let pool2_output = conv2_out.pooled_2x2();

        let fc1_inputs = pool2_output.flat_len();
        if fc1_inputs == 0 {
            return Err(NetworkError::Config(format!(
                "image {}x{} pools down to an empty plane before fc1",
                config.image_height, config.image_width
            )));
        }

        let fc1_out = pool2_output
            .flattened(config.hidden_units)
            .map_err(|source| NetworkError::StageConfig {
                stage: "fc1",
                source,
            })?;
        let fc2_out = fc1_out
            .flattened(config.num_classes)
            .map_err(|source| NetworkError::StageConfig {
                stage: "fc2",
                source,
            })?;

        Ok(Self {
            input,
            conv1: ConvGeometry {
                name: "conv1",
                kernel_dim: config.kernel_dim,
                in_channels: input.c,
                out_channels: config.conv1_features,
                input,
                output: conv1_out,
            },
            pool1_output,
            conv2: ConvGeometry {
                name: "conv2",
                kernel_dim: config.kernel_dim,
                in_channels: pool1_output.c,
                out_channels: config.conv2_features,
                input: pool1_output,
                output: conv2_out,
            },
            pool2_output,
            fc1: DenseGeometry {
                name: "fc1",
                inputs: fc1_inputs,
                outputs: config.hidden_units,
                input: pool2_output,
                output: fc1_out,
            },
            fc2: DenseGeometry {
                name: "fc2",
                inputs: config.hidden_units,
                outputs: config.num_classes,
                input: fc1_out,
                output: fc2_out,
            },
        })
    }

    /// Total weight elements (filters, matrices, and biases) of all layers.
    pub fn weight_elements(&self) -> usize {
        self.conv1.filter_elements()
            + self.conv1.out_channels
            + self.conv2.filter_elements()
            + self.conv2.out_channels
            + self.fc1.matrix_elements()
            + self.fc1.outputs
            + self.fc2.matrix_elements()
            + self.fc2.outputs
    }

    /// The largest activation element count any stage produces.
    pub fn peak_activation_elements(&self) -> usize {
        [
            self.input.element_count(),
            self.conv1.output.element_count(),
            self.pool1_output.element_count(),
            self.conv2.output.element_count(),
            self.pool2_output.element_count(),
            self.fc1.output.element_count(),
            self.fc2.output.element_count(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    /// Returns a multi-line, human-readable shape walk for display.
    pub fn summary(&self) -> String {
        let weight_kb = (self.weight_elements() * 4) as f64 / 1024.0;
        format!(
            "input    {}\n\
             conv1    {} (k={}, {} features)\n\
             pool1    {}\n\
             conv2    {} (k={}, {} features)\n\
             pool2    {}\n\
             fc1      {} ({} -> {})\n\
             fc2      {} ({} -> {})\n\
             weights  {:.1} KB across 4 layers",
            self.input,
            self.conv1.output,
            self.conv1.kernel_dim,
            self.conv1.out_channels,
            self.pool1_output,
            self.conv2.output,
            self.conv2.kernel_dim,
            self.conv2.out_channels,
            self.pool2_output,
            self.fc1.output,
            self.fc1.inputs,
            self.fc1.outputs,
            self.fc2.output,
            self.fc2.inputs,
            self.fc2.outputs,
            weight_kb,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_default_lenet() {
        let topology = Topology::resolve(&NetworkConfig::default()).unwrap();

        assert_eq!(topology.input, TensorShape::new(1, 1, 28, 28));
        assert_eq!(topology.conv1.output, TensorShape::new(1, 20, 24, 24));
        assert_eq!(topology.pool1_output, TensorShape::new(1, 20, 12, 12));
        assert_eq!(topology.conv2.output, TensorShape::new(1, 50, 8, 8));
        assert_eq!(topology.pool2_output, TensorShape::new(1, 50, 4, 4));
        assert_eq!(topology.fc1.inputs, 800);
        assert_eq!(topology.fc1.output, TensorShape::new(1, 500, 1, 1));
        assert_eq!(topology.fc2.output, TensorShape::new(1, 10, 1, 1));
    }

    #[test]
    fn test_resolve_rejects_oversized_kernel() {
        let config = NetworkConfig {
            image_height: 4,
            image_width: 4,
            kernel_dim: 5,
            ..Default::default()
        };
        let err = Topology::resolve(&config).unwrap_err();
        assert!(matches!(
            err,
            NetworkError::StageConfig { stage: "conv1", .. }
        ));
    }

    #[test]
    fn test_resolve_rejects_kernel_oversized_for_second_conv() {
        // 8x8 input: conv1 (k=3) -> 6x6, pool -> 3x3; k=5 cannot fit conv2.
        let config = NetworkConfig {
            image_height: 8,
            image_width: 8,
            kernel_dim: 3,
            ..Default::default()
        };
        // conv2 sees 3x3 with k=3 -> 1x1, pools to 0x0, so fc1 is empty.
        let err = Topology::resolve(&config).unwrap_err();
        assert!(matches!(err, NetworkError::Config(_)));
    }

    #[test]
    fn test_weight_elements_lenet() {
        let topology = Topology::resolve(&NetworkConfig::default()).unwrap();
        let expected = 20 * 25 + 20 // conv1
            + 50 * 20 * 25 + 50     // conv2
            + 800 * 500 + 500       // fc1
            + 500 * 10 + 10; // fc2
        assert_eq!(topology.weight_elements(), expected);
    }

    #[test]
    fn test_peak_activation() {
        let topology = Topology::resolve(&NetworkConfig::default()).unwrap();
        // conv1 output (20·24·24 = 11520) dominates.
        assert_eq!(topology.peak_activation_elements(), 11520);
    }

    #[test]
    fn test_summary_contains_walk() {
        let topology = Topology::resolve(&NetworkConfig::default()).unwrap();
        let s = topology.summary();
        assert!(s.contains("[1, 20, 24, 24]"));
        assert!(s.contains("800 -> 500"));
    }
}
