// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Layer weights and the weight loader.
//!
//! Weights are immutable after construction: geometry plus two device
//! buffers per layer (filters/matrix and bias), uploaded once and read-only
//! for the lifetime of the pipeline.
//!
//! [`WeightLoader`] provides two modes:
//!
//! 1. **File-backed** — memory-maps `<layer>.weights.bin` /
//!    `<layer>.bias.bin` (raw little-endian `f32`) from the model
//!    directory. There is deliberately no container format to parse.
//! 2. **Synthetic** — zero-filled weights with the correct shapes, for
//!    testing and demos without model files.

use crate::{NetworkError, Topology};
use compute_backend::Backend;
use device_memory::{DeviceArena, DeviceBuffer};
use std::path::{Path, PathBuf};

/// Learned parameters of one convolution layer.
///
/// `filters` is laid out `[out_channels, in_channels, k, k]` row-major;
/// `bias` holds one value per output channel.
#[derive(Debug)]
pub struct ConvWeights {
    pub name: String,
    pub kernel_dim: usize,
    pub in_channels: usize,
    pub out_channels: usize,
    pub filters: DeviceBuffer,
    pub bias: DeviceBuffer,
}

impl ConvWeights {
    /// Validates and uploads host-side weight data.
    #[allow(clippy::too_many_arguments)]
    pub fn from_host(
        arena: &DeviceArena,
        backend: &dyn Backend,
        name: &str,
        kernel_dim: usize,
        in_channels: usize,
        out_channels: usize,
        filters: &[f32],
        bias: &[f32],
    ) -> Result<Self, NetworkError> {
        let expected = out_channels * in_channels * kernel_dim * kernel_dim;
        if filters.len() != expected {
            return Err(NetworkError::WeightLoad {
                layer: name.to_string(),
                detail: format!("filter tensor has {} elements, expected {expected}", filters.len()),
            });
        }
        if bias.len() != out_channels {
            return Err(NetworkError::WeightLoad {
                layer: name.to_string(),
                detail: format!("bias tensor has {} elements, expected {out_channels}", bias.len()),
            });
        }

        Ok(Self {
            name: name.to_string(),
            kernel_dim,
            in_channels,
            out_channels,
            filters: upload(arena, backend, name, filters)?,
            bias: upload(arena, backend, name, bias)?,
        })
    }
}

/// Learned parameters of one fully-connected layer.
///
/// `matrix` stores one contiguous `inputs`-length row per output neuron —
/// the transposed-operation layout the mat-vec primitive expects, so
/// `matrix[i·inputs + j]` is the weight from input `j` to output `i`.
#[derive(Debug)]
pub struct DenseWeights {
    pub name: String,
    pub inputs: usize,
    pub outputs: usize,
    pub matrix: DeviceBuffer,
    pub bias: DeviceBuffer,
}

impl DenseWeights {
    /// Validates and uploads host-side weight data.
    pub fn from_host(
        arena: &DeviceArena,
        backend: &dyn Backend,
        name: &str,
        inputs: usize,
        outputs: usize,
        matrix: &[f32],
        bias: &[f32],
    ) -> Result<Self, NetworkError> {
        let expected = inputs * outputs;
        if matrix.len() != expected {
            return Err(NetworkError::WeightLoad {
                layer: name.to_string(),
                detail: format!("weight matrix has {} elements, expected {expected}", matrix.len()),
            });
        }
        if bias.len() != outputs {
            return Err(NetworkError::WeightLoad {
                layer: name.to_string(),
                detail: format!("bias tensor has {} elements, expected {outputs}", bias.len()),
            });
        }

        Ok(Self {
            name: name.to_string(),
            inputs,
            outputs,
            matrix: upload(arena, backend, name, matrix)?,
            bias: upload(arena, backend, name, bias)?,
        })
    }
}

/// All four layers' weights, loaded once per pipeline.
#[derive(Debug)]
pub struct NetworkWeights {
    pub conv1: ConvWeights,
    pub conv2: ConvWeights,
    pub fc1: DenseWeights,
    pub fc2: DenseWeights,
}

impl NetworkWeights {
    /// Total device elements held by all weight buffers.
    pub fn total_elements(&self) -> usize {
        self.conv1.filters.capacity()
            + self.conv1.bias.capacity()
            + self.conv2.filters.capacity()
            + self.conv2.bias.capacity()
            + self.fc1.matrix.capacity()
            + self.fc1.bias.capacity()
            + self.fc2.matrix.capacity()
            + self.fc2.bias.capacity()
    }

    /// Returns a concise summary string for display.
    pub fn summary(&self) -> String {
        format!(
            "weights: conv1 {}+{}, conv2 {}+{}, fc1 {}+{}, fc2 {}+{} elements",
            self.conv1.filters.capacity(),
            self.conv1.bias.capacity(),
            self.conv2.filters.capacity(),
            self.conv2.bias.capacity(),
            self.fc1.matrix.capacity(),
            self.fc1.bias.capacity(),
            self.fc2.matrix.capacity(),
            self.fc2.bias.capacity(),
        )
    }
}

/// Allocates a device buffer and uploads host data into it.
fn upload(
    arena: &DeviceArena,
    backend: &dyn Backend,
    layer: &str,
    data: &[f32],
) -> Result<DeviceBuffer, NetworkError> {
    let mut buf = arena.allocate(data.len())?;
    backend
        .copy_host_to_device(data, &mut buf)
        .map_err(|e| NetworkError::WeightLoad {
            layer: layer.to_string(),
            detail: format!("device upload failed: {e}"),
        })?;
    Ok(buf)
}

/// Loads per-layer weight tensors from raw `f32` files.
pub struct WeightLoader {
    model_dir: PathBuf,
}

impl WeightLoader {
    /// Creates a loader rooted at `model_dir`.
    pub fn new(model_dir: PathBuf) -> Self {
        Self { model_dir }
    }

    /// Returns `true` when the model directory holds weight files.
    ///
    /// The first conv layer's filter file is the marker; missing files for
    /// other layers are load errors rather than a silent fallback.
    pub fn is_file_backed(&self) -> bool {
        self.model_dir.join("conv1.weights.bin").exists()
    }

    /// Returns the model directory path.
    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// Loads all four layers for the given topology.
    ///
    /// In file-backed mode every tensor is read and length-validated
    /// against the topology. Otherwise zero-filled synthetic weights are
    /// produced with the correct shapes.
    pub fn load(
        &self,
        topology: &Topology,
        arena: &DeviceArena,
        backend: &dyn Backend,
    ) -> Result<NetworkWeights, NetworkError> {
        let file_backed = self.is_file_backed();
        if file_backed {
            tracing::info!("loading weights from '{}'", self.model_dir.display());
        } else {
            tracing::warn!(
                "'{}' has no weight files, using synthetic zero weights",
                self.model_dir.display(),
            );
        }

        let conv1 = self.load_conv(&topology.conv1, arena, backend, file_backed)?;
        let conv2 = self.load_conv(&topology.conv2, arena, backend, file_backed)?;
        let fc1 = self.load_dense(&topology.fc1, arena, backend, file_backed)?;
        let fc2 = self.load_dense(&topology.fc2, arena, backend, file_backed)?;

        Ok(NetworkWeights {
            conv1,
            conv2,
            fc1,
            fc2,
        })
    }

    // ── Private helpers ────────────────────────────────────────

    fn load_conv(
        &self,
        geometry: &crate::ConvGeometry,
        arena: &DeviceArena,
        backend: &dyn Backend,
        file_backed: bool,
    ) -> Result<ConvWeights, NetworkError> {
        let (filters, bias) = if file_backed {
            (
                self.read_tensor(geometry.name, "weights", geometry.filter_elements())?,
                self.read_tensor(geometry.name, "bias", geometry.out_channels)?,
            )
        } else {
            (
                vec![0.0; geometry.filter_elements()],
                vec![0.0; geometry.out_channels],
            )
        };
        ConvWeights::from_host(
            arena,
            backend,
            geometry.name,
            geometry.kernel_dim,
            geometry.in_channels,
            geometry.out_channels,
            &filters,
            &bias,
        )
    }

    fn load_dense(
        &self,
        geometry: &crate::DenseGeometry,
        arena: &DeviceArena,
        backend: &dyn Backend,
        file_backed: bool,
    ) -> Result<DenseWeights, NetworkError> {
        let (matrix, bias) = if file_backed {
            (
                self.read_tensor(geometry.name, "weights", geometry.matrix_elements())?,
                self.read_tensor(geometry.name, "bias", geometry.outputs)?,
            )
        } else {
            (
                vec![0.0; geometry.matrix_elements()],
                vec![0.0; geometry.outputs],
            )
        };
        DenseWeights::from_host(
            arena,
            backend,
            geometry.name,
            geometry.inputs,
            geometry.outputs,
            &matrix,
            &bias,
        )
    }

    /// Memory-maps `<layer>.<kind>.bin` and decodes little-endian `f32`s.
    fn read_tensor(
        &self,
        layer: &str,
        kind: &str,
        expected_elements: usize,
    ) -> Result<Vec<f32>, NetworkError> {
        let path = self.model_dir.join(format!("{layer}.{kind}.bin"));

        let file = std::fs::File::open(&path).map_err(|e| NetworkError::WeightLoad {
            layer: layer.to_string(),
            detail: format!("cannot open '{}': {e}", path.display()),
        })?;
        let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| NetworkError::WeightLoad {
            layer: layer.to_string(),
            detail: format!("mmap of '{}' failed: {e}", path.display()),
        })?;

        if mmap.len() != expected_elements * 4 {
            return Err(NetworkError::WeightLoad {
                layer: layer.to_string(),
                detail: format!(
                    "'{}' holds {} bytes, expected {} ({} f32 elements)",
                    path.display(),
                    mmap.len(),
                    expected_elements * 4,
                    expected_elements,
                ),
            });
        }

        Ok(mmap
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }
}

impl std::fmt::Debug for WeightLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightLoader")
            .field("model_dir", &self.model_dir)
            .field("file_backed", &self.is_file_backed())
            .finish()
    }
}
