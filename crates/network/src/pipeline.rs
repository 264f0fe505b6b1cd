// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The classification pipeline with type-state–enforced setup.
//!
//! ```text
//! Network<Idle>
//!     │  .load_weights()
//!     ▼
//! Network<Ready>
//!     │  .classify()
//!     ▼
//!  Classification
//! ```
//!
//! The transition consumes the old value and returns a new one, so calling
//! `classify` before weights are loaded is a compile error.
//!
//! # Buffer Roles
//! The network owns exactly two scratch buffers. During a classification
//! they are bound to `src`/`dst` roles, and the roles are exchanged with an
//! explicit `mem::swap` after every stage — the previous destination
//! becomes the next source. No buffer aliasing exists: the borrow checker
//! sees two distinct `&mut` bindings throughout.

use crate::{
    Activation, ClassifyMetrics, Convolution, FullyConnected, NetworkConfig, NetworkError,
    NetworkWeights, Pooling, Softmax, Topology, WeightLoader,
};
use compute_backend::Backend;
use device_memory::{ArenaStats, DeviceArena, ScratchBuffer};
use std::marker::PhantomData;
use std::path::Path;
use std::time::Instant;

// ── Type-state markers ─────────────────────────────────────────

/// Network is constructed but holds no weights.
#[derive(Debug)]
pub struct Idle;

/// Weights are loaded; the network can classify.
#[derive(Debug)]
pub struct Ready;

/// Trait for network states.
pub trait NetworkState: std::fmt::Debug {}
impl NetworkState for Idle {}
impl NetworkState for Ready {}

// ── Classification output ──────────────────────────────────────

/// The result of a single classification.
#[derive(Debug)]
pub struct Classification {
    /// Index of the winning class in `[0, num_classes)`. Ties break to
    /// the lowest index.
    pub label: usize,
    /// The first `num_classes` softmax outputs.
    pub scores: Vec<f32>,
    /// Timing and memory metrics for the run.
    pub metrics: ClassifyMetrics,
}

// ── Network ────────────────────────────────────────────────────

/// The fixed conv → pool → conv → pool → fc → relu → fc → softmax
/// pipeline.
///
/// A `Network` exclusively owns its device arena, its two ping-pong
/// scratch buffers, and (once `Ready`) all layer weights; dropping it
/// releases everything deterministically. It is **not** safe for
/// concurrent classifications — `classify` takes `&mut self` because the
/// scratch buffers are mutable shared state. Use one instance per worker.
///
/// # Example
/// ```no_run
/// use network::{Network, NetworkConfig};
///
/// # fn example() -> Result<(), network::NetworkError> {
/// let mut net = Network::new(NetworkConfig::default())?.load_weights()?;
/// let result = net.classify(std::path::Path::new("seven.pgm"))?;
/// println!("label: {}", result.label);
/// # Ok(())
/// # }
/// ```
pub struct Network<S: NetworkState = Idle> {
    config: NetworkConfig,
    topology: Topology,
    backend: Box<dyn Backend>,
    arena: DeviceArena,
    ping: ScratchBuffer,
    pong: ScratchBuffer,
    conv: Convolution,
    pool: Pooling,
    fc: FullyConnected,
    activation: Activation,
    softmax: Softmax,
    // Populated by the Idle → Ready transition.
    weights: Option<NetworkWeights>,
    _state: PhantomData<S>,
}

// ── Idle → Ready ───────────────────────────────────────────────

impl Network<Idle> {
    /// Creates a network from the given configuration.
    ///
    /// Resolves the topology, instantiates the backend, and sets up the
    /// device arena with two empty scratch buffers. No weights are loaded
    /// yet.
    pub fn new(config: NetworkConfig) -> Result<Self, NetworkError> {
        let topology = Topology::resolve(&config)?;
        let backend = config.create_backend()?;
        let arena = DeviceArena::new(config.parse_device_capacity()?);

        tracing::info!(
            "network created: backend '{}', capacity {}",
            backend.name(),
            arena.capacity(),
        );
        tracing::debug!("topology:\n{}", topology.summary());

        let ping = ScratchBuffer::new(&arena);
        let pong = ScratchBuffer::new(&arena);

        Ok(Self {
            config,
            topology,
            backend,
            arena,
            ping,
            pong,
            conv: Convolution,
            pool: Pooling,
            fc: FullyConnected,
            activation: Activation,
            softmax: Softmax,
            weights: None,
            _state: PhantomData,
        })
    }

    /// Loads all four layers' weights from the configured model directory
    /// (or synthetic zeros when no files exist) and transitions to the
    /// `Ready` state.
    pub fn load_weights(self) -> Result<Network<Ready>, NetworkError> {
        let loader = WeightLoader::new(self.config.model_path.clone());
        let weights = loader.load(&self.topology, &self.arena, self.backend.as_ref())?;
        tracing::info!("{}", weights.summary());
        Ok(self.into_ready(weights))
    }

    /// Transitions to `Ready` with pre-built weights (for testing and
    /// demos). Geometry mismatches surface as stage errors at classify
    /// time.
    pub fn with_weights(self, weights: NetworkWeights) -> Network<Ready> {
        self.into_ready(weights)
    }

    fn into_ready(self, weights: NetworkWeights) -> Network<Ready> {
        Network {
            config: self.config,
            topology: self.topology,
            backend: self.backend,
            arena: self.arena,
            ping: self.ping,
            pong: self.pong,
            conv: self.conv,
            pool: self.pool,
            fc: self.fc,
            activation: self.activation,
            softmax: self.softmax,
            weights: Some(weights),
            _state: PhantomData,
        }
    }
}

// ── Shared accessors ───────────────────────────────────────────

impl<S: NetworkState> Network<S> {
    /// Returns the resolved topology.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Returns the configuration.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Returns the device arena used for all buffers (for tests and
    /// weight construction).
    pub fn arena(&self) -> &DeviceArena {
        &self.arena
    }

    /// Returns the compute backend.
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Returns a snapshot of the arena's allocation statistics.
    pub fn arena_stats(&self) -> ArenaStats {
        self.arena.stats()
    }
}

// ── Ready: classification ──────────────────────────────────────

impl Network<Ready> {
    /// Returns the loaded weights.
    pub fn weights(&self) -> &NetworkWeights {
        self.weights.as_ref().expect("weights must exist in Ready state")
    }

    /// Classifies the image at `image_path`.
    ///
    /// Loads the image, normalises intensities to `[0, 1]`, and runs the
    /// forward pass.
    pub fn classify(&mut self, image_path: &Path) -> Result<Classification, NetworkError> {
        let pixels = crate::image::load_normalized(
            image_path,
            self.config.image_height,
            self.config.image_width,
        )?;
        tracing::debug!("loaded '{}' ({} pixels)", image_path.display(), pixels.len());
        self.forward(&pixels)
    }

    /// Runs the forward pass over an already-normalised pixel array.
    ///
    /// The shape starts at `(1, 1, image_height, image_width)` and is
    /// threaded through the fixed stage sequence; each stage returns the
    /// new shape and the source/destination buffer roles swap. Any stage
    /// error aborts the whole classification — there is no partial result.
    pub fn forward(&mut self, pixels: &[f32]) -> Result<Classification, NetworkError> {
        let expected = self.topology.input.element_count();
        if pixels.len() != expected {
            return Err(NetworkError::Config(format!(
                "input has {} pixels, topology expects {expected}",
                pixels.len(),
            )));
        }

        let run_start = Instant::now();
        let profiling = self.config.enable_profiling;
        let num_classes = self.config.num_classes;
        let mut metrics = ClassifyMetrics::new();

        let Self {
            topology,
            backend,
            arena,
            ping,
            pong,
            conv,
            pool,
            fc,
            activation,
            softmax,
            weights,
            ..
        } = self;
        let backend = backend.as_ref();
        let weights = weights.as_ref().expect("weights must exist in Ready state");

        // Upload the normalised image into the first source buffer.
        let mut shape = topology.input;
        ping.ensure_capacity(shape.element_count())?;
        backend
            .copy_host_to_device(pixels, ping.buffer_mut())
            .map_err(|source| NetworkError::Backend {
                stage: "input",
                source,
            })?;

        let (mut src, mut dst): (&mut ScratchBuffer, &mut ScratchBuffer) = (ping, pong);

        let mut t = Instant::now();
        shape = conv.forward("conv1", backend, arena, &weights.conv1, shape, src, dst)?;
        if profiling {
            metrics.record_stage("conv1", t.elapsed(), shape);
        }
        std::mem::swap(&mut src, &mut dst);

        t = Instant::now();
        shape = pool.forward("pool1", backend, shape, src, dst)?;
        if profiling {
            metrics.record_stage("pool1", t.elapsed(), shape);
        }
        std::mem::swap(&mut src, &mut dst);

        t = Instant::now();
        shape = conv.forward("conv2", backend, arena, &weights.conv2, shape, src, dst)?;
        if profiling {
            metrics.record_stage("conv2", t.elapsed(), shape);
        }
        std::mem::swap(&mut src, &mut dst);

        t = Instant::now();
        shape = pool.forward("pool2", backend, shape, src, dst)?;
        if profiling {
            metrics.record_stage("pool2", t.elapsed(), shape);
        }
        std::mem::swap(&mut src, &mut dst);

        t = Instant::now();
        shape = fc.forward("fc1", backend, &weights.fc1, shape, src, dst)?;
        if profiling {
            metrics.record_stage("fc1", t.elapsed(), shape);
        }
        std::mem::swap(&mut src, &mut dst);

        t = Instant::now();
        shape = activation.forward("relu1", backend, shape, src, dst)?;
        if profiling {
            metrics.record_stage("relu1", t.elapsed(), shape);
        }
        std::mem::swap(&mut src, &mut dst);

        t = Instant::now();
        shape = fc.forward("fc2", backend, &weights.fc2, shape, src, dst)?;
        if profiling {
            metrics.record_stage("fc2", t.elapsed(), shape);
        }
        std::mem::swap(&mut src, &mut dst);

        t = Instant::now();
        shape = softmax.forward("softmax", backend, shape, src, dst)?;
        if profiling {
            metrics.record_stage("softmax", t.elapsed(), shape);
        }
        std::mem::swap(&mut src, &mut dst);

        // After the final swap the softmax output sits in `src`.
        if shape.element_count() < num_classes {
            return Err(NetworkError::Config(format!(
                "final stage produced {} values, need {num_classes} class scores",
                shape.element_count(),
            )));
        }

        let mut scores = vec![0.0f32; num_classes];
        backend
            .copy_device_to_host(src.buffer(), num_classes, &mut scores)
            .map_err(|source| NetworkError::Backend {
                stage: "output",
                source,
            })?;

        let label = argmax(&scores);
        metrics.finalise(run_start.elapsed(), arena.stats().peak_live_elements);
        tracing::info!("label {label}; {}", metrics.summary());

        Ok(Classification {
            label,
            scores,
            metrics,
        })
    }
}

/// Index of the maximum score; ties break to the first (lowest) index.
fn argmax(scores: &[f32]) -> usize {
    let mut id = 0;
    for i in 1..scores.len() {
        if scores[id] < scores[i] {
            id = i;
        }
    }
    id
}

impl<S: NetworkState> std::fmt::Debug for Network<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("state", &std::any::type_name::<S>())
            .field("backend", &self.backend.name())
            .field("input", &self.topology.input)
            .field("has_weights", &self.weights.is_some())
            .finish()
    }
}
