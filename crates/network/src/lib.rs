// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # network
//!
//! The fixed-topology convolutional inference pipeline:
//! conv → pool → conv → pool → fc → relu → fc → softmax over a single
//! input image.
//!
//! The pipeline core does no numeric work itself — it owns the *shape
//! tracking and buffer management* that drives an opaque
//! [`compute_backend::Backend`] correctly:
//!
//! - [`Topology`] resolves the whole shape chain from configuration before
//!   anything is allocated.
//! - Each stage operation ([`Convolution`], [`Pooling`], [`FullyConnected`],
//!   [`Activation`], [`Softmax`]) derives its output shape, grows the
//!   destination scratch buffer, and invokes backend primitives with the
//!   stage's fixed scale pair.
//! - [`Network`] composes the stages, owns the two ping-pong scratch
//!   buffers and the loaded [`NetworkWeights`], and exposes
//!   [`Network::classify`].
//!
//! # Type-State Pipeline
//! ```text
//! Network<Idle> → load_weights() → Network<Ready> → classify()
//! ```
//! The transition is compile-time checked.
//!
//! # Concurrency
//! Strictly single-threaded and synchronous: each stage blocks until its
//! backend primitives complete. A `Network` is not safe for concurrent
//! classifications; use one instance per worker.

mod config;
mod error;
pub mod image;
mod metrics;
mod pipeline;
mod stages;
mod topology;
mod weights;

pub use config::NetworkConfig;
pub use error::NetworkError;
pub use metrics::{ClassifyMetrics, StageMetrics};
pub use pipeline::{Classification, Idle, Network, NetworkState, Ready};
pub use stages::{Activation, Convolution, FullyConnected, Pooling, Softmax};
pub use topology::{ConvGeometry, DenseGeometry, Topology};
pub use weights::{ConvWeights, DenseWeights, NetworkWeights, WeightLoader};
