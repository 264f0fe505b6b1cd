// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Classification profiling metrics.
//!
//! [`ClassifyMetrics`] collects per-stage and aggregate timing plus device
//! memory usage for one classification run.

use std::time::Duration;
use tensor_core::TensorShape;

/// Metrics for a single stage's execution.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StageMetrics {
    /// Stage label (`"conv1"`, `"pool1"`, ...).
    pub stage: &'static str,
    /// Wall-clock time for the stage, including buffer growth.
    pub duration: Duration,
    /// The stage's output shape.
    pub output_shape: TensorShape,
    /// Elements written by the stage.
    pub output_elements: usize,
}

/// Aggregate metrics for one classification.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ClassifyMetrics {
    /// Total wall-clock time, including image upload and result readback.
    pub total_duration: Duration,
    /// Per-stage metrics, in execution order. Empty when profiling is off.
    pub stage_metrics: Vec<StageMetrics>,
    /// Peak live device elements observed by the arena.
    pub peak_device_elements: usize,
}

impl ClassifyMetrics {
    /// Creates an empty metrics container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records metrics for one stage.
    pub fn record_stage(&mut self, stage: &'static str, duration: Duration, shape: TensorShape) {
        self.stage_metrics.push(StageMetrics {
            stage,
            duration,
            output_shape: shape,
            output_elements: shape.element_count(),
        });
    }

    /// Finalises metrics with the run's total time and peak memory.
    pub fn finalise(&mut self, total: Duration, peak_device_elements: usize) {
        self.total_duration = total;
        self.peak_device_elements = peak_device_elements;
    }

    /// Total time spent inside stages (excludes upload/readback).
    pub fn stage_duration(&self) -> Duration {
        self.stage_metrics.iter().map(|s| s.duration).sum()
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        let peak_kb = (self.peak_device_elements * 4) as f64 / 1024.0;
        format!(
            "Classification: {:.2}ms total, {} stages ({:.2}ms in stages), peak {:.1} KB device memory",
            self.total_duration.as_secs_f64() * 1000.0,
            self.stage_metrics.len(),
            self.stage_duration().as_secs_f64() * 1000.0,
            peak_kb,
        )
    }
}
