//! # Spatial Layout
//!
//! 3D force-directed layout (Fruchterman–Reingold extended to three axes)
//! over a live [`Graphset`](crate::graphset::Graphset).
//!
//! ```text
//! Uninitialized ──initialize_layout()──▶ Initialized ──step()──▶ Stepping ──▶ Done
//!                                                       ▲            │
//!                                                       └──step()────┘
//! ```
//!
//! Each step runs three passes over the live vertex/edge collections:
//! repulsion between every vertex pair, attraction along every resolvable
//! edge, then a temperature-bounded position update. Temperature cools
//! linearly with the iteration count and every `adjust_interval` iterations
//! the force constants are nudged toward balance.
//!
//! A pass that sees the Graphset's structure change while it scans discards
//! its scratch results and restarts. No lock is held across passes.

mod engine;

use serde::{Deserialize, Serialize};

use crate::model::Dimensions;

pub use engine::SpatialLayout;

/// Distance floor used in every force calculation.
pub const EPSILON: f64 = 1e-6;

// ============================================================================
// Configuration
// ============================================================================

/// Engine constants. The defaults are the tuned values; requests vary
/// [`LayoutMetadata`](crate::model::LayoutMetadata), not these.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Hard iteration cap. `done()` is true once the iteration count exceeds it.
    pub max_iterations: u32,
    /// Initial temperature is `width / cooling_divisor`.
    pub cooling_divisor: f64,
    /// Per-axis cap on a single iteration's displacement.
    pub max_step: f64,
    pub epsilon: f64,
    /// Force constants are rebalanced every this many iterations.
    pub adjust_interval: u32,
    /// Edge length of the cube a single node is assumed to occupy when
    /// estimating density.
    pub node_footprint: f64,
    /// Attraction multiplier for the movable end of an edge whose other end is pinned.
    pub pinned_neighbor_scale: f64,
    /// Seed for initial placement. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_iterations: 250,
            cooling_divisor: 10.0,
            max_step: 30.0,
            epsilon: EPSILON,
            adjust_interval: 100,
            node_footprint: 20.0,
            pinned_neighbor_scale: 5.0,
            seed: None,
        }
    }
}

impl LayoutConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_adjust_interval(mut self, interval: u32) -> Self {
        self.adjust_interval = interval;
        self
    }
}

// ============================================================================
// State & report
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutState {
    Uninitialized,
    Initialized,
    Stepping,
    Done,
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReport {
    pub iterations: u32,
    pub temperature: f64,
    /// Dimensions after density rescaling.
    pub dimensions: Dimensions,
    pub repulsion_const: f64,
    pub attraction_const: f64,
    pub vertices: usize,
}
