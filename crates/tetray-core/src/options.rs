//! Configuration options for the ray caster.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// How face-index construction treats a face shared by more than two tetrahedra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TopologyPolicy {
    /// Log an error, keep the first two owners, and keep rendering.
    #[default]
    Lenient,
    /// Reject the mesh.
    Strict,
}

/// Tunable limits and defaults for a ray caster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Number of intersection nodes per pool block.
    pub intersection_block_size: usize,

    /// Maximum number of pool blocks. Intersections beyond
    /// `intersection_block_size * max_intersection_blocks` are dropped.
    pub max_intersection_blocks: usize,

    /// Accumulated opacity at which a ray stops marching.
    pub opacity_termination: f64,

    /// Handling of faces with more than two owners.
    pub topology_policy: TopologyPolicy,

    /// Far depth bound used when rendering a whole image.
    pub far_bound: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            intersection_block_size: 10_000,
            max_intersection_blocks: 10_000,
            opacity_termination: 1.0,
            topology_policy: TopologyPolicy::Lenient,
            far_bound: 1.0,
        }
    }
}

impl RenderOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pool block size.
    pub fn with_intersection_block_size(mut self, size: usize) -> Self {
        self.intersection_block_size = size.max(1);
        self
    }

    /// Sets the maximum number of pool blocks.
    pub fn with_max_intersection_blocks(mut self, blocks: usize) -> Self {
        self.max_intersection_blocks = blocks.max(1);
        self
    }

    /// Sets the early ray termination opacity.
    pub fn with_opacity_termination(mut self, opacity: f64) -> Self {
        self.opacity_termination = opacity.clamp(0.0, 1.0);
        self
    }

    /// Sets the topology policy.
    pub fn with_topology_policy(mut self, policy: TopologyPolicy) -> Self {
        self.topology_policy = policy;
        self
    }

    /// Sets the far depth bound for whole-image rendering.
    pub fn with_far_bound(mut self, far: f64) -> Self {
        self.far_bound = far;
        self
    }

    /// Total number of intersection nodes the pool can hold.
    pub fn intersection_capacity(&self) -> usize {
        self.intersection_block_size
            .saturating_mul(self.max_intersection_blocks)
    }

    /// Loads options from a JSON file. Missing fields take their defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let options = serde_json::from_str(&text)?;
        log::debug!("loaded render options from {}", path.as_ref().display());
        Ok(options)
    }

    /// Writes options to a JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}
