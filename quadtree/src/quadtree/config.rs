use crate::error::{QuadtreeError, QuadtreeResult};
use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// World-space corner of the indexed region (minimum X, Y and Z).
    pub origin: Vec3,
    /// Edge length of a lod 0 cell on X and Z.
    pub node_size: f32,
    /// Height of every node on Y.
    pub node_height: f32,
    pub max_lod: u32,
    /// Cells per axis at `max_lod`.
    pub root_cells: u32,
    pub cull_enabled: bool,
    /// Frontier size from which node tests are spread across the rayon pool.
    pub parallel_threshold: usize,
}

impl Config {
    pub fn validate(&self) -> QuadtreeResult<()> {
        if !self.origin.is_finite() {
            return Err(QuadtreeError::NonFiniteOrigin {
                origin: self.origin,
            });
        }
        if !self.node_size.is_finite() || self.node_size <= 0.0 {
            return Err(QuadtreeError::InvalidNodeSize {
                node_size: self.node_size,
            });
        }
        if !self.node_height.is_finite() || self.node_height <= 0.0 {
            return Err(QuadtreeError::InvalidNodeHeight {
                node_height: self.node_height,
            });
        }
        if self.root_cells == 0 {
            return Err(QuadtreeError::NoRootCells);
        }
        let too_large = QuadtreeError::GridTooLarge {
            root_cells: self.root_cells,
            max_lod: self.max_lod,
        };
        if self.max_lod >= 31 || (self.root_cells as u64) << self.max_lod > i32::MAX as u64 {
            return Err(too_large);
        }
        if !self.world_size().is_finite() {
            return Err(too_large);
        }
        Ok(())
    }

    /// Edge length of a cell at `lod`.
    #[inline(always)]
    pub fn cell_size(&self, lod: u32) -> f32 {
        self.node_size * (1u32 << lod) as f32
    }

    /// Cells per axis at `lod`.
    #[inline(always)]
    pub fn cells_per_axis(&self, lod: u32) -> i32 {
        (self.root_cells << (self.max_lod - lod)) as i32
    }

    /// Edge length of the indexed region on X and Z.
    pub fn world_size(&self) -> f32 {
        self.cell_size(self.max_lod) * self.root_cells as f32
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            origin: Vec3::ZERO,
            node_size: 32.0,
            node_height: 512.0,
            max_lod: 5,
            root_cells: 8,
            cull_enabled: true,
            parallel_threshold: 256,
        }
    }
}
