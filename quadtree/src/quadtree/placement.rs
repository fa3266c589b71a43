use super::*;
use common::Aabb;
use glam::Vec3;
use rayon::prelude::*;

impl QuadTree {
    /// Finest grid cell that fully contains `aabb` on X and Z.
    ///
    /// The indexed region spans `root_cells` root cells on X and Z and exactly
    /// one node on Y: `origin.y ..= origin.y + node_height`. A box taller than
    /// a node, or reaching above or below that band, is never placed.
    ///
    /// Returns [`QuadCoord::OUTSIDER`] for non-finite boxes, boxes leaving the
    /// region on any axis and boxes straddling root cells. Region edges are
    /// compared against the configured origin and span directly, with a few
    /// ulps of slack for the rounding of `center +- extents`.
    pub fn calculate_coord(&self, aabb: &Aabb) -> QuadCoord {
        if !aabb.is_finite() {
            return QuadCoord::OUTSIDER;
        }
        let origin = self.config.origin;
        let size = self.config.world_size();
        let span = Vec3::new(size, self.config.node_height, size);
        let slack = (origin.abs() + span) * (4.0 * f32::EPSILON);
        let (min, max) = (aabb.min(), aabb.max());
        if min.cmplt(origin - slack).any() || max.cmpgt(origin + span + slack).any() {
            return QuadCoord::OUTSIDER;
        }

        let rel_min = min - self.config.origin;
        let rel_max = max - self.config.origin;
        let mut coord = QuadCoord::OUTSIDER;
        for lod in (0..=self.config.max_lod).rev() {
            let (x0, z0) = self.cell_of(rel_min, lod);
            let (x1, z1) = self.cell_of(rel_max, lod);
            if x0 != x1 || z0 != z1 {
                break;
            }
            coord = QuadCoord::new(x0, z0, lod as i32);
        }
        coord
    }

    pub fn calculate_coords(&self, aabbs: &[Aabb]) -> Vec<QuadCoord> {
        aabbs
            .par_iter()
            .map(|aabb| self.calculate_coord(aabb))
            .collect()
    }

    pub(crate) fn calculate_coords_of(&self, items: &[(u32, Aabb)]) -> Vec<QuadCoord> {
        items
            .par_iter()
            .map(|(_, aabb)| self.calculate_coord(aabb))
            .collect()
    }

    // Points on the far edge of the region belong to the last cell.
    #[inline(always)]
    fn cell_of(&self, relative: Vec3, lod: u32) -> (i32, i32) {
        let cell = self.config.cell_size(lod);
        let last = self.config.cells_per_axis(lod) - 1;
        (
            ((relative.x / cell).floor() as i32).clamp(0, last),
            ((relative.z / cell).floor() as i32).clamp(0, last),
        )
    }
}
