use super::*;
use frustum::{intersect, Intersection, PlanePacket4};
use rayon::prelude::*;
use tracing::{info_span, trace};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CullStats {
    pub nodes_tested: usize,
    pub nodes_in: usize,
    pub nodes_out: usize,
    pub nodes_partial: usize,
    /// Nodes below an `In` node, taken without a test.
    pub nodes_accepted: usize,
}

#[derive(Debug, Default, Clone)]
pub struct CullResult {
    /// Indices whose node is fully inside the frustum.
    pub visible: Vec<u32>,
    /// Indices that need a finer test: nodes straddling a plane and outsiders.
    pub partial: Vec<u32>,
    pub stats: CullStats,
}

impl QuadTree {
    /// Walks the grid top-down from the root cells and sorts every indexed
    /// entry into `visible` or `partial`. Entries of `Out` nodes are dropped.
    /// With `cull_enabled` unset everything lands in `partial`.
    ///
    /// Pending deletions are flushed first.
    pub fn cull(&mut self, planes: &[PlanePacket4], cull_enabled: bool) -> CullResult {
        self.flush_deletes();
        let _span = info_span!("quadtree::cull", cull_enabled, entries = self.len()).entered();

        let mut result = CullResult::default();
        if !cull_enabled {
            for list in self.buckets.values() {
                result.partial.extend_from_slice(list);
            }
            result.partial.extend_from_slice(&self.outsiders);
            return result;
        }

        let (visible_nodes, partial_nodes) = self.classify_nodes(planes, &mut result.stats);
        for coord in &visible_nodes {
            if let Some(list) = self.buckets.get(coord) {
                result.visible.extend_from_slice(list);
            }
        }
        for coord in &partial_nodes {
            if let Some(list) = self.buckets.get(coord) {
                result.partial.extend_from_slice(list);
            }
        }
        result.partial.extend_from_slice(&self.outsiders);

        trace!(
            tested = result.stats.nodes_tested,
            inside = result.stats.nodes_in,
            outside = result.stats.nodes_out,
            partial = result.stats.nodes_partial,
            accepted = result.stats.nodes_accepted,
            visible = result.visible.len(),
            partial_entries = result.partial.len(),
            "quadtree cull"
        );
        result
    }

    /// [`QuadTree::cull`] with the configured `cull_enabled` flag.
    pub fn cull_with_config(&mut self, planes: &[PlanePacket4]) -> CullResult {
        let cull_enabled = self.config.cull_enabled;
        self.cull(planes, cull_enabled)
    }

    // Breadth first, one level per iteration. Empty subtrees are never
    // visited.
    fn classify_nodes(
        &self,
        planes: &[PlanePacket4],
        stats: &mut CullStats,
    ) -> (Vec<QuadCoord>, Vec<QuadCoord>) {
        let max_lod = self.config.max_lod as i32;
        let root_cells = self.config.root_cells as i32;
        let mut frontier: Vec<QuadCoord> = (0..root_cells)
            .flat_map(|z| (0..root_cells).map(move |x| QuadCoord::new(x, z, max_lod)))
            .filter(|coord| self.is_occupied(coord))
            .collect();
        let mut accepted: Vec<QuadCoord> = Vec::new();
        let mut visible_nodes = Vec::new();
        let mut partial_nodes = Vec::new();

        for lod in (0..=max_lod).rev() {
            if frontier.is_empty() && accepted.is_empty() {
                break;
            }
            let descend = lod > 0;

            stats.nodes_accepted += accepted.len();
            let mut next_accepted = Vec::new();
            if descend {
                next_accepted.extend(self.occupied_children(&accepted));
            }
            visible_nodes.append(&mut accepted);

            let classes: Vec<Intersection> = if frontier.len() >= self.config.parallel_threshold {
                frontier
                    .par_iter()
                    .map(|&coord| intersect(planes, &self.node_bounds(coord)))
                    .collect()
            } else {
                frontier
                    .iter()
                    .map(|&coord| intersect(planes, &self.node_bounds(coord)))
                    .collect()
            };
            stats.nodes_tested += frontier.len();

            let mut next_frontier = Vec::new();
            for (coord, class) in frontier.into_iter().zip(classes) {
                match class {
                    Intersection::Out => stats.nodes_out += 1,
                    Intersection::In => {
                        stats.nodes_in += 1;
                        visible_nodes.push(coord);
                        if descend {
                            next_accepted.extend(self.occupied_children(&[coord]));
                        }
                    }
                    Intersection::Partial => {
                        stats.nodes_partial += 1;
                        partial_nodes.push(coord);
                        if descend {
                            next_frontier.extend(self.occupied_children(&[coord]));
                        }
                    }
                }
            }
            frontier = next_frontier;
            accepted = next_accepted;
        }
        (visible_nodes, partial_nodes)
    }

    fn occupied_children<'a>(
        &'a self,
        coords: &'a [QuadCoord],
    ) -> impl Iterator<Item = QuadCoord> + 'a {
        coords
            .iter()
            .flat_map(|coord| coord.children())
            .filter(move |child| self.is_occupied(child))
    }
}
