mod config;
mod coord;
mod core;
mod cull;
mod deletion;
mod placement;

pub use config::Config;
pub use coord::QuadCoord;
pub use cull::{CullResult, CullStats};

use fxhash::{FxHashMap, FxHashSet};

/// Written into a list slot by `mark_for_delete` until the next flush.
pub const DELETED_SENTINEL: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Location {
    pub(crate) coord: QuadCoord,
    pub(crate) slot: u32,
    pub(crate) marked: bool,
}

/// Sparse quadtree over a fixed grid. Each instance index lives in the list of
/// the finest cell that fully contains its bounds, or in the outsider list.
pub struct QuadTree {
    config: Config,
    buckets: FxHashMap<QuadCoord, Vec<u32>>,
    outsiders: Vec<u32>,
    locations: FxHashMap<u32, Location>,
    // Number of non-empty buckets in the subtree rooted at each coordinate.
    occupancy: FxHashMap<QuadCoord, u32>,
    pending: Vec<u32>,
    dirty: FxHashSet<QuadCoord>,
}
