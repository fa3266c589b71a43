use super::*;
use crate::error::QuadtreeResult;
use common::Aabb;
use fxhash::{FxHashMap, FxHashSet};
use glam::Vec3;
use tracing::debug;

impl QuadTree {
    /// Panics when `config` is invalid.
    pub fn new(config: Config) -> Self {
        match Self::try_new(config) {
            Ok(quadtree) => quadtree,
            Err(err) => panic!("invalid quadtree config: {}", err),
        }
    }

    pub fn try_new(config: Config) -> QuadtreeResult<Self> {
        config.validate()?;
        debug!(
            max_lod = config.max_lod,
            root_cells = config.root_cells,
            world_size = config.world_size(),
            node_height = config.node_height,
            "quadtree initialized"
        );
        Ok(Self {
            config,
            buckets: FxHashMap::default(),
            outsiders: Vec::new(),
            locations: FxHashMap::default(),
            occupancy: FxHashMap::default(),
            pending: Vec::new(),
            dirty: FxHashSet::default(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Live entries, not counting those marked for deletion.
    pub fn len(&self) -> usize {
        self.locations.len() - self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, index: u32) -> bool {
        self.locations
            .get(&index)
            .map_or(false, |location| !location.marked)
    }

    pub fn coord_of(&self, index: u32) -> Option<QuadCoord> {
        match self.locations.get(&index) {
            Some(location) if !location.marked => Some(location.coord),
            _ => None,
        }
    }

    pub fn outsider_count(&self) -> usize {
        self.outsiders
            .iter()
            .filter(|&&index| index != DELETED_SENTINEL)
            .count()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn pending_deletes(&self) -> usize {
        self.pending.len()
    }

    /// Raw list stored for `coord`, sentinels of pending deletions included.
    pub fn indices_at(&self, coord: QuadCoord) -> &[u32] {
        if coord.is_outsider() {
            return &self.outsiders;
        }
        self.buckets
            .get(&coord)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.outsiders.clear();
        self.locations.clear();
        self.occupancy.clear();
        self.pending.clear();
        self.dirty.clear();
    }

    /// Bounds of the whole indexed region.
    pub fn world_bounds(&self) -> Aabb {
        let size = self.config.world_size();
        Aabb::from_min_max(
            self.config.origin,
            self.config.origin + Vec3::new(size, self.config.node_height, size),
        )
    }

    /// Bounds of the node at `coord`, or `None` when the coordinate is not
    /// part of the grid.
    pub fn node_aabb(&self, coord: QuadCoord) -> Option<Aabb> {
        if self.is_grid_coord(coord) {
            Some(self.node_bounds(coord))
        } else {
            None
        }
    }

    pub(crate) fn is_grid_coord(&self, coord: QuadCoord) -> bool {
        if coord.lod < 0 || coord.lod > self.config.max_lod as i32 {
            return false;
        }
        let cells = self.config.cells_per_axis(coord.lod as u32);
        (0..cells).contains(&coord.x) && (0..cells).contains(&coord.z)
    }

    #[inline(always)]
    pub(crate) fn node_bounds(&self, coord: QuadCoord) -> Aabb {
        let cell = self.config.cell_size(coord.lod as u32);
        let min = self.config.origin + Vec3::new(coord.x as f32 * cell, 0.0, coord.z as f32 * cell);
        Aabb::from_min_max(min, min + Vec3::new(cell, self.config.node_height, cell))
    }

    #[inline(always)]
    pub(crate) fn is_occupied(&self, coord: &QuadCoord) -> bool {
        self.occupancy.contains_key(coord)
    }

    pub(crate) fn bucket_created(&mut self, mut coord: QuadCoord) {
        let max_lod = self.config.max_lod as i32;
        loop {
            *self.occupancy.entry(coord).or_insert(0) += 1;
            if coord.lod >= max_lod {
                break;
            }
            coord = coord.parent();
        }
    }

    pub(crate) fn bucket_removed(&mut self, mut coord: QuadCoord) {
        let max_lod = self.config.max_lod as i32;
        loop {
            if let Some(count) = self.occupancy.get_mut(&coord) {
                *count -= 1;
                if *count == 0 {
                    self.occupancy.remove(&coord);
                }
            }
            if coord.lod >= max_lod {
                break;
            }
            coord = coord.parent();
        }
    }

    /// Appends `index` to the list of `coord`. Coordinates outside the grid go
    /// to the outsider list. Panics if `index` is already live.
    pub fn insert_coord(&mut self, index: u32, coord: QuadCoord) {
        assert_ne!(index, DELETED_SENTINEL, "index {} is reserved", index);
        if let Some(location) = self.locations.get(&index) {
            assert!(location.marked, "index {} is already in the quadtree", index);
            self.flush_deletes();
        }

        let coord = if self.is_grid_coord(coord) {
            coord
        } else {
            QuadCoord::OUTSIDER
        };
        let slot = if coord.is_outsider() {
            self.outsiders.push(index);
            self.outsiders.len() - 1
        } else {
            let list = self.buckets.entry(coord).or_default();
            list.push(index);
            let slot = list.len() - 1;
            if slot == 0 {
                self.bucket_created(coord);
            }
            slot
        };
        self.locations.insert(
            index,
            Location {
                coord,
                slot: slot as u32,
                marked: false,
            },
        );
    }

    /// Computes the coordinate of `aabb` and inserts `index` there.
    pub fn insert(&mut self, index: u32, aabb: &Aabb) -> QuadCoord {
        let coord = self.calculate_coord(aabb);
        self.insert_coord(index, coord);
        coord
    }

    /// Coordinates are computed in parallel, then applied in order.
    pub fn insert_batch(&mut self, items: &[(u32, Aabb)]) -> Vec<QuadCoord> {
        let coords = self.calculate_coords_of(items);
        for (&(index, _), &coord) in items.iter().zip(&coords) {
            self.insert_coord(index, coord);
        }
        coords
    }

    /// Checks that lists, the reverse map and the occupancy counts agree.
    pub fn check_consistency(&self) -> bool {
        for (&index, location) in &self.locations {
            let list = self.indices_at(location.coord);
            if location.marked {
                if !self.pending.contains(&index) {
                    return false;
                }
                continue;
            }
            if list.get(location.slot as usize) != Some(&index) {
                return false;
            }
        }

        let mut listed = self
            .outsiders
            .iter()
            .filter(|&&index| index != DELETED_SENTINEL)
            .count();
        for (&coord, list) in &self.buckets {
            if list.is_empty() || !self.is_occupied(&coord) {
                return false;
            }
            listed += list.iter().filter(|&&index| index != DELETED_SENTINEL).count();
        }
        if listed != self.len() {
            return false;
        }

        let mut expected: FxHashMap<QuadCoord, u32> = FxHashMap::default();
        for &coord in self.buckets.keys() {
            let mut coord = coord;
            loop {
                *expected.entry(coord).or_insert(0) += 1;
                if coord.lod >= self.config.max_lod as i32 {
                    break;
                }
                coord = coord.parent();
            }
        }
        expected == self.occupancy
    }
}
