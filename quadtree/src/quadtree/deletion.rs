use super::*;
use rayon::prelude::*;
use tracing::{debug, info_span};

impl QuadTree {
    /// Removes `index` right away. Returns `false` when it is unknown or
    /// already marked for deletion.
    pub fn delete(&mut self, index: u32) -> bool {
        let location = match self.locations.get(&index) {
            Some(location) if !location.marked => *location,
            _ => return false,
        };
        self.locations.remove(&index);

        let slot = location.slot as usize;
        let list = if location.coord.is_outsider() {
            &mut self.outsiders
        } else {
            self.buckets
                .get_mut(&location.coord)
                .expect("located bucket must exist")
        };
        debug_assert_eq!(list[slot], index);
        list.swap_remove(slot);
        if let Some(&moved) = list.get(slot) {
            // A sentinel keeps no slot; the next flush rewrites the list.
            if moved != DELETED_SENTINEL {
                if let Some(moved_location) = self.locations.get_mut(&moved) {
                    moved_location.slot = slot as u32;
                }
            }
        }
        let emptied = list.is_empty();

        if emptied && !location.coord.is_outsider() {
            self.buckets.remove(&location.coord);
            self.bucket_removed(location.coord);
        }
        true
    }

    /// Replaces the slot of `index` with [`DELETED_SENTINEL`]; the entry is
    /// removed by the next [`QuadTree::flush_deletes`]. Returns `false` when
    /// `index` is unknown or already marked.
    pub fn mark_for_delete(&mut self, index: u32) -> bool {
        let location = match self.locations.get_mut(&index) {
            Some(location) if !location.marked => location,
            _ => return false,
        };
        location.marked = true;
        let (coord, slot) = (location.coord, location.slot as usize);

        let list = if coord.is_outsider() {
            &mut self.outsiders
        } else {
            self.buckets
                .get_mut(&coord)
                .expect("located bucket must exist")
        };
        list[slot] = DELETED_SENTINEL;
        self.pending.push(index);
        self.dirty.insert(coord);
        true
    }

    /// Compacts every list touched by `mark_for_delete` and drops the marked
    /// entries. Returns the number of removed entries.
    pub fn flush_deletes(&mut self) -> usize {
        if self.pending.is_empty() {
            return 0;
        }
        let _span = info_span!("quadtree::flush_deletes", pending = self.pending.len()).entered();

        let mut swept: Vec<(QuadCoord, Vec<u32>)> = Vec::with_capacity(self.dirty.len());
        for coord in self.dirty.drain() {
            if coord.is_outsider() {
                swept.push((coord, std::mem::take(&mut self.outsiders)));
            } else if let Some(list) = self.buckets.remove(&coord) {
                swept.push((coord, list));
            }
        }

        swept
            .par_iter_mut()
            .for_each(|(_, list)| list.retain(|&index| index != DELETED_SENTINEL));

        let buckets = swept.len();
        for (coord, list) in swept {
            for (slot, index) in list.iter().enumerate() {
                if let Some(location) = self.locations.get_mut(index) {
                    location.slot = slot as u32;
                }
            }
            if coord.is_outsider() {
                self.outsiders = list;
            } else if list.is_empty() {
                self.bucket_removed(coord);
            } else {
                self.buckets.insert(coord, list);
            }
        }

        let mut removed = 0;
        for index in std::mem::take(&mut self.pending) {
            if self.locations.get(&index).map_or(false, |location| location.marked) {
                self.locations.remove(&index);
                removed += 1;
            }
        }
        debug!(removed, buckets, "flushed pending quadtree deletes");
        removed
    }
}
