use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelStats {
    pub block_size: u32,
    pub free_blocks: u32,
    pub total_blocks: u32,
}

/// Capacity snapshot. Levels are read one at a time without the allocator
/// lock, so a snapshot taken during concurrent alloc/free may be slightly
/// stale but is never torn per level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuddyStats {
    pub levels: Vec<LevelStats>,
    pub allocated_bytes: u64,
    pub total_bytes: u64,
}

impl BuddyStats {
    pub fn free_bytes(&self) -> u64 {
        self.total_bytes - self.allocated_bytes
    }

    /// Size of the largest block currently free, or 0 when full.
    pub fn largest_free_block(&self) -> u32 {
        self.levels
            .iter()
            .rev()
            .find(|level| level.free_blocks > 0)
            .map_or(0, |level| level.block_size)
    }
}

impl fmt::Display for BuddyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "allocated {}/{} bytes, largest free block {}",
            self.allocated_bytes,
            self.total_bytes,
            self.largest_free_block()
        )?;
        for (index, level) in self.levels.iter().enumerate() {
            write!(
                f,
                "\n  level {} ({} bytes): {}/{} free",
                index, level.block_size, level.free_blocks, level.total_blocks
            )?;
        }
        Ok(())
    }
}
