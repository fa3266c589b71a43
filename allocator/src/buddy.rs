use crate::chunk::Chunk;
use crate::config::BuddyConfig;
use crate::error::AllocResult;
use crate::level::Level;
use crate::stats::{BuddyStats, LevelStats};
use common::bitops::{find_last_bit, log2_pow2};
use common::SpinLock;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::debug;

struct BuddyState {
    levels: Vec<Level>,
}

impl BuddyState {
    fn alloc_block(&mut self, free_counts: &[AtomicU32], level: usize) -> Option<u32> {
        // Lowest level at or above the request that still has a free block.
        let mut found = level;
        while free_counts[found].load(Ordering::Relaxed) == 0 {
            found += 1;
            if found == self.levels.len() {
                return None;
            }
        }

        let mut block = self.levels[found].take_any()?;
        free_counts[found].fetch_sub(1, Ordering::Relaxed);

        // Split down to the requested level, keeping the even half and
        // publishing the odd half as free.
        while found > level {
            found -= 1;
            block <<= 1;
            self.levels[found].set_free(block | 1);
            free_counts[found].fetch_add(1, Ordering::Relaxed);
        }
        Some(block)
    }

    fn free_block(&mut self, free_counts: &[AtomicU32], mut level: usize, mut block: u32) {
        debug_assert!(
            !self.levels[level].is_free(block),
            "double free of block {} at level {}",
            block,
            level
        );
        let top = self.levels.len() - 1;
        while level < top {
            let buddy = block ^ 1;
            if !self.levels[level].is_free(buddy) {
                break;
            }
            self.levels[level].clear_free(buddy);
            free_counts[level].fetch_sub(1, Ordering::Relaxed);
            block >>= 1;
            level += 1;
        }
        self.levels[level].set_free(block);
        free_counts[level].fetch_add(1, Ordering::Relaxed);
    }
}

/// Binary buddy allocator over `num_max_size` blocks of `max_size` units.
///
/// `alloc` and `free` take `&self` and are serialized by an internal spin
/// lock. Decoding a [`Chunk`] only reads the immutable configuration.
pub struct BuddyAllocator {
    config: BuddyConfig,
    min_shift: u32,
    num_levels: usize,
    state: SpinLock<BuddyState>,
    // Mutated only while `state` is locked; read freely by `stats`.
    free_counts: Box<[AtomicU32]>,
}

impl BuddyAllocator {
    /// Panics when `config` is invalid.
    pub fn new(config: BuddyConfig) -> Self {
        match Self::try_new(config) {
            Ok(allocator) => allocator,
            Err(err) => panic!("invalid buddy allocator config: {}", err),
        }
    }

    pub fn try_new(config: BuddyConfig) -> AllocResult<Self> {
        config.validate()?;
        let min_shift = log2_pow2(config.min_size);
        let num_levels = (log2_pow2(config.max_size) - min_shift) as usize + 1;
        let level0_blocks = config.num_max_size << (num_levels - 1);

        let mut levels: Vec<Level> = (0..num_levels)
            .map(|level| Level::new(level0_blocks >> level))
            .collect();
        let top = num_levels - 1;
        for block in 0..config.num_max_size {
            levels[top].set_free(block);
        }
        let free_counts: Box<[AtomicU32]> = (0..num_levels)
            .map(|level| {
                let free = if level == top { config.num_max_size } else { 0 };
                AtomicU32::new(free)
            })
            .collect();

        debug!(
            min_size = config.min_size,
            max_size = config.max_size,
            num_max_size = config.num_max_size,
            num_levels,
            total_bytes = config.total_size(),
            "buddy allocator initialized"
        );

        Ok(Self {
            config,
            min_shift,
            num_levels,
            state: SpinLock::new(BuddyState { levels }),
            free_counts,
        })
    }

    pub fn config(&self) -> &BuddyConfig {
        &self.config
    }

    pub fn min_size(&self) -> u32 {
        self.config.min_size
    }

    pub fn max_size(&self) -> u32 {
        self.config.max_size
    }

    pub fn num_levels(&self) -> usize {
        self.num_levels
    }

    pub fn capacity(&self) -> u64 {
        self.config.total_size()
    }

    /// Level whose block size is the smallest one holding `size`. May be past
    /// the top level for oversized requests.
    #[inline(always)]
    pub fn level_for_size(&self, size: u32) -> usize {
        if size <= self.config.min_size {
            return 0;
        }
        (find_last_bit(size - 1) + 1) as usize - self.min_shift as usize
    }

    /// Returns `None` when no block of sufficient size is available. That is a
    /// capacity condition for the caller to handle, not a fault.
    pub fn alloc(&self, size: u32) -> Option<Chunk> {
        let level = self.level_for_size(size);
        if level >= self.num_levels {
            debug!(size, level, "buddy allocation larger than max_size");
            return None;
        }

        let block = self.state.lock().alloc_block(&self.free_counts, level);
        match block {
            Some(block) => {
                let address = block << (self.min_shift as usize + level);
                Some(Chunk::new(level as u8, address))
            }
            None => {
                debug!(size, level, "buddy allocation failed: pool exhausted");
                None
            }
        }
    }

    pub fn free(&self, chunk: Chunk) {
        let level = chunk.level() as usize;
        debug_assert!(
            level < self.num_levels && (chunk.address() as u64) < self.capacity(),
            "chunk {:?} does not belong to this allocator",
            chunk
        );
        let block = self.block_index(&chunk);
        self.state
            .lock()
            .free_block(&self.free_counts, level, block);
    }

    #[inline(always)]
    pub fn size_of(&self, chunk: &Chunk) -> u32 {
        self.config.min_size << chunk.level()
    }

    /// Index of the block within its level.
    #[inline(always)]
    pub fn block_index(&self, chunk: &Chunk) -> u32 {
        chunk.address() >> (self.min_shift + chunk.level() as u32)
    }

    /// Offset of the block from the start of the pool, in the pool's units.
    #[inline(always)]
    pub fn block_offset(&self, chunk: &Chunk) -> u32 {
        chunk.address()
    }

    pub fn is_empty(&self) -> bool {
        self.free_counts[self.num_levels - 1].load(Ordering::Acquire) == self.config.num_max_size
    }

    pub fn stats(&self) -> BuddyStats {
        let level0_blocks = self.config.num_max_size << (self.num_levels - 1);
        let levels: Vec<LevelStats> = self
            .free_counts
            .iter()
            .enumerate()
            .map(|(level, free)| LevelStats {
                block_size: self.config.min_size << level,
                free_blocks: free.load(Ordering::Relaxed),
                total_blocks: level0_blocks >> level,
            })
            .collect();
        let free_bytes: u64 = levels
            .iter()
            .map(|level| level.free_blocks as u64 * level.block_size as u64)
            .sum();
        let total_bytes = self.capacity();
        BuddyStats {
            levels,
            allocated_bytes: total_bytes.saturating_sub(free_bytes),
            total_bytes,
        }
    }

    pub fn largest_free_block(&self) -> u32 {
        self.stats().largest_free_block()
    }

    /// Cross-checks the free counters against the bitmaps. Takes the lock.
    pub fn check_consistency(&self) -> bool {
        let state = self.state.lock();
        state.levels.iter().enumerate().all(|(index, level)| {
            level.free_bits() == self.free_counts[index].load(Ordering::Relaxed)
                && level.block_count() == (self.config.num_max_size << (self.num_levels - 1)) >> index
        })
    }
}
