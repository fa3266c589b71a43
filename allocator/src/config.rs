use crate::error::{AllocError, AllocResult};
use serde::{Deserialize, Serialize};

/// Sizing of one buddy pool. Units are whatever the pool hands out: bytes for
/// transform data, slots for index ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuddyConfig {
    pub min_size: u32,
    pub max_size: u32,
    pub num_max_size: u32,
}

impl Default for BuddyConfig {
    fn default() -> Self {
        BuddyConfig {
            min_size: 64,
            max_size: 64 * 1024,
            num_max_size: 16,
        }
    }
}

impl BuddyConfig {
    pub fn new(min_size: u32, max_size: u32, num_max_size: u32) -> Self {
        Self {
            min_size,
            max_size,
            num_max_size,
        }
    }

    pub fn validate(&self) -> AllocResult<()> {
        if !self.min_size.is_power_of_two() {
            return Err(AllocError::MinSizeNotPowerOfTwo {
                min_size: self.min_size,
            });
        }
        if !self.max_size.is_power_of_two() {
            return Err(AllocError::MaxSizeNotPowerOfTwo {
                max_size: self.max_size,
            });
        }
        if self.max_size < self.min_size {
            return Err(AllocError::MaxSizeBelowMinSize {
                min_size: self.min_size,
                max_size: self.max_size,
            });
        }
        if !self.num_max_size.is_power_of_two() {
            return Err(AllocError::BlockCountNotPowerOfTwo {
                num_max_size: self.num_max_size,
            });
        }
        if self.total_size() > 1u64 << 32 {
            return Err(AllocError::CapacityOverflow {
                max_size: self.max_size,
                num_max_size: self.num_max_size,
            });
        }
        // Level 0 holds one bit per min_size block, indexed by u32.
        if self.total_size() / self.min_size as u64 > u32::MAX as u64 {
            return Err(AllocError::BlockIndexOverflow {
                min_size: self.min_size,
                total_size: self.total_size(),
            });
        }
        Ok(())
    }

    pub fn total_size(&self) -> u64 {
        self.max_size as u64 * self.num_max_size as u64
    }
}
