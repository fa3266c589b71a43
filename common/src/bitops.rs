//! Bit scans used for O(1) level and address math.
//!
//! Both scans return the zero-based bit position, or `-1` when no bit is set.

#[inline(always)]
pub fn find_first_bit(value: u32) -> i32 {
    if value == 0 {
        return -1;
    }
    value.trailing_zeros() as i32
}

#[inline(always)]
pub fn find_last_bit(value: u32) -> i32 {
    if value == 0 {
        return -1;
    }
    31 - value.leading_zeros() as i32
}

#[inline(always)]
pub fn find_first_bit_u64(value: u64) -> i32 {
    if value == 0 {
        return -1;
    }
    value.trailing_zeros() as i32
}

#[inline(always)]
pub fn find_last_bit_u64(value: u64) -> i32 {
    if value == 0 {
        return -1;
    }
    63 - value.leading_zeros() as i32
}

/// `log2` of a power of two.
#[inline(always)]
pub fn log2_pow2(value: u32) -> u32 {
    debug_assert!(value.is_power_of_two(), "{} is not a power of two", value);
    value.trailing_zeros()
}
