use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
    #[error("min_size must be a non-zero power of two (min_size: {min_size})")]
    MinSizeNotPowerOfTwo { min_size: u32 },
    #[error("max_size must be a non-zero power of two (max_size: {max_size})")]
    MaxSizeNotPowerOfTwo { max_size: u32 },
    #[error("max_size must be >= min_size (min_size: {min_size}, max_size: {max_size})")]
    MaxSizeBelowMinSize { min_size: u32, max_size: u32 },
    #[error("num_max_size must be a non-zero power of two (num_max_size: {num_max_size})")]
    BlockCountNotPowerOfTwo { num_max_size: u32 },
    #[error(
        "total capacity does not fit a 32-bit address space (max_size: {max_size}, num_max_size: {num_max_size})"
    )]
    CapacityOverflow { max_size: u32, num_max_size: u32 },
    #[error(
        "min_size blocks do not fit a 32-bit block index (min_size: {min_size}, total_size: {total_size})"
    )]
    BlockIndexOverflow { min_size: u32, total_size: u64 },
}

pub type AllocResult<T> = Result<T, AllocError>;
