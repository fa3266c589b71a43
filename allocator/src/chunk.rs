/// One allocated block: its level and byte address inside the pool.
///
/// Neither `Copy` nor `Clone`: [`BuddyAllocator::free`] consumes
/// the handle, so a chunk can only be returned once.
///
/// [`BuddyAllocator::free`]: crate::BuddyAllocator::free
#[derive(Debug, PartialEq, Eq, Hash)]
#[must_use = "dropping a chunk leaks its block until the allocator is dropped"]
pub struct Chunk {
    level: u8,
    address: u32,
}

impl Chunk {
    /// Raw value reserved for "no chunk" when handles are packed for the GPU.
    pub const INVALID_RAW: u64 = u64::MAX;

    #[inline(always)]
    pub(crate) fn new(level: u8, address: u32) -> Self {
        Self { level, address }
    }

    #[inline(always)]
    pub fn level(&self) -> u8 {
        self.level
    }

    #[inline(always)]
    pub fn address(&self) -> u32 {
        self.address
    }

    /// `(level << 32) | address`.
    #[inline(always)]
    pub fn raw(&self) -> u64 {
        ((self.level as u64) << 32) | self.address as u64
    }

    pub fn raw_or_invalid(chunk: Option<&Chunk>) -> u64 {
        chunk.map_or(Self::INVALID_RAW, Chunk::raw)
    }
}
