use common::bitops::find_first_bit_u64;

const WORD_BITS: u32 = 64;

/// Free bitmap for one level: bit set = block free.
pub(crate) struct Level {
    words: Vec<u64>,
    // Last word touched; allocation scans from here.
    hint: usize,
    block_count: u32,
}

impl Level {
    pub(crate) fn new(block_count: u32) -> Self {
        let word_count = (block_count as usize).div_ceil(WORD_BITS as usize);
        Self {
            words: vec![0; word_count.max(1)],
            hint: 0,
            block_count,
        }
    }

    #[inline(always)]
    pub(crate) fn block_count(&self) -> u32 {
        self.block_count
    }

    #[inline(always)]
    fn split(block: u32) -> (usize, u64) {
        ((block / WORD_BITS) as usize, 1u64 << (block % WORD_BITS))
    }

    #[inline(always)]
    pub(crate) fn is_free(&self, block: u32) -> bool {
        debug_assert!(block < self.block_count);
        let (word, mask) = Self::split(block);
        self.words[word] & mask != 0
    }

    #[inline(always)]
    pub(crate) fn set_free(&mut self, block: u32) {
        debug_assert!(block < self.block_count);
        let (word, mask) = Self::split(block);
        self.words[word] |= mask;
        self.hint = word;
    }

    #[inline(always)]
    pub(crate) fn clear_free(&mut self, block: u32) {
        debug_assert!(block < self.block_count);
        let (word, mask) = Self::split(block);
        self.words[word] &= !mask;
        self.hint = word;
    }

    /// Claims any free block, scanning from the hint word and wrapping.
    pub(crate) fn take_any(&mut self) -> Option<u32> {
        let word_count = self.words.len();
        for step in 0..word_count {
            let word = (self.hint + step) % word_count;
            let bits = self.words[word];
            if bits == 0 {
                continue;
            }
            let bit = find_first_bit_u64(bits) as u32;
            self.words[word] = bits & !(1u64 << bit);
            self.hint = word;
            return Some(word as u32 * WORD_BITS + bit);
        }
        None
    }

    pub(crate) fn free_bits(&self) -> u32 {
        self.words.iter().map(|word| word.count_ones()).sum()
    }
}
