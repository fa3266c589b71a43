/// Hands out small integer ids and takes them back for reuse.
///
/// Returning an id twice, or returning one that was never issued, is not
/// detected; callers keep that discipline.
pub struct IdGenerator {
    free_ids: Vec<u32>,
    minted: u32,
}

impl IdGenerator {
    pub fn new(capacity: u32) -> IdGenerator {
        // Reverse order so a fresh pool pops 0 first.
        IdGenerator {
            free_ids: (0..capacity).rev().collect(),
            minted: capacity,
        }
    }

    pub fn get_id(&mut self) -> u32 {
        match self.free_ids.pop() {
            Some(id) => id,
            None => {
                let id = self.minted;
                self.minted += 1;
                id
            }
        }
    }

    pub fn return_id(&mut self, id: u32) {
        debug_assert!(id < self.minted, "id {} was never issued", id);
        self.free_ids.push(id);
    }

    /// Number of distinct ids minted so far (initial capacity plus growth).
    pub fn capacity(&self) -> u32 {
        self.minted
    }

    pub fn available(&self) -> usize {
        self.free_ids.len()
    }

    pub fn in_use(&self) -> usize {
        self.minted as usize - self.free_ids.len()
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}
