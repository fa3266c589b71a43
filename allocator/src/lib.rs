pub mod buddy;
pub mod chunk;
pub mod config;
pub mod error;
mod level;
pub mod stats;

pub use buddy::BuddyAllocator;
pub use chunk::Chunk;
pub use config::BuddyConfig;
pub use error::{AllocError, AllocResult};
pub use stats::{BuddyStats, LevelStats};
