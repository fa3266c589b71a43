pub mod bitops;
pub mod id_pool;
pub mod shapes;
pub mod spin_lock;

pub use id_pool::IdGenerator;
pub use shapes::{Aabb, Plane};
pub use spin_lock::{RawSpinLock, SpinLock, SpinLockGuard};
