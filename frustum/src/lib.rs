pub mod extract;
pub mod intersect;
pub mod plane_packet;

pub use extract::extract_planes;
pub use intersect::{intersect, intersect_no_partial, Intersection};
pub use plane_packet::{build_packed_planes, PackedPlanes, PlanePacket4};
