use crate::plane_packet::PlanePacket4;
use common::Aabb;
use glam::Vec4;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Intersection {
    Out,
    In,
    Partial,
}

/// Classifies `aabb` against every plane in `packets`.
///
/// `Out` as soon as one plane has the whole box strictly behind it
/// (`dist + radius < 0`). `In` when the box is on the inner side of every
/// plane (`dist >= radius`), padding lanes included. Anything else straddles
/// at least one plane and is `Partial`.
pub fn intersect(packets: &[PlanePacket4], aabb: &Aabb) -> Intersection {
    let mut inside_lanes = 0u32;
    for packet in packets {
        let dist = packet.distances(aabb.center);
        let radius = packet.radii(aabb.extents);
        if (dist + radius).cmplt(Vec4::ZERO).any() {
            return Intersection::Out;
        }
        inside_lanes += dist.cmpge(radius).bitmask().count_ones();
    }
    if inside_lanes as usize == packets.len() * 4 {
        Intersection::In
    } else {
        Intersection::Partial
    }
}

/// Coarse two-way test. A box touching a plane from behind
/// (`dist + radius == 0`) counts as `Out` here, unlike [`intersect`].
pub fn intersect_no_partial(packets: &[PlanePacket4], aabb: &Aabb) -> Intersection {
    for packet in packets {
        let dist = packet.distances(aabb.center);
        let radius = packet.radii(aabb.extents);
        if (dist + radius).cmple(Vec4::ZERO).any() {
            return Intersection::Out;
        }
    }
    Intersection::In
}
