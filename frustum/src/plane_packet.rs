use common::Plane;
use glam::{Vec3, Vec4};
use smallvec::SmallVec;

pub const PADDING_NORMAL: Vec3 = Vec3::X;
pub const PADDING_DISTANCE: f32 = 1e9;

/// Four planes in SoA layout, one plane per lane.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlanePacket4 {
    pub xs: Vec4,
    pub ys: Vec4,
    pub zs: Vec4,
    pub ds: Vec4,
}

/// Six frustum planes fit in two packets without spilling to the heap.
pub type PackedPlanes = SmallVec<[PlanePacket4; 2]>;

impl PlanePacket4 {
    /// Packet whose every lane is the always-inside padding plane.
    pub fn padding() -> Self {
        Self {
            xs: Vec4::splat(PADDING_NORMAL.x),
            ys: Vec4::splat(PADDING_NORMAL.y),
            zs: Vec4::splat(PADDING_NORMAL.z),
            ds: Vec4::splat(PADDING_DISTANCE),
        }
    }

    fn set_lane(&mut self, lane: usize, plane: &Plane) {
        self.xs[lane] = plane.normal.x;
        self.ys[lane] = plane.normal.y;
        self.zs[lane] = plane.normal.z;
        self.ds[lane] = plane.distance;
    }

    pub fn lane(&self, lane: usize) -> Plane {
        Plane::new(
            Vec3::new(self.xs[lane], self.ys[lane], self.zs[lane]),
            self.ds[lane],
        )
    }

    /// Signed distance of `center` to each of the four planes.
    #[inline(always)]
    pub fn distances(&self, center: Vec3) -> Vec4 {
        self.xs * center.x + self.ys * center.y + self.zs * center.z + self.ds
    }

    /// Projected radius of a box with half size `extents` onto each normal.
    #[inline(always)]
    pub fn radii(&self, extents: Vec3) -> Vec4 {
        self.xs.abs() * extents.x + self.ys.abs() * extents.y + self.zs.abs() * extents.z
    }
}

pub fn build_packed_planes(planes: &[Plane]) -> PackedPlanes {
    planes
        .chunks(4)
        .map(|group| {
            let mut packet = PlanePacket4::padding();
            for (lane, plane) in group.iter().enumerate() {
                packet.set_lane(lane, plane);
            }
            packet
        })
        .collect()
}
