use common::Plane;
use glam::{Mat4, Vec4};

pub const LEFT: usize = 0;
pub const RIGHT: usize = 1;
pub const BOTTOM: usize = 2;
pub const TOP: usize = 3;
pub const NEAR: usize = 4;
pub const FAR: usize = 5;

/// Extracts the six inward-facing, normalized clip planes of a combined
/// view-projection matrix (Gribb-Hartmann). Assumes a `[0, 1]` depth range,
/// which is what glam's `perspective_*` and `orthographic_*` builders produce.
pub fn extract_planes(view_proj: Mat4) -> [Plane; 6] {
    let rows = [
        view_proj.row(0),
        view_proj.row(1),
        view_proj.row(2),
        view_proj.row(3),
    ];

    let mut planes = [Plane::default(); 6];
    planes[LEFT] = to_plane(rows[3] + rows[0]);
    planes[RIGHT] = to_plane(rows[3] - rows[0]);
    planes[BOTTOM] = to_plane(rows[3] + rows[1]);
    planes[TOP] = to_plane(rows[3] - rows[1]);
    planes[NEAR] = to_plane(rows[2]);
    planes[FAR] = to_plane(rows[3] - rows[2]);
    planes
}

#[inline(always)]
fn to_plane(coefficients: Vec4) -> Plane {
    Plane::from_coefficients(coefficients.x, coefficients.y, coefficients.z, coefficients.w)
        .normalized()
}
