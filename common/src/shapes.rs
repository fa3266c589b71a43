use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec3,
    pub extents: Vec3,
}

impl Aabb {
    pub fn new(center: Vec3, extents: Vec3) -> Self {
        Self { center, extents }
    }

    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            extents: (max - min) * 0.5,
        }
    }

    #[inline(always)]
    pub fn min(&self) -> Vec3 {
        self.center - self.extents
    }

    #[inline(always)]
    pub fn max(&self) -> Vec3 {
        self.center + self.extents
    }

    pub fn size(&self) -> Vec3 {
        self.extents * 2.0
    }

    pub fn is_finite(&self) -> bool {
        self.center.is_finite() && self.extents.is_finite()
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        let min = self.min();
        let max = self.max();
        point.cmpge(min).all() && point.cmple(max).all()
    }

    pub fn contains_aabb(&self, other: &Aabb) -> bool {
        other.min().cmpge(self.min()).all() && other.max().cmple(self.max()).all()
    }

    pub fn expand_to_include(&mut self, other: &Aabb) {
        let min = self.min().min(other.min());
        let max = self.max().max(other.max());
        *self = Aabb::from_min_max(min, max);
    }

    /// Random box with the given extents placed fully inside `self`. Axes where
    /// the extents don't fit are clamped to the min side.
    pub fn get_random_aabb_inside<R: Rng>(&self, extents: Vec3, rng: &mut R) -> Aabb {
        let lo = self.min() + extents;
        let hi = self.max() - extents;
        let center = Vec3::new(
            safe_randf32(rng, lo.x, hi.x),
            safe_randf32(rng, lo.y, hi.y),
            safe_randf32(rng, lo.z, hi.z),
        );
        Aabb::new(center, extents)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            extents: Vec3::ZERO,
        }
    }
}

fn safe_randf32<R: Rng>(rng: &mut R, min: f32, max: f32) -> f32 {
    if min >= max {
        return min;
    }
    rng.gen_range(min..=max)
}

/// A plane `normal · p + distance = 0`. Points with a non-negative signed
/// distance are on the inside.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    pub fn from_coefficients(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self {
            normal: Vec3::new(a, b, c),
            distance: d,
        }
    }

    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.normal.length();
        if len > 0.0 {
            Self {
                normal: self.normal / len,
                distance: self.distance / len,
            }
        } else {
            self
        }
    }

    #[inline(always)]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

impl Default for Plane {
    fn default() -> Self {
        Self {
            normal: Vec3::X,
            distance: 0.0,
        }
    }
}
