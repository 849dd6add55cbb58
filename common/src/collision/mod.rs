pub mod helpers;

use bevy_math::Vec3;

use crate::markers::{Category, CategoryMask};

pub use helpers::{Collision, ray_vs_cuboid, ray_vs_sphere};

// ============================================================================
// Colliders
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Cuboid { half_extents: Vec3 },
    Sphere { radius: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub id: ColliderId,
    pub category: Category,
    pub center: Vec3,
    pub shape: Shape,
}

// A ray hit against a single collider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub id: ColliderId,
    pub category: Category,
    pub distance: f32,
    pub point: Vec3,
    pub normal: Vec3,
}

impl Collider {
    #[must_use]
    pub const fn matches(&self, mask: CategoryMask) -> bool {
        mask.contains(self.category)
    }

    #[must_use]
    pub fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<RayHit> {
        let collision = match self.shape {
            Shape::Cuboid { half_extents } => ray_vs_cuboid(origin, dir, max_distance, self.center, half_extents),
            Shape::Sphere { radius } => ray_vs_sphere(origin, dir, max_distance, self.center, radius),
        }?;

        Some(RayHit {
            id: self.id,
            category: self.category,
            distance: collision.t,
            point: dir.mul_add(Vec3::splat(collision.t), origin),
            normal: collision.normal,
        })
    }

    #[must_use]
    pub fn overlaps_sphere(&self, center: Vec3, radius: f32) -> bool {
        match self.shape {
            Shape::Cuboid { half_extents } => {
                helpers::overlap_sphere_vs_cuboid(center, radius, self.center, half_extents)
            }
            Shape::Sphere { radius: own } => helpers::overlap_sphere_vs_sphere(center, radius, self.center, own),
        }
    }
}
