use bevy_math::Vec3;
use tracing::trace;

use crate::services::SpatialQuery;
use common::{
    collision::{Collider, ColliderId, RayHit, Shape},
    map::MazeGrid,
    markers::{Category, CategoryMask},
};

// ============================================================================
// Collision World
// ============================================================================

// Flat list of colliders: static maze walls and obstacles plus dynamic spheres that are
// re-synced every tick. Linear scans are fine at maze scale.
#[derive(Debug, Default, Clone)]
pub struct CollisionWorld {
    colliders: Vec<Collider>,
    next_id: u32,
}

impl CollisionWorld {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // World holding one wall box per maze wall segment
    #[must_use]
    pub fn from_maze(grid: &MazeGrid, cell_size: f32) -> Self {
        let mut world = Self::new();
        let walls = grid.wall_segments(cell_size);
        for wall in &walls {
            let (center, half) = wall.bounds();
            world.add_box(Category::Wall, center, half);
        }
        trace!("collision world built with {} wall boxes", walls.len());
        world
    }

    fn insert(&mut self, category: Category, center: Vec3, shape: Shape) -> ColliderId {
        let id = ColliderId(self.next_id);
        self.next_id += 1;
        self.colliders.push(Collider {
            id,
            category,
            center,
            shape,
        });
        id
    }

    pub fn add_box(&mut self, category: Category, center: Vec3, half_extents: Vec3) -> ColliderId {
        self.insert(category, center, Shape::Cuboid { half_extents })
    }

    pub fn add_sphere(&mut self, category: Category, center: Vec3, radius: f32) -> ColliderId {
        self.insert(category, center, Shape::Sphere { radius })
    }

    // Move a collider; returns false if the id is unknown
    pub fn set_position(&mut self, id: ColliderId, center: Vec3) -> bool {
        self.colliders
            .iter_mut()
            .find(|collider| collider.id == id)
            .map(|collider| collider.center = center)
            .is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    fn hits(&self, origin: Vec3, dir: Vec3, max_distance: f32, mask: CategoryMask) -> impl Iterator<Item = RayHit> + '_ {
        let dir = dir.normalize_or_zero();
        self.colliders
            .iter()
            .filter(move |collider| dir != Vec3::ZERO && collider.matches(mask))
            .filter_map(move |collider| collider.raycast(origin, dir, max_distance))
    }
}

impl SpatialQuery for CollisionWorld {
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: CategoryMask) -> Vec<Collider> {
        self.colliders
            .iter()
            .filter(|collider| collider.matches(mask) && collider.overlaps_sphere(center, radius))
            .copied()
            .collect()
    }

    fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32, mask: CategoryMask) -> Option<RayHit> {
        self.hits(origin, dir, max_distance, mask)
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn raycast_all(&self, origin: Vec3, dir: Vec3, max_distance: f32, mask: CategoryMask) -> Vec<RayHit> {
        let mut hits: Vec<RayHit> = self.hits(origin, dir, max_distance, mask).collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}
