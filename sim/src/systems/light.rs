use bevy_math::Vec3;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

use crate::services::SpatialQuery;
use common::{
    collision::{ColliderId, helpers::rotate_about_axis},
    config::LightConfig,
    constants::LIGHT_OCCLUSION_BIAS,
    markers::{Category, CategoryMask},
};

// ============================================================================
// Exposure State
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightExposure {
    pub is_in_light: bool,
}

// Shared light flags keyed by agent collider. The coordinator writes once per tick, before
// any behavior update reads.
#[derive(Debug, Clone, Default)]
pub struct ExposureBoard {
    entries: BTreeMap<ColliderId, LightExposure>,
}

impl ExposureBoard {
    pub fn register(&mut self, id: ColliderId) {
        self.entries.entry(id).or_default();
    }

    #[must_use]
    pub fn is_lit(&self, id: ColliderId) -> bool {
        self.entries.get(&id).is_some_and(|exposure| exposure.is_in_light)
    }

    // Returns false for agents that were never registered
    fn write(&mut self, id: ColliderId, is_in_light: bool) -> bool {
        match self.entries.get_mut(&id) {
            Some(exposure) => {
                exposure.is_in_light = is_in_light;
                true
            }
            None => false,
        }
    }
}

// Where the player's light points this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSource {
    pub origin: Vec3,
    pub forward: Vec3,
    pub enabled: bool,
}

// ============================================================================
// Light Coordinator
// ============================================================================

#[derive(Debug, Clone)]
pub struct LightCoordinator {
    config: LightConfig,
    lit: BTreeSet<ColliderId>,
}

impl LightCoordinator {
    #[must_use]
    pub const fn new(config: LightConfig) -> Self {
        Self {
            config,
            lit: BTreeSet::new(),
        }
    }

    #[must_use]
    pub const fn lit(&self) -> &BTreeSet<ColliderId> {
        &self.lit
    }

    // Forward ray plus rings of rays at increasing angle, turned both ways about the up
    // and right axes of the light.
    #[must_use]
    pub fn ray_directions(&self, forward: Vec3) -> Vec<Vec3> {
        let forward = forward.normalize_or_zero();
        if forward == Vec3::ZERO {
            return Vec::new();
        }
        let up = Vec3::Y;
        let right = up.cross(forward).try_normalize().unwrap_or(Vec3::X);
        let local_up = forward.cross(right).normalize_or_zero();

        let count = self.config.ray_count;
        let mut rays = Vec::with_capacity(1 + count * 4);
        rays.push(forward);
        for i in 0..count {
            let angle = i as f32 / count as f32 * self.config.half_angle;
            rays.push(rotate_about_axis(forward, local_up, angle));
            rays.push(rotate_about_axis(forward, local_up, -angle));
            rays.push(rotate_about_axis(forward, right, angle));
            rays.push(rotate_about_axis(forward, right, -angle));
        }
        rays
    }

    // Clear last tick's lit agents, then flag every agent the light reaches this tick.
    // Returns the agents whose flag changed.
    pub fn update(
        &mut self,
        source: &LightSource,
        world: &dyn SpatialQuery,
        board: &mut ExposureBoard,
    ) -> Vec<(ColliderId, bool)> {
        let previously_lit = std::mem::take(&mut self.lit);
        for &id in &previously_lit {
            board.write(id, false);
        }

        if source.enabled {
            let forward = source.forward.normalize_or_zero();
            for dir in self.ray_directions(forward) {
                self.cast(source.origin, forward, dir, world, board);
            }
        } else if !previously_lit.is_empty() {
            debug!("light disabled, reset {} lit agents", previously_lit.len());
        }

        let mut changes: Vec<(ColliderId, bool)> = previously_lit
            .difference(&self.lit)
            .map(|&id| (id, false))
            .collect();
        changes.extend(self.lit.difference(&previously_lit).map(|&id| (id, true)));
        changes
    }

    fn cast(
        &mut self,
        origin: Vec3,
        forward: Vec3,
        dir: Vec3,
        world: &dyn SpatialQuery,
        board: &mut ExposureBoard,
    ) {
        for hit in world.raycast_all(origin, dir, self.config.range, CategoryMask::ALL) {
            if hit.category != Category::Enemy || self.lit.contains(&hit.id) {
                continue;
            }

            let to_hit = hit.point - origin;
            let alignment = forward.dot(to_hit.normalize_or_zero());
            if alignment <= self.config.min_alignment {
                continue;
            }

            let reach = (hit.distance - LIGHT_OCCLUSION_BIAS).max(0.0);
            let occluded = world
                .raycast(origin, to_hit.normalize_or_zero(), reach, CategoryMask::ALL)
                .is_some();
            if occluded {
                continue;
            }

            if board.write(hit.id, true) {
                trace!("light reached {:?} at {:.2}", hit.id, hit.distance);
                self.lit.insert(hit.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::CollisionWorld;
    use common::constants::{ENEMY_RADIUS, PLAYER_RADIUS};

    struct Scene {
        world: CollisionWorld,
        board: ExposureBoard,
        coordinator: LightCoordinator,
    }

    impl Scene {
        fn new() -> Self {
            let mut world = CollisionWorld::new();
            world.add_sphere(Category::Player, Vec3::ZERO, PLAYER_RADIUS);
            Self {
                world,
                board: ExposureBoard::default(),
                coordinator: LightCoordinator::new(LightConfig::default()),
            }
        }

        fn enemy(&mut self, at: Vec3) -> ColliderId {
            let id = self.world.add_sphere(Category::Enemy, at, ENEMY_RADIUS);
            self.board.register(id);
            id
        }

        fn shine(&mut self, enabled: bool) -> Vec<(ColliderId, bool)> {
            let source = LightSource {
                origin: Vec3::ZERO,
                forward: Vec3::Z,
                enabled,
            };
            self.coordinator.update(&source, &self.world, &mut self.board)
        }
    }

    #[test]
    fn ray_fan_covers_both_axes() {
        let coordinator = LightCoordinator::new(LightConfig {
            ray_count: 4,
            half_angle: 20.0,
            ..LightConfig::default()
        });
        let rays = coordinator.ray_directions(Vec3::Z);
        assert_eq!(rays.len(), 1 + 4 * 4);
        assert!(rays.iter().any(|r| r.x > 0.2));
        assert!(rays.iter().any(|r| r.x < -0.2));
        assert!(rays.iter().any(|r| r.y > 0.2));
        assert!(rays.iter().any(|r| r.y < -0.2));
        assert!(rays.iter().all(|r| r.z > 0.9));
    }

    #[test]
    fn enemy_in_beam_is_lit() {
        let mut scene = Scene::new();
        let enemy = scene.enemy(Vec3::new(0.0, 0.0, 5.0));
        assert!(!scene.board.is_lit(enemy));
        let changes = scene.shine(true);
        assert_eq!(changes, vec![(enemy, true)]);
        assert!(scene.board.is_lit(enemy));
    }

    #[test]
    fn enemy_leaving_beam_is_cleared_next_tick() {
        let mut scene = Scene::new();
        let enemy = scene.enemy(Vec3::new(0.0, 0.0, 5.0));
        scene.shine(true);
        scene.world.set_position(enemy, Vec3::new(0.0, 0.0, -5.0));
        let changes = scene.shine(true);
        assert_eq!(changes, vec![(enemy, false)]);
        assert!(!scene.board.is_lit(enemy));
    }

    #[test]
    fn staying_in_beam_reports_no_change() {
        let mut scene = Scene::new();
        let enemy = scene.enemy(Vec3::new(0.5, 0.0, 4.0));
        scene.shine(true);
        assert!(scene.shine(true).is_empty());
        assert!(scene.board.is_lit(enemy));
    }

    #[test]
    fn walls_and_other_enemies_shadow() {
        let mut scene = Scene::new();
        let front = scene.enemy(Vec3::new(0.0, 0.0, 3.0));
        let behind = scene.enemy(Vec3::new(0.0, 0.0, 6.0));
        scene.shine(true);
        assert!(scene.board.is_lit(front));
        assert!(!scene.board.is_lit(behind));

        let mut walled = Scene::new();
        walled
            .world
            .add_box(Category::Wall, Vec3::new(0.0, 0.0, 2.0), Vec3::new(3.0, 2.0, 0.1));
        let hidden = walled.enemy(Vec3::new(0.0, 0.0, 5.0));
        walled.shine(true);
        assert!(!walled.board.is_lit(hidden));
    }

    #[test]
    fn out_of_range_or_off_axis_is_dark() {
        let mut scene = Scene::new();
        let far = scene.enemy(Vec3::new(0.0, 0.0, 15.0));
        let aside = scene.enemy(Vec3::new(5.0, 0.0, 0.5));
        scene.shine(true);
        assert!(!scene.board.is_lit(far));
        assert!(!scene.board.is_lit(aside));
    }

    #[test]
    fn disabling_light_resets_lit_agents() {
        let mut scene = Scene::new();
        let enemy = scene.enemy(Vec3::new(0.0, 0.0, 5.0));
        scene.shine(true);
        let changes = scene.shine(false);
        assert_eq!(changes, vec![(enemy, false)]);
        assert!(!scene.board.is_lit(enemy));
        assert!(scene.coordinator.lit().is_empty());
    }

    #[test]
    fn unregistered_hits_are_ignored() {
        let mut scene = Scene::new();
        scene
            .world
            .add_sphere(Category::Enemy, Vec3::new(0.0, 0.0, 5.0), ENEMY_RADIUS);
        assert!(scene.shine(true).is_empty());
        assert!(scene.coordinator.lit().is_empty());
    }
}
