use bevy_math::Vec3;

use crate::services::SpatialQuery;
use common::{
    collision::helpers::{angle_between_degrees, flatten, rotate_about_up},
    config::VisionConfig,
    constants::PHYSICS_EPSILON,
    markers::{Category, CategoryMask},
};

// What an agent currently knows about its target.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerceptionState {
    pub target_in_sight: bool,
    // Retained after sight is lost
    pub last_known_target_position: Option<Vec3>,
}

// ============================================================================
// Vision Cone
// ============================================================================

#[derive(Debug, Clone)]
pub struct VisionCone {
    config: VisionConfig,
    state: PerceptionState,
}

impl VisionCone {
    #[must_use]
    pub fn new(config: VisionConfig) -> Self {
        Self {
            config,
            state: PerceptionState::default(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &PerceptionState {
        &self.state
    }

    #[must_use]
    pub const fn config(&self) -> &VisionConfig {
        &self.config
    }

    // Scan for players around `origin`. The first target that passes either the instant
    // sphere or the cone test wins.
    pub fn sense(&mut self, origin: Vec3, forward: Vec3, world: &dyn SpatialQuery) -> PerceptionState {
        let scan_radius = self.config.view_radius.max(self.config.instant_detection_distance);
        let targets = world.overlap_sphere(origin, scan_radius, CategoryMask::of(Category::Player));

        let sighted = targets
            .iter()
            .map(|target| target.center)
            .find(|&target| self.can_see(origin, forward, target, world));

        self.state.target_in_sight = sighted.is_some();
        if sighted.is_some() {
            self.state.last_known_target_position = sighted;
        }
        self.state
    }

    fn can_see(&self, origin: Vec3, forward: Vec3, target: Vec3, world: &dyn SpatialQuery) -> bool {
        let distance = origin.distance(target);

        if distance <= self.config.instant_detection_distance {
            return has_line_of_sight(origin, target, world);
        }

        self.in_cone(origin, forward, target, distance) && has_line_of_sight(origin, target, world)
    }

    fn in_cone(&self, origin: Vec3, forward: Vec3, target: Vec3, distance: f32) -> bool {
        if distance > self.config.view_radius {
            return false;
        }

        let mut half_angle = self.config.view_angle / 2.0;
        if distance <= self.config.peripheral_view_distance {
            half_angle *= self.config.peripheral_angle_multiplier;
        }

        angle_between_degrees(forward, target - origin) < half_angle
    }

    // Radius, angle and occlusion test against an arbitrary point
    #[must_use]
    pub fn is_position_in_sight(&self, origin: Vec3, forward: Vec3, point: Vec3, world: &dyn SpatialQuery) -> bool {
        let distance = origin.distance(point);
        self.in_cone(origin, forward, point, distance) && has_line_of_sight(origin, point, world)
    }

    // Short-range wall check. Returns a steering direction when a wall is directly ahead.
    #[must_use]
    pub fn is_wall_ahead(
        &self,
        origin: Vec3,
        forward: Vec3,
        nav_target: Option<Vec3>,
        world: &dyn SpatialQuery,
    ) -> Option<Vec3> {
        let forward = flatten(forward);
        if forward == Vec3::ZERO {
            return None;
        }

        let walls = CategoryMask::of(Category::Wall);
        let reach = self.config.wall_avoidance_distance;
        world.raycast(origin, forward, reach, walls)?;

        let side = self.config.wall_side_check_angle;
        let right = rotate_about_up(forward, side);
        let left = rotate_about_up(forward, -side);
        let right_clear = world.raycast(origin, right, reach, walls).is_none();
        let left_clear = world.raycast(origin, left, reach, walls).is_none();

        // Score each side by how well it turns toward the navigation target; ties go right
        let toward = nav_target.map_or(Vec3::ZERO, |target| flatten(target - origin));
        let prefer_right = right.dot(toward) >= left.dot(toward);

        let steer = match (left_clear, right_clear) {
            (true, false) => left,
            (false, true) => right,
            (true, true) if prefer_right => right,
            (true, true) => left,
            (false, false) if prefer_right => rotate_about_up(forward, side * 2.0),
            (false, false) => rotate_about_up(forward, -side * 2.0),
        };
        Some(steer)
    }
}

// Unobstructed straight line between two points (walls and obstacles only)
#[must_use]
pub fn has_line_of_sight(from: Vec3, to: Vec3, world: &dyn SpatialQuery) -> bool {
    let delta = to - from;
    let distance = delta.length();
    if distance < PHYSICS_EPSILON {
        return true;
    }
    world
        .raycast(from, delta / distance, distance, CategoryMask::OCCLUDERS)
        .is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::CollisionWorld;
    use common::{collision::helpers::rotate_about_up, constants::PLAYER_RADIUS};

    fn cone() -> VisionCone {
        VisionCone::new(VisionConfig {
            view_radius: 8.0,
            view_angle: 120.0,
            ..VisionConfig::default()
        })
    }

    fn world_with_player(at: Vec3) -> CollisionWorld {
        let mut world = CollisionWorld::new();
        world.add_sphere(Category::Player, at, PLAYER_RADIUS);
        world
    }

    #[test]
    fn sees_target_straight_ahead() {
        let world = world_with_player(Vec3::new(0.0, 0.0, 5.0));
        let state = cone().sense(Vec3::ZERO, Vec3::Z, &world);
        assert!(state.target_in_sight);
        assert_eq!(state.last_known_target_position, Some(Vec3::new(0.0, 0.0, 5.0)));
    }

    #[test]
    fn obstacle_blocks_sight() {
        let mut world = world_with_player(Vec3::new(0.0, 0.0, 5.0));
        world.add_box(Category::Obstacle, Vec3::new(0.0, 0.0, 3.0), Vec3::new(1.0, 1.0, 0.1));
        assert!(!cone().sense(Vec3::ZERO, Vec3::Z, &world).target_in_sight);
    }

    #[test]
    fn instant_detection_ignores_angle() {
        let world = world_with_player(Vec3::new(0.0, 0.0, -1.5));
        assert!(cone().sense(Vec3::ZERO, Vec3::Z, &world).target_in_sight);
    }

    #[test]
    fn instant_detection_still_needs_line_of_sight() {
        let mut world = world_with_player(Vec3::new(0.0, 0.0, -1.5));
        world.add_box(Category::Wall, Vec3::new(0.0, 0.0, -0.8), Vec3::new(1.0, 1.0, 0.1));
        assert!(!cone().sense(Vec3::ZERO, Vec3::Z, &world).target_in_sight);
    }

    #[test]
    fn peripheral_widening_applies_only_up_close() {
        // 75 degrees off-axis: outside the 60 degree half-angle, inside 90
        let direction = rotate_about_up(Vec3::Z, 75.0);

        let near = world_with_player(direction * 2.5);
        assert!(cone().sense(Vec3::ZERO, Vec3::Z, &near).target_in_sight);

        let far = world_with_player(direction * 5.0);
        assert!(!cone().sense(Vec3::ZERO, Vec3::Z, &far).target_in_sight);
    }

    #[test]
    fn target_beyond_radius_is_not_seen() {
        let world = world_with_player(Vec3::new(0.0, 0.0, 9.0));
        assert!(!cone().sense(Vec3::ZERO, Vec3::Z, &world).target_in_sight);
    }

    #[test]
    fn last_known_position_survives_losing_sight() {
        let mut vision = cone();
        let mut world = CollisionWorld::new();
        let player = world.add_sphere(Category::Player, Vec3::new(0.0, 0.0, 4.0), PLAYER_RADIUS);
        assert!(vision.sense(Vec3::ZERO, Vec3::Z, &world).target_in_sight);

        world.set_position(player, Vec3::new(0.0, 0.0, -6.0));
        let state = vision.sense(Vec3::ZERO, Vec3::Z, &world);
        assert!(!state.target_in_sight);
        assert_eq!(state.last_known_target_position, Some(Vec3::new(0.0, 0.0, 4.0)));
    }

    #[test]
    fn position_in_sight_checks_radius_angle_and_occlusion() {
        let vision = cone();
        let mut world = CollisionWorld::new();
        assert!(vision.is_position_in_sight(Vec3::ZERO, Vec3::Z, Vec3::new(1.0, 0.0, 6.0), &world));
        assert!(!vision.is_position_in_sight(Vec3::ZERO, Vec3::Z, Vec3::new(0.0, 0.0, -6.0), &world));
        assert!(!vision.is_position_in_sight(Vec3::ZERO, Vec3::Z, Vec3::new(0.0, 0.0, 12.0), &world));
        world.add_box(Category::Wall, Vec3::new(0.0, 0.0, 3.0), Vec3::new(2.0, 1.0, 0.1));
        assert!(!vision.is_position_in_sight(Vec3::ZERO, Vec3::Z, Vec3::new(1.0, 0.0, 6.0), &world));
    }

    #[test]
    fn no_wall_means_no_steering() {
        let world = CollisionWorld::new();
        assert!(cone().is_wall_ahead(Vec3::ZERO, Vec3::Z, None, &world).is_none());
    }

    #[test]
    fn wall_ahead_with_both_sides_open_prefers_target_side() {
        let mut world = CollisionWorld::new();
        // Narrow post straight ahead
        world.add_box(Category::Wall, Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.1, 1.0, 0.1));
        let vision = cone();

        let steer = vision
            .is_wall_ahead(Vec3::ZERO, Vec3::Z, Some(Vec3::new(-5.0, 0.0, 1.0)), &world)
            .expect("wall ahead");
        assert!(steer.x < 0.0);

        let steer = vision.is_wall_ahead(Vec3::ZERO, Vec3::Z, None, &world).expect("wall ahead");
        assert!(steer.x > 0.0);
    }

    #[test]
    fn wall_ahead_takes_the_only_open_side() {
        let mut world = CollisionWorld::new();
        // Wall ahead and wall along the right (+X) side
        world.add_box(Category::Wall, Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.3, 1.0, 0.1));
        world.add_box(Category::Wall, Vec3::new(0.9, 0.0, 0.0), Vec3::new(0.1, 1.0, 2.0));
        let steer = cone()
            .is_wall_ahead(Vec3::ZERO, Vec3::Z, Some(Vec3::new(5.0, 0.0, 5.0)), &world)
            .expect("wall ahead");
        assert!(steer.x < 0.0);
    }

    #[test]
    fn boxed_in_agent_turns_twice_as_far() {
        let mut world = CollisionWorld::new();
        world.add_box(Category::Wall, Vec3::new(0.0, 0.0, 1.0), Vec3::new(2.0, 1.0, 0.1));
        let steer = cone().is_wall_ahead(Vec3::ZERO, Vec3::Z, None, &world).expect("wall ahead");
        // Default side is right, rotated by 90 degrees
        assert!((steer.x - 1.0).abs() < 1e-4);
    }

    #[test]
    fn obstacles_do_not_count_as_walls_ahead() {
        let mut world = CollisionWorld::new();
        world.add_box(Category::Obstacle, Vec3::new(0.0, 0.0, 1.0), Vec3::new(2.0, 1.0, 0.1));
        assert!(cone().is_wall_ahead(Vec3::ZERO, Vec3::Z, None, &world).is_none());
    }
}
