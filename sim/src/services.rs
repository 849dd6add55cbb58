use bevy_math::Vec3;

use common::{
    collision::{Collider, RayHit},
    constants::ARRIVAL_TOLERANCE,
    markers::CategoryMask,
};

// ============================================================================
// Navigation Service
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    Complete,
    Partial,
    Invalid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavPath {
    pub status: PathStatus,
    pub waypoints: Vec<Vec3>,
}

impl NavPath {
    #[must_use]
    pub const fn invalid() -> Self {
        Self {
            status: PathStatus::Invalid,
            waypoints: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == PathStatus::Complete
    }

    #[must_use]
    pub fn end(&self) -> Option<Vec3> {
        self.waypoints.last().copied()
    }
}

// Authoritative source of reachability and surface snapping
pub trait Navigation {
    fn find_path(&self, from: Vec3, to: Vec3) -> NavPath;

    // Nearest navigable point within `max_radius`, if any
    fn sample_position(&self, point: Vec3, max_radius: f32) -> Option<Vec3>;
}

// ============================================================================
// Spatial Query Service
// ============================================================================

pub trait SpatialQuery {
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: CategoryMask) -> Vec<Collider>;

    // Nearest hit along the ray
    fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32, mask: CategoryMask) -> Option<RayHit>;

    // Every hit along the ray, nearest first
    fn raycast_all(&self, origin: Vec3, dir: Vec3, max_distance: f32, mask: CategoryMask) -> Vec<RayHit>;
}

// ============================================================================
// Motion Actuator
// ============================================================================

// Moves one agent along navigation paths.
pub trait MotionActuator {
    fn position(&self) -> Vec3;
    fn forward(&self) -> Vec3;

    // Apply a path. Only complete paths are accepted; a refused path leaves the current one untouched.
    fn set_path(&mut self, path: NavPath) -> bool;

    // Last accepted destination
    fn destination(&self) -> Option<Vec3>;

    fn speed(&self) -> f32;
    fn set_speed(&mut self, speed: f32);
    fn acceleration(&self) -> f32;
    fn set_acceleration(&mut self, acceleration: f32);
    fn turn_rate(&self) -> f32;
    fn set_turn_rate(&mut self, degrees_per_second: f32);
    fn stopping_distance(&self) -> f32;
    fn set_stopping_distance(&mut self, distance: f32);

    fn stop(&mut self);
    fn resume(&mut self);
    fn is_stopped(&self) -> bool;

    fn remaining_distance(&self) -> f32;
    fn has_path(&self) -> bool;

    // Within stopping distance of the end of the path, or no path at all
    fn has_arrived(&self) -> bool {
        !self.has_path() || self.remaining_distance() <= self.stopping_distance() + ARRIVAL_TOLERANCE
    }

    fn rotate_yaw(&mut self, degrees: f32);

    // Move directly to an already-validated position, keeping the current path
    fn nudge(&mut self, position: Vec3);

    fn set_destination(&mut self, nav: &dyn Navigation, target: Vec3) -> bool {
        let path = nav.find_path(self.position(), target);
        self.set_path(path)
    }
}

// Borrowed handles to the external services an agent update needs.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub nav: &'a dyn Navigation,
    pub world: &'a dyn SpatialQuery,
}
