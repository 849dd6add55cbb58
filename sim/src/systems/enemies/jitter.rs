use bevy_math::Vec3;
use rand::Rng;
use tracing::debug;

use crate::services::{MotionActuator, Services};
use common::{
    collision::helpers::{flatten, rotate_about_up},
    config::JitterConfig,
    markers::CategoryMask,
};

// ============================================================================
// Stuck Detection
// ============================================================================

// Samples displacement once per interval. An agent that is trying to move but has barely
// moved gets a random turn, a short sideways nudge and a brief speed boost.
#[derive(Debug, Clone)]
pub struct JitterTracker {
    config: JitterConfig,
    check_timer: f32,
    last_position: Option<Vec3>,
    cooldown: f32,
    boost_remaining: f32,
}

impl JitterTracker {
    #[must_use]
    pub const fn new(config: JitterConfig) -> Self {
        Self {
            config,
            check_timer: 0.0,
            last_position: None,
            cooldown: 0.0,
            boost_remaining: 0.0,
        }
    }

    // Multiplier applied on top of the state speed while a boost is active
    #[must_use]
    pub fn speed_factor(&self) -> f32 {
        if self.boost_remaining > 0.0 {
            self.config.speed_boost
        } else {
            1.0
        }
    }

    // Forget the displacement sample, e.g. after a pause
    pub const fn reset(&mut self) {
        self.check_timer = 0.0;
        self.last_position = None;
    }

    // Returns true when a recovery was applied this tick.
    pub fn update(
        &mut self,
        delta: f32,
        agent: &mut impl MotionActuator,
        services: Services<'_>,
        rng: &mut impl Rng,
    ) -> bool {
        if !self.config.enabled {
            return false;
        }

        self.cooldown = (self.cooldown - delta).max(0.0);
        self.boost_remaining = (self.boost_remaining - delta).max(0.0);

        let position = agent.position();
        let last = *self.last_position.get_or_insert(position);
        self.check_timer += delta;
        if self.check_timer < self.config.check_interval {
            return false;
        }
        self.check_timer = 0.0;
        self.last_position = Some(position);

        let trying_to_move = agent.has_path() && !agent.is_stopped() && !agent.has_arrived();
        if !trying_to_move || self.cooldown > 0.0 || position.distance(last) >= self.config.threshold {
            return false;
        }

        let max = self.config.max_rotation;
        let yaw = if max > 0.0 { rng.random_range(-max..=max) } else { 0.0 };
        agent.rotate_yaw(yaw);

        let right = rotate_about_up(flatten(agent.forward()), 90.0);
        let side = if rng.random_bool(0.5) { right } else { -right };
        let target = position + side * self.config.strength;

        // Never nudge through a wall
        let clear = services
            .world
            .raycast(position, side, self.config.strength, CategoryMask::OCCLUDERS)
            .is_none();
        if clear {
            if let Some(snapped) = services.nav.sample_position(target, self.config.strength) {
                agent.nudge(snapped);
            }
        }

        self.boost_remaining = self.config.boost_duration;
        self.cooldown = self.config.cooldown;
        debug!("stuck at {position:?}, jittered by {yaw:.1} degrees");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        agent::NavAgent,
        services::{NavPath, Navigation, PathStatus},
        world::CollisionWorld,
    };
    use common::config::BehaviorConfig;
    use rand::{SeedableRng, rngs::StdRng};

    struct OpenFloor;

    impl Navigation for OpenFloor {
        fn find_path(&self, _from: Vec3, to: Vec3) -> NavPath {
            NavPath {
                status: PathStatus::Complete,
                waypoints: vec![to],
            }
        }

        fn sample_position(&self, point: Vec3, _max_radius: f32) -> Option<Vec3> {
            Some(point)
        }
    }

    fn stuck_agent() -> NavAgent {
        let mut agent = NavAgent::new(Vec3::ZERO, Vec3::Z, &BehaviorConfig::default());
        agent.set_path(NavPath {
            status: PathStatus::Complete,
            waypoints: vec![Vec3::new(0.0, 0.0, 10.0)],
        });
        agent
    }

    #[test]
    fn stalled_agent_gets_jittered_once_per_cooldown() {
        let world = CollisionWorld::new();
        let services = Services {
            nav: &OpenFloor,
            world: &world,
        };
        let mut rng = StdRng::seed_from_u64(4);
        let mut agent = stuck_agent();
        let mut tracker = JitterTracker::new(JitterConfig::default());

        // Stalled for one full interval
        let ticks = (0..15).find(|_| tracker.update(0.1, &mut agent, services, &mut rng));
        assert!(ticks.is_some());
        assert!(agent.position().distance(Vec3::ZERO) > 0.5);
        assert!((tracker.speed_factor() - JitterConfig::default().speed_boost).abs() < f32::EPSILON);

        // Boost wears off, cooldown blocks an immediate second jitter
        agent.nudge(Vec3::ZERO);
        for _ in 0..10 {
            assert!(!tracker.update(0.1, &mut agent, services, &mut rng));
        }
        assert!((tracker.speed_factor() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn idle_or_moving_agents_are_left_alone() {
        let world = CollisionWorld::new();
        let services = Services {
            nav: &OpenFloor,
            world: &world,
        };
        let mut rng = StdRng::seed_from_u64(4);
        let mut tracker = JitterTracker::new(JitterConfig::default());

        let mut idle = NavAgent::new(Vec3::ZERO, Vec3::Z, &BehaviorConfig::default());
        for _ in 0..30 {
            assert!(!tracker.update(0.1, &mut idle, services, &mut rng));
        }

        let mut moving = stuck_agent();
        let mut tracker = JitterTracker::new(JitterConfig::default());
        for _ in 0..30 {
            moving.advance(0.1);
            assert!(!tracker.update(0.1, &mut moving, services, &mut rng));
        }
    }

    #[test]
    fn disabled_tracker_does_nothing() {
        let world = CollisionWorld::new();
        let services = Services {
            nav: &OpenFloor,
            world: &world,
        };
        let mut rng = StdRng::seed_from_u64(4);
        let mut agent = stuck_agent();
        let mut tracker = JitterTracker::new(JitterConfig {
            enabled: false,
            ..JitterConfig::default()
        });
        for _ in 0..30 {
            assert!(!tracker.update(0.1, &mut agent, services, &mut rng));
        }
    }
}
