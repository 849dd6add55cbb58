use bevy_math::Vec3;
use std::collections::VecDeque;

use crate::services::{MotionActuator, NavPath};
use common::{
    collision::helpers::{flatten, forward_from_yaw, rotate_about_up, yaw_of},
    config::BehaviorConfig,
    constants::{ARRIVAL_TOLERANCE, PHYSICS_EPSILON},
};

// ============================================================================
// Navigation Agent
// ============================================================================

// Waypoint-following actuator. Movement runs along the path itself; the facing direction
// turns toward the current waypoint at a limited rate.
#[derive(Debug, Clone)]
pub struct NavAgent {
    position: Vec3,
    forward: Vec3,
    current_speed: f32,
    speed: f32,
    acceleration: f32,
    turn_rate: f32,
    stopping_distance: f32,
    waypoints: VecDeque<Vec3>,
    destination: Option<Vec3>,
    stopped: bool,
}

impl NavAgent {
    #[must_use]
    pub fn new(position: Vec3, forward: Vec3, behavior: &BehaviorConfig) -> Self {
        let forward = flatten(forward);
        Self {
            position,
            forward: if forward == Vec3::ZERO { Vec3::Z } else { forward },
            current_speed: 0.0,
            speed: behavior.patrol_speed,
            acceleration: behavior.acceleration,
            turn_rate: behavior.rotation_speed,
            stopping_distance: behavior.stopping_distance,
            waypoints: VecDeque::new(),
            destination: None,
            stopped: false,
        }
    }

    // Advance along the path by one tick
    pub fn advance(&mut self, delta: f32) {
        if self.stopped || self.waypoints.is_empty() || delta <= 0.0 {
            self.current_speed = 0.0;
            return;
        }

        if self.within_stopping_range() {
            self.arrive();
            return;
        }

        if let Some(&next) = self.waypoints.front() {
            self.turn_toward(next - self.position, delta);
        }

        self.current_speed = if self.current_speed < self.speed {
            self.acceleration.mul_add(delta, self.current_speed).min(self.speed)
        } else {
            self.speed
        };

        // Never overshoot the stopping point at the end of the path
        let mut step = (self.current_speed * delta).min(self.remaining_distance() - self.stopping_distance);
        while step > 0.0 {
            let Some(&next) = self.waypoints.front() else {
                break;
            };
            let to_next = next - self.position;
            let dist = to_next.length();
            if dist <= step {
                self.position = next;
                self.waypoints.pop_front();
                step -= dist;
            } else {
                self.position += to_next / dist * step;
                step = 0.0;
            }
        }

        if self.within_stopping_range() {
            self.arrive();
        }
    }

    fn within_stopping_range(&self) -> bool {
        self.remaining_distance() <= self.stopping_distance + ARRIVAL_TOLERANCE
    }

    // Keeps the destination so callers can still read where the agent was heading
    fn arrive(&mut self) {
        self.waypoints.clear();
        self.current_speed = 0.0;
    }

    fn turn_toward(&mut self, direction: Vec3, delta: f32) {
        let desired = flatten(direction);
        if desired == Vec3::ZERO {
            return;
        }
        let current = yaw_of(self.forward);
        let target = yaw_of(desired);
        let mut diff = target - current;
        if diff > std::f32::consts::PI {
            diff -= std::f32::consts::TAU;
        } else if diff < -std::f32::consts::PI {
            diff += std::f32::consts::TAU;
        }
        let max_turn = (self.turn_rate * delta).to_radians();
        self.forward = forward_from_yaw(current + diff.clamp(-max_turn, max_turn));
    }
}

impl MotionActuator for NavAgent {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn forward(&self) -> Vec3 {
        self.forward
    }

    fn set_path(&mut self, path: NavPath) -> bool {
        if !path.is_complete() || path.waypoints.is_empty() {
            return false;
        }
        self.destination = path.end();
        self.waypoints = path.waypoints.into();
        true
    }

    fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    fn speed(&self) -> f32 {
        self.speed
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
        self.current_speed = self.current_speed.min(self.speed);
    }

    fn acceleration(&self) -> f32 {
        self.acceleration
    }

    fn set_acceleration(&mut self, acceleration: f32) {
        self.acceleration = acceleration.max(0.0);
    }

    fn turn_rate(&self) -> f32 {
        self.turn_rate
    }

    fn set_turn_rate(&mut self, degrees_per_second: f32) {
        self.turn_rate = degrees_per_second.max(0.0);
    }

    fn stopping_distance(&self) -> f32 {
        self.stopping_distance
    }

    fn set_stopping_distance(&mut self, distance: f32) {
        self.stopping_distance = distance.max(0.0);
    }

    fn stop(&mut self) {
        self.stopped = true;
        self.current_speed = 0.0;
    }

    fn resume(&mut self) {
        self.stopped = false;
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn remaining_distance(&self) -> f32 {
        let mut total = 0.0;
        let mut from = self.position;
        for &point in &self.waypoints {
            total += from.distance(point);
            from = point;
        }
        total
    }

    fn has_path(&self) -> bool {
        !self.waypoints.is_empty()
    }

    fn rotate_yaw(&mut self, degrees: f32) {
        let turned = flatten(rotate_about_up(self.forward, degrees));
        if turned.length_squared() > PHYSICS_EPSILON {
            self.forward = turned;
        }
    }

    fn nudge(&mut self, position: Vec3) {
        self.position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::PathStatus;

    fn agent() -> NavAgent {
        NavAgent::new(Vec3::ZERO, Vec3::Z, &BehaviorConfig::default())
    }

    fn path(points: &[Vec3]) -> NavPath {
        NavPath {
            status: PathStatus::Complete,
            waypoints: points.to_vec(),
        }
    }

    #[test]
    fn refuses_incomplete_paths() {
        let mut agent = agent();
        assert!(!agent.set_path(NavPath {
            status: PathStatus::Partial,
            waypoints: vec![Vec3::X],
        }));
        assert!(!agent.set_path(NavPath::invalid()));
        assert!(agent.destination().is_none());
        assert!(agent.has_arrived());
    }

    #[test]
    fn accelerates_then_reaches_destination() {
        let mut agent = agent();
        assert!(agent.set_path(path(&[Vec3::new(0.0, 0.0, 2.0), Vec3::new(2.0, 0.0, 2.0)])));
        assert!((agent.remaining_distance() - 4.0).abs() < 1e-4);

        agent.advance(0.5);
        // 2 m/s^2 for half a second
        assert!((agent.position().z - 0.5).abs() < 1e-4);

        for _ in 0..100 {
            agent.advance(0.1);
        }
        assert!(agent.has_arrived());
        assert!(agent.position().distance(Vec3::new(2.0, 0.0, 2.0)) <= agent.stopping_distance() + 1e-4);
        assert_eq!(agent.destination(), Some(Vec3::new(2.0, 0.0, 2.0)));
    }

    #[test]
    fn arrives_despite_rounding_near_the_stopping_point() {
        for stopping in [0.1, 0.3, 0.7] {
            let mut agent = agent();
            agent.set_stopping_distance(stopping);
            assert!(agent.set_path(path(&[Vec3::new(0.0, 0.0, 2.0), Vec3::new(2.0, 0.0, 2.0)])));

            let mut ticks = 0;
            while agent.has_path() && ticks < 200 {
                agent.advance(0.1);
                ticks += 1;
            }
            assert!(!agent.has_path(), "stalled at {} with stopping {stopping}", agent.position());
            assert!(agent.has_arrived());

            // Once arrived, further ticks leave the agent where it is
            let parked = agent.position();
            agent.advance(0.1);
            assert_eq!(agent.position(), parked);
        }
    }

    #[test]
    fn stopped_agent_holds_position_and_path() {
        let mut agent = agent();
        agent.set_path(path(&[Vec3::new(0.0, 0.0, 5.0)]));
        agent.stop();
        agent.advance(1.0);
        assert_eq!(agent.position(), Vec3::ZERO);
        assert!(agent.has_path());
        agent.resume();
        agent.advance(1.0);
        assert!(agent.position().z > 0.0);
    }

    #[test]
    fn facing_turns_at_limited_rate() {
        let mut agent = agent();
        agent.set_turn_rate(90.0);
        agent.set_path(path(&[Vec3::new(5.0, 0.0, 0.0)]));
        agent.advance(0.5);
        // Halfway from +Z to +X
        let angle = yaw_of(agent.forward()).to_degrees();
        assert!((angle - 45.0).abs() < 1e-3);
    }

    #[test]
    fn rotate_and_nudge() {
        let mut agent = agent();
        agent.rotate_yaw(-90.0);
        assert!((agent.forward().x + 1.0).abs() < 1e-4);
        agent.nudge(Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(agent.position(), Vec3::new(1.0, 0.0, 1.0));
    }
}
