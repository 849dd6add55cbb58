use bevy_math::Vec3;
use rand::Rng;
use tracing::trace;

use crate::services::{MotionActuator, Navigation};
use common::config::BehaviorConfig;

// Outcome of resuming a multi-tick task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Running,
    Finished,
}

// ============================================================================
// Wait Task
// ============================================================================

// Count down at a patrol point, optionally turning in place.
#[derive(Debug, Clone)]
pub struct WaitTask {
    remaining: f32,
    rotation_speed: Option<f32>,
}

impl WaitTask {
    #[must_use]
    pub fn new(config: &BehaviorConfig) -> Self {
        Self {
            remaining: config.patrol_wait_time,
            rotation_speed: config.rotate_while_waiting.then_some(config.wait_rotation_speed),
        }
    }

    #[must_use]
    pub const fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn resume(&mut self, delta: f32, agent: &mut impl MotionActuator) -> TaskStatus {
        if let Some(speed) = self.rotation_speed {
            agent.rotate_yaw(speed * delta);
        }
        self.remaining -= delta;
        if self.remaining <= 0.0 {
            TaskStatus::Finished
        } else {
            TaskStatus::Running
        }
    }
}

// ============================================================================
// Search Task
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum SearchPhase {
    PickPoint,
    Travel { point: Vec3, elapsed: f32 },
    Rotate { remaining: f32 },
}

// Sweep the area around the last known target position: pick a random point, walk there
// (bounded by a per-point timeout), look around, repeat until the search time runs out.
#[derive(Debug, Clone)]
pub struct SearchTask {
    center: Vec3,
    elapsed: f32,
    duration: f32,
    radius: f32,
    point_timeout: f32,
    rotate_duration: f32,
    rotation_speed: f32,
    phase: SearchPhase,
}

impl SearchTask {
    #[must_use]
    pub fn new(center: Vec3, config: &BehaviorConfig) -> Self {
        Self {
            center,
            elapsed: 0.0,
            duration: config.search_duration,
            radius: config.search_radius,
            point_timeout: config.search_point_timeout,
            rotate_duration: config.search_rotate_duration,
            rotation_speed: config.rotation_speed,
            phase: SearchPhase::PickPoint,
        }
    }

    #[must_use]
    pub const fn center(&self) -> Vec3 {
        self.center
    }

    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    // Point currently being walked to
    #[must_use]
    pub const fn target(&self) -> Option<Vec3> {
        match self.phase {
            SearchPhase::Travel { point, .. } => Some(point),
            _ => None,
        }
    }

    pub fn resume(
        &mut self,
        delta: f32,
        agent: &mut impl MotionActuator,
        nav: &dyn Navigation,
        rng: &mut impl Rng,
    ) -> TaskStatus {
        self.elapsed += delta;
        if self.elapsed >= self.duration {
            return TaskStatus::Finished;
        }

        self.phase = match self.phase {
            SearchPhase::PickPoint => {
                let angle = rng.random_range(0.0..std::f32::consts::TAU);
                let distance = self.radius * rng.random::<f32>().sqrt();
                let point = self.center + Vec3::new(angle.cos(), 0.0, angle.sin()) * distance;

                if agent.set_destination(nav, point) {
                    trace!("search heading to {point:?}");
                    SearchPhase::Travel { point, elapsed: 0.0 }
                } else {
                    // Try another point next tick
                    SearchPhase::PickPoint
                }
            }
            SearchPhase::Travel { point, elapsed } => {
                let elapsed = elapsed + delta;
                if agent.has_arrived() || elapsed >= self.point_timeout {
                    SearchPhase::Rotate {
                        remaining: self.rotate_duration,
                    }
                } else {
                    SearchPhase::Travel { point, elapsed }
                }
            }
            SearchPhase::Rotate { remaining } => {
                agent.rotate_yaw(self.rotation_speed * delta);
                let remaining = remaining - delta;
                if remaining <= 0.0 {
                    SearchPhase::PickPoint
                } else {
                    SearchPhase::Rotate { remaining }
                }
            }
        };

        TaskStatus::Running
    }
}
