pub mod behavior;
pub mod jitter;
pub mod tasks;
pub mod vision;

pub use behavior::{AiState, BehaviorController, BehaviorEvent, PatrolRoute};
pub use vision::{PerceptionState, VisionCone};

use bevy_math::Vec3;
use std::rc::Rc;

use crate::agent::NavAgent;
use common::{
    collision::ColliderId,
    config::{BehaviorConfig, JitterConfig, VisionConfig},
};

// ============================================================================
// Enemy
// ============================================================================

// One enemy: its body, eyes and brain, plus the collider the world knows it by.
#[derive(Debug)]
pub struct Enemy {
    pub collider: ColliderId,
    pub agent: NavAgent,
    pub vision: VisionCone,
    pub controller: BehaviorController,
}

impl Enemy {
    #[must_use]
    pub fn new(
        collider: ColliderId,
        route: Rc<PatrolRoute>,
        vision: VisionConfig,
        behavior: BehaviorConfig,
        jitter: JitterConfig,
    ) -> Self {
        // Face the first patrol point from the start
        let facing = route
            .patrol_points
            .first()
            .map_or(Vec3::Z, |&point| point - route.spawn_point);
        let agent = NavAgent::new(route.spawn_point, facing, &behavior);
        Self {
            collider,
            agent,
            vision: VisionCone::new(vision),
            controller: BehaviorController::new(behavior, jitter, route),
        }
    }

    #[must_use]
    pub const fn state(&self) -> AiState {
        self.controller.state()
    }
}
