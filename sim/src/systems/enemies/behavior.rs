use bevy_math::Vec3;
use rand::Rng;
use std::{fmt, rc::Rc};
use tracing::debug;

use super::{
    jitter::JitterTracker,
    tasks::{SearchTask, TaskStatus, WaitTask},
    vision::{PerceptionState, VisionCone},
};
use crate::services::{MotionActuator, Services};
use common::{
    config::{BehaviorConfig, JitterConfig},
    constants::PHYSICS_EPSILON,
};

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiState {
    Patrolling,
    Chasing,
    Searching,
    WaitingAtPatrol,
}

impl fmt::Display for AiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Patrolling => "patrolling",
            Self::Chasing => "chasing",
            Self::Searching => "searching",
            Self::WaitingAtPatrol => "waiting",
        };
        f.write_str(name)
    }
}

// Spawn point plus the ordered points an enemy cycles through. Immutable once planned.
#[derive(Debug, Clone, PartialEq)]
pub struct PatrolRoute {
    pub spawn_point: Vec3,
    pub patrol_points: Vec<Vec3>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BehaviorEvent {
    StateChanged { from: AiState, to: AiState },
    Frozen,
    Unfrozen,
    Jittered,
    Detour { toward: Vec3 },
}

// Chase bookkeeping: previous sighting for velocity estimation and the repath throttle
#[derive(Debug, Clone, Copy, Default)]
struct ChaseTracker {
    previous_sighting: Option<Vec3>,
    repath_timer: f32,
}

// ============================================================================
// Behavior Controller
// ============================================================================

#[derive(Debug)]
pub struct BehaviorController {
    config: BehaviorConfig,
    route: Rc<PatrolRoute>,
    state: AiState,
    patrol_index: usize,
    destination: Option<Vec3>,
    frozen: bool,
    wait: Option<WaitTask>,
    search: Option<SearchTask>,
    chase: ChaseTracker,
    wall_check_timer: f32,
    detour_active: bool,
    jitter: JitterTracker,
}

impl BehaviorController {
    #[must_use]
    pub fn new(config: BehaviorConfig, jitter: JitterConfig, route: Rc<PatrolRoute>) -> Self {
        Self {
            config,
            route,
            state: AiState::Patrolling,
            patrol_index: 0,
            destination: None,
            frozen: false,
            wait: None,
            search: None,
            chase: ChaseTracker::default(),
            wall_check_timer: 0.0,
            detour_active: false,
            jitter: JitterTracker::new(jitter),
        }
    }

    #[must_use]
    pub const fn state(&self) -> AiState {
        self.state
    }

    // Destination the current state is pursuing (detours excluded)
    #[must_use]
    pub const fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    #[must_use]
    pub const fn patrol_index(&self) -> usize {
        self.patrol_index
    }

    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.frozen
    }

    #[must_use]
    pub const fn search(&self) -> Option<&SearchTask> {
        self.search.as_ref()
    }

    // Entry action of the initial Patrolling state
    pub fn start(&mut self, agent: &mut impl MotionActuator, services: Services<'_>) {
        self.enter_patrolling(agent, services);
    }

    fn navigate_to(&mut self, agent: &mut impl MotionActuator, services: Services<'_>, target: Vec3) -> bool {
        if agent.set_destination(services.nav, target) {
            self.destination = Some(target);
            true
        } else {
            debug!("navigation refused path to {target:?}");
            false
        }
    }

    // Head for the next patrol point, advancing the index with wrap-around
    pub fn move_to_next_patrol_point(&mut self, agent: &mut impl MotionActuator, services: Services<'_>) {
        let route = Rc::clone(&self.route);
        if route.patrol_points.is_empty() {
            debug!("no patrol points, holding position");
            return;
        }
        let index = self.patrol_index % route.patrol_points.len();
        self.patrol_index = (index + 1) % route.patrol_points.len();
        self.navigate_to(agent, services, route.patrol_points[index]);
    }

    fn state_speed(&self) -> f32 {
        match self.state {
            AiState::Patrolling | AiState::WaitingAtPatrol => self.config.patrol_speed,
            AiState::Chasing => self.config.chase_speed,
            AiState::Searching => self.config.search_speed,
        }
    }

    fn restore_base_motion(&self, agent: &mut impl MotionActuator) {
        agent.set_acceleration(self.config.acceleration);
        agent.set_turn_rate(self.config.rotation_speed);
        agent.set_stopping_distance(self.config.stopping_distance);
    }

    fn transition(&mut self, to: AiState, events: &mut Vec<BehaviorEvent>) {
        let from = self.state;
        self.state = to;
        self.detour_active = false;
        debug!("enemy {from} -> {to}");
        events.push(BehaviorEvent::StateChanged { from, to });
    }

    // ------------------------------------------------------------------------
    // State entry actions
    // ------------------------------------------------------------------------

    fn enter_patrolling(&mut self, agent: &mut impl MotionActuator, services: Services<'_>) {
        self.wait = None;
        self.search = None;
        self.restore_base_motion(agent);
        agent.set_speed(self.config.patrol_speed * self.jitter.speed_factor());
        self.move_to_next_patrol_point(agent, services);
    }

    fn enter_waiting(&mut self) {
        self.wait = Some(WaitTask::new(&self.config));
    }

    fn enter_chasing(&mut self, perception: &PerceptionState, agent: &mut impl MotionActuator, services: Services<'_>) {
        self.search = None;
        self.wait = None;

        agent.set_speed(self.config.chase_speed * self.jitter.speed_factor());
        agent.set_acceleration(self.config.acceleration * self.config.chase_acceleration_multiplier);
        agent.set_turn_rate(self.config.rotation_speed * self.config.chase_turn_rate_multiplier);
        agent.set_stopping_distance(self.config.chase_stopping_distance);

        // Next chase tick recomputes the intercept immediately
        self.chase = ChaseTracker {
            previous_sighting: perception.last_known_target_position,
            repath_timer: self.config.path_update_interval,
        };

        if let Some(last_known) = perception.last_known_target_position {
            self.navigate_to(agent, services, last_known);
        }
    }

    fn enter_searching(&mut self, perception: &PerceptionState, agent: &mut impl MotionActuator) {
        self.restore_base_motion(agent);
        agent.set_speed(self.config.search_speed * self.jitter.speed_factor());
        let center = perception
            .last_known_target_position
            .unwrap_or_else(|| agent.position());
        self.search = Some(SearchTask::new(center, &self.config));
    }

    // ------------------------------------------------------------------------
    // Per-tick update
    // ------------------------------------------------------------------------

    pub fn update(
        &mut self,
        delta: f32,
        perception: &PerceptionState,
        in_light: bool,
        vision: &VisionCone,
        agent: &mut impl MotionActuator,
        services: Services<'_>,
        rng: &mut impl Rng,
    ) -> Vec<BehaviorEvent> {
        let mut events = Vec::new();

        // Light holds the actuator in place; perception and timers keep running
        if in_light {
            if !self.frozen {
                self.frozen = true;
                agent.stop();
                debug!("enemy frozen by light in state {}", self.state);
                events.push(BehaviorEvent::Frozen);
            }
        } else if self.frozen {
            self.frozen = false;
            agent.resume();
            self.jitter.reset();
            if let Some(target) = self.destination {
                self.navigate_to(agent, services, target);
            }
            debug!("enemy released from light in state {}", self.state);
            events.push(BehaviorEvent::Unfrozen);
        }

        if !self.frozen {
            if self.jitter.update(delta, agent, services, rng) {
                events.push(BehaviorEvent::Jittered);
            }
            if matches!(self.state, AiState::Patrolling | AiState::Searching) {
                self.check_wall_ahead(delta, vision, agent, services, &mut events);
            }
        }
        agent.set_speed(self.state_speed() * self.jitter.speed_factor());

        match self.state {
            AiState::Patrolling => {
                if perception.target_in_sight {
                    self.transition(AiState::Chasing, &mut events);
                    self.enter_chasing(perception, agent, services);
                } else if agent.has_arrived() {
                    if self.detour_active {
                        // Detour done, pick the patrol leg back up
                        self.detour_active = false;
                        if let Some(target) = self.destination {
                            self.navigate_to(agent, services, target);
                        }
                    } else {
                        self.transition(AiState::WaitingAtPatrol, &mut events);
                        self.enter_waiting();
                    }
                }
            }
            AiState::WaitingAtPatrol => {
                if perception.target_in_sight {
                    self.transition(AiState::Chasing, &mut events);
                    self.enter_chasing(perception, agent, services);
                } else {
                    let status = self
                        .wait
                        .as_mut()
                        .map_or(TaskStatus::Finished, |wait| wait.resume(delta, agent));
                    if status == TaskStatus::Finished {
                        self.transition(AiState::Patrolling, &mut events);
                        self.enter_patrolling(agent, services);
                    }
                }
            }
            AiState::Chasing => {
                if perception.target_in_sight {
                    self.update_chase(delta, perception, agent, services);
                } else {
                    self.transition(AiState::Searching, &mut events);
                    self.enter_searching(perception, agent);
                }
            }
            AiState::Searching => {
                if perception.target_in_sight {
                    self.transition(AiState::Chasing, &mut events);
                    self.enter_chasing(perception, agent, services);
                } else {
                    let status = self
                        .search
                        .as_mut()
                        .map_or(TaskStatus::Finished, |search| {
                            search.resume(delta, agent, services.nav, rng)
                        });
                    if let Some(point) = self.search.as_ref().and_then(SearchTask::target) {
                        self.destination = Some(point);
                    }
                    if status == TaskStatus::Finished {
                        self.transition(AiState::Patrolling, &mut events);
                        self.enter_patrolling(agent, services);
                    }
                }
            }
        }

        events
    }

    fn update_chase(
        &mut self,
        delta: f32,
        perception: &PerceptionState,
        agent: &mut impl MotionActuator,
        services: Services<'_>,
    ) {
        let Some(current) = perception.last_known_target_position else {
            return;
        };

        let velocity = match self.chase.previous_sighting {
            Some(previous) if delta > PHYSICS_EPSILON => (current - previous) / delta,
            _ => Vec3::ZERO,
        };
        self.chase.previous_sighting = Some(current);

        self.chase.repath_timer += delta;
        if self.chase.repath_timer < self.config.path_update_interval {
            return;
        }

        let predicted = velocity.mul_add(Vec3::splat(self.config.prediction_multiplier), current);
        let target = services
            .nav
            .sample_position(predicted, self.config.prediction_sample_radius)
            .unwrap_or(current);

        if agent.position().distance(target) > self.config.max_chase_distance {
            // Out of range, don't pursue but keep watching
            self.chase.repath_timer = 0.0;
            return;
        }

        if self.navigate_to(agent, services, target) {
            self.chase.repath_timer = 0.0;
        }
        // Refused paths keep the timer so the next tick retries
    }

    fn check_wall_ahead(
        &mut self,
        delta: f32,
        vision: &VisionCone,
        agent: &mut impl MotionActuator,
        services: Services<'_>,
        events: &mut Vec<BehaviorEvent>,
    ) {
        self.wall_check_timer += delta;
        if self.wall_check_timer < self.config.wall_check_interval {
            return;
        }
        self.wall_check_timer = 0.0;

        if agent.has_arrived() {
            return;
        }

        let position = agent.position();
        let Some(steer) = vision.is_wall_ahead(position, agent.forward(), agent.destination(), services.world) else {
            return;
        };

        let detour = steer.mul_add(Vec3::splat(self.config.wall_detour_distance), position);
        let path = services.nav.find_path(position, detour);
        if path.is_complete() && agent.set_path(path) {
            self.detour_active = true;
            debug!("wall ahead at {position:?}, detouring toward {detour:?}");
            events.push(BehaviorEvent::Detour { toward: detour });
        }
    }
}
