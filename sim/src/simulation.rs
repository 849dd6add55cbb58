use bevy_math::Vec3;
use rand::{SeedableRng, rngs::StdRng};
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::{
    events::SimEvent,
    map::generate_maze,
    navigation::GridNavigator,
    services::{MotionActuator, Services},
    systems::{
        enemies::{BehaviorEvent, Enemy, PerceptionState},
        light::{ExposureBoard, LightCoordinator, LightSource},
        player::{Player, PlayerCommand},
        spawn::{SpawnPlanner, SpawnShortfall},
        survival::survival_system,
    },
    world::CollisionWorld,
};
use common::{
    collision::ColliderId,
    config::SimConfig,
    constants::ENEMY_RADIUS,
    map::MazeGrid,
    markers::Category,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Died,
    Escaped,
}

// ============================================================================
// Simulation
// ============================================================================

// One level: maze, services, player and enemies, advanced by explicit ticks.
pub struct Simulation {
    config: SimConfig,
    rng: StdRng,
    grid: Rc<MazeGrid>,
    world: CollisionWorld,
    nav: GridNavigator,
    player: Player,
    enemies: Vec<Enemy>,
    board: ExposureBoard,
    light: LightCoordinator,
    pickups: Vec<Vec3>,
    exit_pad: Option<Vec3>,
    shortfall: SpawnShortfall,
    tick: u64,
    elapsed: f32,
    outcome: Option<Outcome>,
}

impl Simulation {
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        let config = config.sanitized();
        let mut rng = StdRng::seed_from_u64(config.seed);

        let maze = &config.maze;
        let grid = Rc::new(generate_maze(maze.width, maze.height, maze.start_x, maze.start_y, &mut rng));
        let mut world = CollisionWorld::from_maze(&grid, maze.cell_size);
        let nav = GridNavigator::new(Rc::clone(&grid), maze.cell_size);
        info!(
            "generated {}x{} maze with {} wall colliders",
            grid.width(),
            grid.height(),
            world.len()
        );

        let plan = {
            let services = Services {
                nav: &nav,
                world: &world,
            };
            SpawnPlanner::new(&grid, maze.cell_size, &config.spawn, services).plan(&mut rng)
        };

        let player_collider = world.add_sphere(Category::Player, plan.player, config.player.radius);
        let player = Player::new(player_collider, plan.player, &config.player);

        let mut board = ExposureBoard::default();
        let mut enemies: Vec<Enemy> = plan
            .routes
            .into_iter()
            .map(|route| {
                let collider = world.add_sphere(Category::Enemy, route.spawn_point, ENEMY_RADIUS);
                board.register(collider);
                Enemy::new(
                    collider,
                    Rc::new(route),
                    config.vision.clone(),
                    config.behavior.clone(),
                    config.jitter.clone(),
                )
            })
            .collect();

        let services = Services {
            nav: &nav,
            world: &world,
        };
        for enemy in &mut enemies {
            enemy.controller.start(&mut enemy.agent, services);
        }

        Self {
            light: LightCoordinator::new(config.light.clone()),
            config,
            rng,
            grid,
            world,
            nav,
            player,
            enemies,
            board,
            pickups: plan.pickups,
            exit_pad: plan.exit_pad,
            shortfall: plan.shortfall,
            tick: 0,
            elapsed: 0.0,
            outcome: None,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    #[must_use]
    pub fn grid(&self) -> &MazeGrid {
        &self.grid
    }

    #[must_use]
    pub const fn world(&self) -> &CollisionWorld {
        &self.world
    }

    #[must_use]
    pub const fn navigator(&self) -> &GridNavigator {
        &self.nav
    }

    #[must_use]
    pub const fn player(&self) -> &Player {
        &self.player
    }

    #[must_use]
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    #[must_use]
    pub const fn exposure(&self) -> &ExposureBoard {
        &self.board
    }

    #[must_use]
    pub fn pickups(&self) -> &[Vec3] {
        &self.pickups
    }

    #[must_use]
    pub const fn exit_pad(&self) -> Option<Vec3> {
        self.exit_pad
    }

    #[must_use]
    pub const fn shortfall(&self) -> SpawnShortfall {
        self.shortfall
    }

    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    fn enemy_index(&self, collider: ColliderId) -> Option<usize> {
        self.enemies.iter().position(|enemy| enemy.collider == collider)
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    // Advance by `delta` seconds. A finished simulation no longer moves.
    pub fn tick(&mut self, delta: f32, command: &PlayerCommand) -> Vec<SimEvent> {
        if self.is_finished() {
            return Vec::new();
        }
        if delta.is_nan() || delta <= 0.0 {
            warn!("ignoring tick with non-positive delta {delta}");
            return Vec::new();
        }

        self.tick += 1;
        self.elapsed += delta;
        let mut events = Vec::new();

        // Player movement and flashlight
        self.player
            .apply_command(delta, command, &self.config.player, &self.world);

        // Collider sync
        self.world.set_position(self.player.collider, self.player.position);
        for enemy in &self.enemies {
            self.world.set_position(enemy.collider, enemy.agent.position());
        }

        // Perception
        let perceptions: Vec<PerceptionState> = self
            .enemies
            .iter_mut()
            .map(|enemy| {
                enemy
                    .vision
                    .sense(enemy.agent.position(), enemy.agent.forward(), &self.world)
            })
            .collect();

        // Light exposure, written before any behavior reads it
        let source = LightSource {
            origin: self.player.position,
            forward: self.player.facing,
            enabled: self.player.flashlight_on,
        };
        let changes = self.light.update(&source, &self.world, &mut self.board);
        for (collider, in_light) in changes {
            if let Some(enemy) = self.enemy_index(collider) {
                events.push(SimEvent::EnemyLightChanged { enemy, in_light });
            }
        }

        // Behavior
        let services = Services {
            nav: &self.nav,
            world: &self.world,
        };
        for (index, (enemy, perception)) in self.enemies.iter_mut().zip(&perceptions).enumerate() {
            let in_light = self.board.is_lit(enemy.collider);
            let behavior_events = enemy.controller.update(
                delta,
                perception,
                in_light,
                &enemy.vision,
                &mut enemy.agent,
                services,
                &mut self.rng,
            );
            events.extend(behavior_events.into_iter().filter_map(|event| match event {
                BehaviorEvent::StateChanged { from, to } => Some(SimEvent::EnemyStateChanged {
                    enemy: index,
                    from,
                    to,
                }),
                BehaviorEvent::Jittered => Some(SimEvent::EnemyJittered {
                    enemy: index,
                    at: enemy.agent.position(),
                }),
                BehaviorEvent::Detour { toward } => Some(SimEvent::EnemyDetoured { enemy: index, toward }),
                BehaviorEvent::Frozen | BehaviorEvent::Unfrozen => None,
            }));
        }

        // Motion
        for enemy in &mut self.enemies {
            enemy.agent.advance(delta);
        }

        // Survival
        let enemy_positions = self
            .enemies
            .iter()
            .enumerate()
            .map(|(index, enemy)| (index, enemy.agent.position()));
        let survival = survival_system(
            delta,
            &mut self.player,
            enemy_positions,
            &mut self.pickups,
            self.exit_pad,
            &self.config.player,
        );
        for event in &survival {
            match event {
                SimEvent::PlayerDied => self.outcome = Some(Outcome::Died),
                SimEvent::ExitReached => self.outcome = Some(Outcome::Escaped),
                _ => {}
            }
        }
        events.extend(survival);

        if let Some(outcome) = self.outcome {
            info!("simulation finished at tick {}: {outcome:?}", self.tick);
        } else if !events.is_empty() {
            debug!("tick {}: {} events", self.tick, events.len());
        }
        events
    }
}
