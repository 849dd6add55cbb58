use bevy_math::Vec3;
use rand::Rng;
use tracing::{info, warn};

use crate::{services::Services, systems::enemies::PatrolRoute};
use common::{
    config::SpawnConfig,
    constants::MAX_TUNABLE_VALUE,
    map::{MazeGrid, cell_center},
    markers::CategoryMask,
};

// ============================================================================
// Spawn Plan
// ============================================================================

// Entities the planner could not place within the attempt budget
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnShortfall {
    pub enemies: usize,
    pub pickups: usize,
    pub exit_pad: bool,
}

impl SpawnShortfall {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.enemies == 0 && self.pickups == 0 && !self.exit_pad
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnPlan {
    pub player: Vec3,
    pub routes: Vec<PatrolRoute>,
    pub pickups: Vec<Vec3>,
    pub exit_pad: Option<Vec3>,
    pub shortfall: SpawnShortfall,
}

// ============================================================================
// Player Placement
// ============================================================================

// First interior cell open on all four sides (row-major from (1, 1)), else the first cell
// with its top and left walls cleared, else the first cell.
#[must_use]
pub fn find_player_spawn(grid: &MazeGrid, cell_size: f32) -> Vec3 {
    for y in 1..grid.height().saturating_sub(1) {
        for x in 1..grid.width().saturating_sub(1) {
            if grid.is_junction(x, y) {
                return cell_center(x, y, cell_size);
            }
        }
    }

    if let Some(cell) = grid.cells().iter().find(|cell| !cell.top_wall && !cell.left_wall) {
        return cell_center(cell.x, cell.y, cell_size);
    }

    cell_center(0, 0, cell_size)
}

// ============================================================================
// Spawn Planner
// ============================================================================

// Places player, enemies with patrol routes, pickups and the exit pad, in that order. Every
// accepted position joins `used`, which later placements must keep clear of.
pub struct SpawnPlanner<'a> {
    grid: &'a MazeGrid,
    cell_size: f32,
    config: &'a SpawnConfig,
    services: Services<'a>,
    used: Vec<Vec3>,
}

impl<'a> SpawnPlanner<'a> {
    #[must_use]
    pub const fn new(grid: &'a MazeGrid, cell_size: f32, config: &'a SpawnConfig, services: Services<'a>) -> Self {
        Self {
            grid,
            cell_size,
            config,
            services,
            used: Vec::new(),
        }
    }

    pub fn plan(mut self, rng: &mut impl Rng) -> SpawnPlan {
        let mut shortfall = SpawnShortfall::default();

        let player = find_player_spawn(self.grid, self.cell_size);
        self.used.push(player);

        let mut routes = Vec::with_capacity(self.config.num_enemies);
        for index in 0..self.config.num_enemies {
            match self.place_enemy(player, rng) {
                Some(route) => routes.push(route),
                None => {
                    warn!("could not place enemy {index}, skipping it");
                    shortfall.enemies += 1;
                }
            }
        }

        let mut pickups = Vec::with_capacity(self.config.num_pickups);
        for index in 0..self.config.num_pickups {
            match self.place_pickup(rng) {
                Some(pickup) => pickups.push(pickup),
                None => {
                    warn!("could not place pickup {index}, skipping it");
                    shortfall.pickups += 1;
                }
            }
        }

        let exit_pad = self.place_exit_pad(player, &routes, rng);
        if exit_pad.is_none() {
            warn!("could not place the exit pad");
            shortfall.exit_pad = true;
        }

        if shortfall.is_empty() {
            info!(
                "spawned {} enemies, {} pickups and the exit pad",
                routes.len(),
                pickups.len()
            );
        } else {
            warn!(
                "spawn shortfall: {} enemies, {} pickups, exit pad missing: {}",
                shortfall.enemies, shortfall.pickups, shortfall.exit_pad
            );
        }

        SpawnPlan {
            player,
            routes,
            pickups,
            exit_pad,
            shortfall,
        }
    }

    fn random_cell_center(&self, rng: &mut impl Rng) -> Option<Vec3> {
        if self.grid.width() == 0 || self.grid.height() == 0 {
            return None;
        }
        let x = rng.random_range(0..self.grid.width());
        let y = rng.random_range(0..self.grid.height());
        Some(cell_center(x, y, self.cell_size))
    }

    fn is_clear(&self, point: Vec3) -> bool {
        self.services
            .world
            .overlap_sphere(point, self.config.clearance_radius, CategoryMask::OCCLUDERS)
            .is_empty()
    }

    fn keeps_distance(&self, point: Vec3, min_separation: f32) -> bool {
        self.used.iter().all(|used| used.distance(point) >= min_separation)
    }

    // Try random cell centers until one passes `accept`
    fn find_cell(&self, rng: &mut impl Rng, accept: impl Fn(Vec3) -> bool) -> Option<Vec3> {
        (0..self.config.max_attempts)
            .filter_map(|_| self.random_cell_center(rng))
            .find(|&candidate| self.is_clear(candidate) && accept(candidate))
    }

    fn place_enemy(&mut self, player: Vec3, rng: &mut impl Rng) -> Option<PatrolRoute> {
        let spawn_point = self.find_cell(rng, |candidate| {
            candidate.distance(player) >= self.config.min_enemy_distance_from_player
                && self.keeps_distance(candidate, self.config.min_point_separation)
        })?;

        let patrol_points = self.plan_patrol_points(spawn_point, player, rng)?;

        self.used.push(spawn_point);
        self.used.extend(patrol_points.iter().copied());
        Some(PatrolRoute {
            spawn_point,
            patrol_points,
        })
    }

    // Every point must be found, or the whole route is dropped
    fn plan_patrol_points(&self, spawn_point: Vec3, player: Vec3, rng: &mut impl Rng) -> Option<Vec<Vec3>> {
        // Sampling range is [min, 2 * min]; capped so the upper end stays finite
        let min_distance = self.config.min_patrol_distance.min(MAX_TUNABLE_VALUE);
        let mut points: Vec<Vec3> = Vec::with_capacity(self.config.patrol_points_per_enemy);

        for _ in 0..self.config.patrol_points_per_enemy {
            let point = (0..self.config.max_attempts).find_map(|_| {
                let angle = rng.random_range(0.0..std::f32::consts::TAU);
                let distance = if min_distance > 0.0 {
                    rng.random_range(min_distance..=min_distance * 2.0)
                } else {
                    0.0
                };
                let candidate = spawn_point + Vec3::new(angle.cos(), 0.0, angle.sin()) * distance;

                let accepted = self.is_clear(candidate)
                    && candidate.distance(player) >= self.config.min_enemy_distance_from_player
                    && self.keeps_distance(candidate, self.config.min_point_separation)
                    && points
                        .iter()
                        .chain(std::iter::once(&spawn_point))
                        .all(|other| other.distance(candidate) >= self.config.min_point_separation)
                    && self.services.nav.find_path(spawn_point, candidate).is_complete();
                accepted.then_some(candidate)
            })?;
            points.push(point);
        }

        Some(points)
    }

    fn place_pickup(&mut self, rng: &mut impl Rng) -> Option<Vec3> {
        let pickup = self.find_cell(rng, |candidate| {
            self.keeps_distance(candidate, self.config.min_pickup_separation)
        })?;
        self.used.push(pickup);
        Some(pickup)
    }

    fn place_exit_pad(&mut self, player: Vec3, routes: &[PatrolRoute], rng: &mut impl Rng) -> Option<Vec3> {
        let band = self.config.min_exit_enemy_distance..=self.config.max_exit_enemy_distance;
        let exit = self.find_cell(rng, |candidate| {
            let near_enemy = routes.is_empty()
                || routes
                    .iter()
                    .any(|route| band.contains(&route.spawn_point.distance(candidate)));
            near_enemy
                && self.keeps_distance(candidate, self.config.min_pickup_separation)
                && self.services.nav.find_path(player, candidate).is_complete()
        })?;
        self.used.push(exit);
        Some(exit)
    }
}
