#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::*;

// ============================================================================
// Config Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(default))]
pub struct MazeConfig {
    pub width: usize,
    pub height: usize,
    pub start_x: usize,
    pub start_y: usize,
    pub cell_size: f32,
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            width: MAZE_DEFAULT_WIDTH,
            height: MAZE_DEFAULT_HEIGHT,
            start_x: 0,
            start_y: 0,
            cell_size: CELL_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(default))]
pub struct VisionConfig {
    pub view_radius: f32,
    pub view_angle: f32, // degrees, full cone
    pub peripheral_view_distance: f32,
    pub peripheral_angle_multiplier: f32,
    pub instant_detection_distance: f32,
    pub wall_avoidance_distance: f32,
    pub wall_side_check_angle: f32, // degrees
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            view_radius: VIEW_RADIUS,
            view_angle: VIEW_ANGLE,
            peripheral_view_distance: PERIPHERAL_VIEW_DISTANCE,
            peripheral_angle_multiplier: PERIPHERAL_ANGLE_MULTIPLIER,
            instant_detection_distance: INSTANT_DETECTION_DISTANCE,
            wall_avoidance_distance: WALL_AVOIDANCE_DISTANCE,
            wall_side_check_angle: WALL_SIDE_CHECK_ANGLE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(default))]
pub struct BehaviorConfig {
    pub patrol_speed: f32,
    pub chase_speed: f32,
    pub search_speed: f32,
    pub acceleration: f32,
    pub rotation_speed: f32, // degrees per second
    pub stopping_distance: f32,
    pub chase_acceleration_multiplier: f32,
    pub chase_turn_rate_multiplier: f32,
    pub chase_stopping_distance: f32,
    pub patrol_wait_time: f32,
    pub rotate_while_waiting: bool,
    pub wait_rotation_speed: f32, // degrees per second
    pub search_duration: f32,
    pub search_radius: f32,
    pub search_point_timeout: f32,
    pub search_rotate_duration: f32,
    pub wall_check_interval: f32,
    pub wall_detour_distance: f32,
    pub path_update_interval: f32,
    pub prediction_multiplier: f32,
    pub prediction_sample_radius: f32,
    pub max_chase_distance: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            patrol_speed: PATROL_SPEED,
            chase_speed: CHASE_SPEED,
            search_speed: SEARCH_SPEED,
            acceleration: ENEMY_ACCELERATION,
            rotation_speed: ENEMY_ROTATION_SPEED,
            stopping_distance: ENEMY_STOPPING_DISTANCE,
            chase_acceleration_multiplier: CHASE_ACCELERATION_MULTIPLIER,
            chase_turn_rate_multiplier: CHASE_TURN_RATE_MULTIPLIER,
            chase_stopping_distance: CHASE_STOPPING_DISTANCE,
            patrol_wait_time: PATROL_WAIT_TIME,
            rotate_while_waiting: true,
            wait_rotation_speed: WAIT_ROTATION_SPEED,
            search_duration: SEARCH_DURATION,
            search_radius: SEARCH_AREA_RADIUS,
            search_point_timeout: SEARCH_POINT_TIMEOUT,
            search_rotate_duration: SEARCH_ROTATE_DURATION,
            wall_check_interval: WALL_CHECK_INTERVAL,
            wall_detour_distance: WALL_DETOUR_DISTANCE,
            path_update_interval: PATH_UPDATE_INTERVAL,
            prediction_multiplier: PREDICTION_MULTIPLIER,
            prediction_sample_radius: PREDICTION_SAMPLE_RADIUS,
            max_chase_distance: MAX_CHASE_DISTANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(default))]
pub struct JitterConfig {
    pub enabled: bool,
    pub check_interval: f32,
    pub threshold: f32,
    pub strength: f32,
    pub max_rotation: f32, // degrees
    pub cooldown: f32,
    pub speed_boost: f32,
    pub boost_duration: f32,
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval: JITTER_CHECK_INTERVAL,
            threshold: JITTER_THRESHOLD,
            strength: JITTER_STRENGTH,
            max_rotation: JITTER_MAX_ROTATION,
            cooldown: JITTER_COOLDOWN,
            speed_boost: JITTER_SPEED_BOOST,
            boost_duration: JITTER_BOOST_DURATION,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(default))]
pub struct SpawnConfig {
    pub num_enemies: usize,
    pub num_pickups: usize,
    pub patrol_points_per_enemy: usize,
    pub max_attempts: usize,
    pub clearance_radius: f32,
    pub min_enemy_distance_from_player: f32,
    pub min_patrol_distance: f32,
    pub min_point_separation: f32,
    pub min_pickup_separation: f32,
    pub min_exit_enemy_distance: f32,
    pub max_exit_enemy_distance: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            num_enemies: NUM_ENEMIES,
            num_pickups: NUM_PICKUPS,
            patrol_points_per_enemy: PATROL_POINTS_PER_ENEMY,
            max_attempts: MAX_SPAWN_ATTEMPTS,
            clearance_radius: SPAWN_CLEARANCE_RADIUS,
            min_enemy_distance_from_player: MIN_ENEMY_DISTANCE_FROM_PLAYER,
            min_patrol_distance: MIN_PATROL_DISTANCE,
            min_point_separation: MIN_POINT_SEPARATION,
            min_pickup_separation: MIN_PICKUP_SEPARATION,
            min_exit_enemy_distance: MIN_EXIT_ENEMY_DISTANCE,
            max_exit_enemy_distance: MAX_EXIT_ENEMY_DISTANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(default))]
pub struct LightConfig {
    pub range: f32,
    pub half_angle: f32, // degrees
    pub ray_count: usize,
    pub min_alignment: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            range: LIGHT_RANGE,
            half_angle: LIGHT_HALF_ANGLE,
            ray_count: LIGHT_RAY_COUNT,
            min_alignment: LIGHT_MIN_ALIGNMENT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(default))]
pub struct PlayerConfig {
    pub speed: f32,
    pub radius: f32,
    pub max_health: u32,
    pub invincibility_duration: f32,
    pub contact_radius: f32,
    pub battery_capacity: f32,
    pub battery_drain_per_second: f32,
    pub pickup_charge: f32,
    pub pickup_radius: f32,
    pub exit_radius: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: PLAYER_SPEED,
            radius: PLAYER_RADIUS,
            max_health: PLAYER_MAX_HEALTH,
            invincibility_duration: PLAYER_INVINCIBILITY_DURATION,
            contact_radius: ENEMY_CONTACT_RADIUS,
            battery_capacity: BATTERY_CAPACITY,
            battery_drain_per_second: BATTERY_DRAIN_PER_SECOND,
            pickup_charge: BATTERY_PICKUP_CHARGE,
            pickup_radius: PICKUP_COLLECTION_RADIUS,
            exit_radius: EXIT_PAD_RADIUS,
        }
    }
}

// ============================================================================
// Simulation Config
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(default))]
pub struct SimConfig {
    pub seed: u64,
    pub maze: MazeConfig,
    pub vision: VisionConfig,
    pub behavior: BehaviorConfig,
    pub jitter: JitterConfig,
    pub spawn: SpawnConfig,
    pub light: LightConfig,
    pub player: PlayerConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            maze: MazeConfig::default(),
            vision: VisionConfig::default(),
            behavior: BehaviorConfig::default(),
            jitter: JitterConfig::default(),
            spawn: SpawnConfig::default(),
            light: LightConfig::default(),
            player: PlayerConfig::default(),
        }
    }
}

fn clamp_dimension(name: &str, value: usize) -> usize {
    let clamped = value.clamp(MAZE_MIN_DIMENSION, MAZE_MAX_DIMENSION);
    if clamped != value {
        warn!("maze {name} {value} out of range, clamped to {clamped}");
    }
    clamped
}

// NaN and negatives become 0; anything above the tunable ceiling, infinity included, is capped
fn clamp_tunable(name: &str, value: &mut f32) {
    if value.is_nan() || *value < 0.0 {
        warn!("{name} {value} is negative or not a number, clamped to 0");
        *value = 0.0;
    } else if *value > MAX_TUNABLE_VALUE {
        warn!("{name} {value} is too large, clamped to {MAX_TUNABLE_VALUE}");
        *value = MAX_TUNABLE_VALUE;
    }
}

fn ordered_band(name: &str, min: &mut f32, max: &mut f32) {
    if *min > *max {
        warn!("{name} band [{min}, {max}] is inverted, swapping bounds");
        std::mem::swap(min, max);
    }
}

impl SimConfig {
    #[cfg(feature = "json")]
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    // Clamp every out-of-range value to something the simulation can run with.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let maze = &mut self.maze;
        maze.width = clamp_dimension("width", maze.width);
        maze.height = clamp_dimension("height", maze.height);
        if maze.start_x >= maze.width || maze.start_y >= maze.height {
            warn!(
                "maze start ({}, {}) outside {}x{}, using (0, 0)",
                maze.start_x, maze.start_y, maze.width, maze.height
            );
            maze.start_x = 0;
            maze.start_y = 0;
        }
        if !maze.cell_size.is_finite() || maze.cell_size <= PHYSICS_EPSILON || maze.cell_size > MAX_TUNABLE_VALUE {
            warn!("cell size {} is out of range, using {CELL_SIZE}", maze.cell_size);
            maze.cell_size = CELL_SIZE;
        }

        let vision = &mut self.vision;
        clamp_tunable("view radius", &mut vision.view_radius);
        clamp_tunable("view angle", &mut vision.view_angle);
        clamp_tunable("peripheral view distance", &mut vision.peripheral_view_distance);
        clamp_tunable("peripheral angle multiplier", &mut vision.peripheral_angle_multiplier);
        clamp_tunable("instant detection distance", &mut vision.instant_detection_distance);
        clamp_tunable("wall avoidance distance", &mut vision.wall_avoidance_distance);
        clamp_tunable("wall side check angle", &mut vision.wall_side_check_angle);

        let behavior = &mut self.behavior;
        for (name, value) in [
            ("patrol speed", &mut behavior.patrol_speed),
            ("chase speed", &mut behavior.chase_speed),
            ("search speed", &mut behavior.search_speed),
            ("acceleration", &mut behavior.acceleration),
            ("rotation speed", &mut behavior.rotation_speed),
            ("stopping distance", &mut behavior.stopping_distance),
            ("chase acceleration multiplier", &mut behavior.chase_acceleration_multiplier),
            ("chase turn rate multiplier", &mut behavior.chase_turn_rate_multiplier),
            ("chase stopping distance", &mut behavior.chase_stopping_distance),
            ("patrol wait time", &mut behavior.patrol_wait_time),
            ("wait rotation speed", &mut behavior.wait_rotation_speed),
            ("search duration", &mut behavior.search_duration),
            ("search radius", &mut behavior.search_radius),
            ("search point timeout", &mut behavior.search_point_timeout),
            ("search rotate duration", &mut behavior.search_rotate_duration),
            ("wall check interval", &mut behavior.wall_check_interval),
            ("wall detour distance", &mut behavior.wall_detour_distance),
            ("path update interval", &mut behavior.path_update_interval),
            ("prediction multiplier", &mut behavior.prediction_multiplier),
            ("prediction sample radius", &mut behavior.prediction_sample_radius),
            ("max chase distance", &mut behavior.max_chase_distance),
        ] {
            clamp_tunable(name, value);
        }

        let jitter = &mut self.jitter;
        for (name, value) in [
            ("jitter check interval", &mut jitter.check_interval),
            ("jitter threshold", &mut jitter.threshold),
            ("jitter strength", &mut jitter.strength),
            ("jitter max rotation", &mut jitter.max_rotation),
            ("jitter cooldown", &mut jitter.cooldown),
            ("jitter speed boost", &mut jitter.speed_boost),
            ("jitter boost duration", &mut jitter.boost_duration),
        ] {
            clamp_tunable(name, value);
        }

        let spawn = &mut self.spawn;
        if spawn.max_attempts == 0 {
            warn!("spawn attempt budget is 0, using {MAX_SPAWN_ATTEMPTS}");
            spawn.max_attempts = MAX_SPAWN_ATTEMPTS;
        }
        for (name, value) in [
            ("spawn clearance radius", &mut spawn.clearance_radius),
            ("min enemy distance from player", &mut spawn.min_enemy_distance_from_player),
            ("min patrol distance", &mut spawn.min_patrol_distance),
            ("min point separation", &mut spawn.min_point_separation),
            ("min pickup separation", &mut spawn.min_pickup_separation),
            ("min exit enemy distance", &mut spawn.min_exit_enemy_distance),
            ("max exit enemy distance", &mut spawn.max_exit_enemy_distance),
        ] {
            clamp_tunable(name, value);
        }
        ordered_band(
            "exit enemy distance",
            &mut spawn.min_exit_enemy_distance,
            &mut spawn.max_exit_enemy_distance,
        );

        let light = &mut self.light;
        clamp_tunable("light range", &mut light.range);
        clamp_tunable("light half angle", &mut light.half_angle);
        if !(-1.0..=1.0).contains(&light.min_alignment) {
            let clamped = if light.min_alignment.is_nan() {
                LIGHT_MIN_ALIGNMENT
            } else {
                light.min_alignment.clamp(-1.0, 1.0)
            };
            warn!("light alignment {} out of range, clamped to {clamped}", light.min_alignment);
            light.min_alignment = clamped;
        }

        let player = &mut self.player;
        if player.max_health == 0 {
            warn!("player max health is 0, using {PLAYER_MAX_HEALTH}");
            player.max_health = PLAYER_MAX_HEALTH;
        }
        for (name, value) in [
            ("player speed", &mut player.speed),
            ("player radius", &mut player.radius),
            ("invincibility duration", &mut player.invincibility_duration),
            ("contact radius", &mut player.contact_radius),
            ("battery capacity", &mut player.battery_capacity),
            ("battery drain", &mut player.battery_drain_per_second),
            ("pickup charge", &mut player.pickup_charge),
            ("pickup radius", &mut player.pickup_radius),
            ("exit radius", &mut player.exit_radius),
        ] {
            clamp_tunable(name, value);
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_come_from_constants() {
        let config = SimConfig::default();
        assert_eq!(config.maze.width, MAZE_DEFAULT_WIDTH);
        assert!((config.vision.view_radius - VIEW_RADIUS).abs() < f32::EPSILON);
        assert_eq!(config.spawn.num_enemies, NUM_ENEMIES);
        assert_eq!(config.clone().sanitized(), config);
    }

    #[test]
    fn sanitized_clamps_dimensions_and_start() {
        let mut config = SimConfig::default();
        config.maze.width = 2;
        config.maze.height = 9000;
        config.maze.start_x = 7;
        let config = config.sanitized();
        assert_eq!(config.maze.width, MAZE_MIN_DIMENSION);
        assert_eq!(config.maze.height, MAZE_MAX_DIMENSION);
        assert_eq!((config.maze.start_x, config.maze.start_y), (0, 0));
    }

    #[test]
    fn sanitized_fixes_negative_values_and_inverted_bands() {
        let mut config = SimConfig::default();
        config.vision.view_radius = -3.0;
        config.behavior.search_duration = f32::NAN;
        config.spawn.min_exit_enemy_distance = 30.0;
        config.spawn.max_exit_enemy_distance = 10.0;
        let config = config.sanitized();
        assert!(config.vision.view_radius.abs() < f32::EPSILON);
        assert!(config.behavior.search_duration.abs() < f32::EPSILON);
        assert!((config.spawn.min_exit_enemy_distance - 10.0).abs() < f32::EPSILON);
        assert!((config.spawn.max_exit_enemy_distance - 30.0).abs() < f32::EPSILON);
    }

    #[test]
    fn sanitized_caps_infinite_and_huge_values() {
        let mut config = SimConfig::default();
        config.maze.cell_size = f32::INFINITY;
        config.spawn.min_patrol_distance = 3e38;
        config.behavior.chase_speed = f32::INFINITY;
        config.light.range = f32::MAX;
        let config = config.sanitized();
        assert!((config.maze.cell_size - CELL_SIZE).abs() < f32::EPSILON);
        assert!((config.spawn.min_patrol_distance - MAX_TUNABLE_VALUE).abs() < f32::EPSILON);
        assert!((config.behavior.chase_speed - MAX_TUNABLE_VALUE).abs() < f32::EPSILON);
        assert!((config.light.range - MAX_TUNABLE_VALUE).abs() < f32::EPSILON);
        assert!((config.spawn.min_patrol_distance * 2.0).is_finite());
    }

    #[cfg(feature = "json")]
    #[test]
    fn oversized_json_distance_is_capped() {
        let config = SimConfig::from_json_str(r#"{ "spawn": { "min_patrol_distance": 3e38 } }"#)
            .expect("valid json")
            .sanitized();
        assert!((config.spawn.min_patrol_distance - MAX_TUNABLE_VALUE).abs() < f32::EPSILON);
    }

    #[cfg(feature = "json")]
    #[test]
    fn partial_json_fills_in_defaults() {
        let config = SimConfig::from_json_str(r#"{ "seed": 7, "maze": { "width": 12 }, "light": { "ray_count": 4 } }"#)
            .expect("valid json");
        assert_eq!(config.seed, 7);
        assert_eq!(config.maze.width, 12);
        assert_eq!(config.maze.height, MAZE_DEFAULT_HEIGHT);
        assert_eq!(config.light.ray_count, 4);
        assert_eq!(config.behavior, BehaviorConfig::default());
    }

    #[cfg(feature = "json")]
    #[test]
    fn malformed_json_is_an_error() {
        assert!(SimConfig::from_json_str("{ \"seed\": \"abc\" }").is_err());
    }
}
