// ============================================================================
// Floating-Point Comparisons
// ============================================================================

// Small value for floating-point comparisons (near-zero checks, division guards).
pub const PHYSICS_EPSILON: f32 = 1e-6;

// Slack on path arrival so rounding cannot leave an agent one ulp short of its stopping point.
pub const ARRIVAL_TOLERANCE: f32 = 1e-4;

// Ceiling for float tunables read from config. Doubling it must stay finite.
pub const MAX_TUNABLE_VALUE: f32 = 1e5;

// ============================================================================
// Maze Grid
// ============================================================================

pub const MAZE_MIN_DIMENSION: usize = 5;
pub const MAZE_MAX_DIMENSION: usize = 500;
pub const MAZE_DEFAULT_WIDTH: usize = 20;
pub const MAZE_DEFAULT_HEIGHT: usize = 30;

pub const CELL_SIZE: f32 = 4.0; // Each maze cell size in meters

// ============================================================================
// Map Geometry
// ============================================================================

pub const WALL_THICKNESS: f32 = 0.2;
pub const WALL_HEIGHT: f32 = 3.0;
pub const WALL_FLOOR_SINK: f32 = 0.5; // Walls reach below the floor so ground-level rays register

// ============================================================================
// Player
// ============================================================================

pub const PLAYER_RADIUS: f32 = 0.4;
pub const PLAYER_SPEED: f32 = 4.0; // meters per second
pub const PLAYER_MAX_HEALTH: u32 = 2;
pub const PLAYER_INVINCIBILITY_DURATION: f32 = 2.0; // seconds
pub const ENEMY_CONTACT_RADIUS: f32 = 0.9; // Enemy touches player within this distance

// Flashlight battery (charge units are percent)
pub const BATTERY_CAPACITY: f32 = 100.0;
pub const BATTERY_DRAIN_PER_SECOND: f32 = 1.0;
pub const BATTERY_PICKUP_CHARGE: f32 = 35.0;
pub const PICKUP_COLLECTION_RADIUS: f32 = 1.0;
pub const EXIT_PAD_RADIUS: f32 = 1.0;

// ============================================================================
// Enemy Body
// ============================================================================

pub const ENEMY_RADIUS: f32 = 0.4;
pub const ENEMY_ACCELERATION: f32 = 2.0; // meters per second squared
pub const ENEMY_ROTATION_SPEED: f32 = 180.0; // degrees per second
pub const ENEMY_STOPPING_DISTANCE: f32 = 0.1;

// ============================================================================
// Vision
// ============================================================================

pub const VIEW_RADIUS: f32 = 8.0;
pub const VIEW_ANGLE: f32 = 120.0; // degrees, full cone
pub const PERIPHERAL_VIEW_DISTANCE: f32 = 3.0;
pub const PERIPHERAL_ANGLE_MULTIPLIER: f32 = 1.5;
pub const INSTANT_DETECTION_DISTANCE: f32 = 2.0;
pub const WALL_AVOIDANCE_DISTANCE: f32 = 1.5;
pub const WALL_SIDE_CHECK_ANGLE: f32 = 45.0; // degrees

// ============================================================================
// Behavior
// ============================================================================

pub const PATROL_SPEED: f32 = 2.0;
pub const CHASE_SPEED: f32 = 5.0;
pub const SEARCH_SPEED: f32 = 3.5;
pub const CHASE_ACCELERATION_MULTIPLIER: f32 = 2.0;
pub const CHASE_TURN_RATE_MULTIPLIER: f32 = 2.0;
pub const CHASE_STOPPING_DISTANCE: f32 = 0.5;
pub const PATROL_WAIT_TIME: f32 = 2.0; // seconds
pub const WAIT_ROTATION_SPEED: f32 = 45.0; // degrees per second while waiting
pub const SEARCH_DURATION: f32 = 8.0; // seconds
pub const SEARCH_AREA_RADIUS: f32 = 5.0;
pub const SEARCH_POINT_TIMEOUT: f32 = 2.0; // seconds
pub const SEARCH_ROTATE_DURATION: f32 = 1.0; // seconds
pub const WALL_CHECK_INTERVAL: f32 = 0.5; // seconds
pub const WALL_DETOUR_DISTANCE: f32 = 3.0;
pub const PATH_UPDATE_INTERVAL: f32 = 0.2; // seconds
pub const PREDICTION_MULTIPLIER: f32 = 0.8;
pub const PREDICTION_SAMPLE_RADIUS: f32 = 5.0;
pub const MAX_CHASE_DISTANCE: f32 = 30.0;

// ============================================================================
// Jitter (stuck recovery)
// ============================================================================

pub const JITTER_CHECK_INTERVAL: f32 = 1.0; // seconds
pub const JITTER_THRESHOLD: f32 = 0.1; // meters moved per interval
pub const JITTER_STRENGTH: f32 = 1.0; // lateral nudge in meters
pub const JITTER_MAX_ROTATION: f32 = 90.0; // degrees
pub const JITTER_COOLDOWN: f32 = 2.0; // seconds
pub const JITTER_SPEED_BOOST: f32 = 1.5;
pub const JITTER_BOOST_DURATION: f32 = 0.5; // seconds

// ============================================================================
// Spawning
// ============================================================================

pub const NUM_ENEMIES: usize = 5;
pub const NUM_PICKUPS: usize = 3;
pub const PATROL_POINTS_PER_ENEMY: usize = 3;
pub const MAX_SPAWN_ATTEMPTS: usize = 1000;
pub const SPAWN_CLEARANCE_RADIUS: f32 = 0.5;
pub const MIN_ENEMY_DISTANCE_FROM_PLAYER: f32 = 5.0;
pub const MIN_PATROL_DISTANCE: f32 = 4.0;
pub const MIN_POINT_SEPARATION: f32 = 1.5;
pub const MIN_PICKUP_SEPARATION: f32 = 3.0;
pub const MIN_EXIT_ENEMY_DISTANCE: f32 = 4.0;
pub const MAX_EXIT_ENEMY_DISTANCE: f32 = 20.0;

// ============================================================================
// Flashlight
// ============================================================================

pub const LIGHT_RANGE: f32 = 10.0;
pub const LIGHT_HALF_ANGLE: f32 = 15.0; // degrees
pub const LIGHT_RAY_COUNT: usize = 8;
pub const LIGHT_MIN_ALIGNMENT: f32 = 0.5; // dot product against the light's forward
pub const LIGHT_OCCLUSION_BIAS: f32 = 0.1;
