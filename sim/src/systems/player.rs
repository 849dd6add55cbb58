use bevy_math::Vec3;

use crate::services::SpatialQuery;
use common::{
    collision::{ColliderId, helpers::flatten},
    config::PlayerConfig,
    markers::CategoryMask,
};

// ============================================================================
// Player Input
// ============================================================================

// Input for one tick. `move_dir` is flattened and clamped to unit length; `look` overrides
// the facing that would otherwise follow movement.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerCommand {
    pub move_dir: Vec3,
    pub flashlight_on: bool,
    pub look: Option<Vec3>,
}

impl PlayerCommand {
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            move_dir: Vec3::ZERO,
            flashlight_on: false,
            look: None,
        }
    }
}

// ============================================================================
// Player State
// ============================================================================

#[derive(Debug, Clone)]
pub struct Player {
    pub collider: ColliderId,
    pub position: Vec3,
    pub facing: Vec3,
    pub health: u32,
    pub invincibility_remaining: f32,
    pub battery: f32,
    pub flashlight_on: bool,
}

impl Player {
    #[must_use]
    pub const fn new(collider: ColliderId, position: Vec3, config: &PlayerConfig) -> Self {
        Self {
            collider,
            position,
            facing: Vec3::Z,
            health: config.max_health,
            invincibility_remaining: 0.0,
            battery: config.battery_capacity,
            flashlight_on: false,
        }
    }

    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    // Move with wall sliding, update facing and request the flashlight state. The light only
    // turns on while the battery holds charge.
    pub fn apply_command(&mut self, delta: f32, command: &PlayerCommand, config: &PlayerConfig, world: &dyn SpatialQuery) {
        let mut direction = flatten(command.move_dir);
        if direction.length_squared() > 1.0 {
            direction = direction.normalize();
        }

        if direction != Vec3::ZERO && delta > 0.0 {
            let velocity = direction * config.speed;
            self.position = slide_move(self.position, velocity, delta, config.radius, world);
        }

        let look = command.look.map(flatten).filter(|look| *look != Vec3::ZERO);
        if let Some(look) = look {
            self.facing = look.normalize();
        } else if direction != Vec3::ZERO {
            self.facing = direction.normalize();
        }

        self.flashlight_on = command.flashlight_on && self.battery > 0.0;
    }
}

fn blocked(position: Vec3, radius: f32, world: &dyn SpatialQuery) -> bool {
    !world.overlap_sphere(position, radius, CategoryMask::OCCLUDERS).is_empty()
}

// Full step if it is free, otherwise slide along whichever axis is free
fn slide_move(current: Vec3, velocity: Vec3, delta: f32, radius: f32, world: &dyn SpatialQuery) -> Vec3 {
    let full = velocity.mul_add(Vec3::splat(delta), current);
    if !blocked(full, radius, world) {
        return full;
    }

    let along_x = Vec3::new(velocity.x.mul_add(delta, current.x), current.y, current.z);
    if velocity.x != 0.0 && !blocked(along_x, radius, world) {
        return along_x;
    }

    let along_z = Vec3::new(current.x, current.y, velocity.z.mul_add(delta, current.z));
    if velocity.z != 0.0 && !blocked(along_z, radius, world) {
        return along_z;
    }

    current
}
