use bevy_math::Vec3;

use crate::{services::Navigation, simulation::Simulation, systems::player::PlayerCommand};
use common::constants::PHYSICS_EPSILON;

// Walk the navigation path toward the exit pad with the flashlight on. Stands still, light
// on, when there is no exit or no route to it.
#[must_use]
pub fn exit_autopilot(sim: &Simulation, delta: f32) -> PlayerCommand {
    let player = sim.player();
    let idle = PlayerCommand {
        flashlight_on: true,
        ..PlayerCommand::idle()
    };

    let Some(exit) = sim.exit_pad() else {
        return idle;
    };
    let path = sim.navigator().find_path(player.position, exit);
    if !path.is_complete() {
        return idle;
    }

    let Some(next) = path
        .waypoints
        .iter()
        .copied()
        .find(|waypoint| waypoint.distance_squared(player.position) > PHYSICS_EPSILON)
    else {
        return idle;
    };

    // Scale down the last step so the player lands on the waypoint instead of overshooting
    let step = sim.config().player.speed * delta;
    let offset = Vec3::new(next.x - player.position.x, 0.0, next.z - player.position.z);
    let move_dir = if step > PHYSICS_EPSILON && offset.length() < step {
        offset / step
    } else {
        offset.normalize_or_zero()
    };

    PlayerCommand {
        move_dir,
        flashlight_on: true,
        look: None,
    }
}
