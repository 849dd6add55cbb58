use bevy_math::Vec3;
use tracing::{debug, info};

use super::player::Player;
use crate::events::{EnemyIndex, SimEvent};
use common::config::PlayerConfig;

// ============================================================================
// Survival Checks
// ============================================================================

// Health, battery, pickups and exit, in that order. A player killed this tick does not also
// reach the exit.
pub fn survival_system(
    delta: f32,
    player: &mut Player,
    enemies: impl IntoIterator<Item = (EnemyIndex, Vec3)>,
    pickups: &mut Vec<Vec3>,
    exit_pad: Option<Vec3>,
    config: &PlayerConfig,
) -> Vec<SimEvent> {
    let mut events = Vec::new();

    player.invincibility_remaining = (player.invincibility_remaining - delta).max(0.0);

    events.extend(drain_battery(delta, player, config));
    events.extend(enemy_contact(player, enemies, config));
    if !player.is_alive() {
        return events;
    }

    events.extend(collect_pickups(player, pickups, config));
    events.extend(reach_exit(player, exit_pad, config));
    events
}

pub fn drain_battery(delta: f32, player: &mut Player, config: &PlayerConfig) -> Option<SimEvent> {
    if !player.flashlight_on {
        return None;
    }
    player.battery = config.battery_drain_per_second.mul_add(-delta, player.battery);
    if player.battery > 0.0 {
        return None;
    }
    player.battery = 0.0;
    player.flashlight_on = false;
    info!("flashlight battery depleted");
    Some(SimEvent::FlashlightDepleted)
}

// At most one hit per tick, then invincibility covers the rest
pub fn enemy_contact(
    player: &mut Player,
    enemies: impl IntoIterator<Item = (EnemyIndex, Vec3)>,
    config: &PlayerConfig,
) -> Vec<SimEvent> {
    if !player.is_alive() || player.invincibility_remaining > 0.0 {
        return Vec::new();
    }

    let position = player.position;
    let Some((enemy, _)) = enemies
        .into_iter()
        .find(|(_, at)| at.distance(position) <= config.contact_radius)
    else {
        return Vec::new();
    };

    player.health = player.health.saturating_sub(1);
    player.invincibility_remaining = config.invincibility_duration;
    debug!("player hit by enemy {enemy}, {} health left", player.health);

    let mut events = vec![SimEvent::PlayerHit {
        enemy,
        health: player.health,
    }];
    if !player.is_alive() {
        info!("player died");
        events.push(SimEvent::PlayerDied);
    }
    events
}

pub fn collect_pickups(player: &mut Player, pickups: &mut Vec<Vec3>, config: &PlayerConfig) -> Vec<SimEvent> {
    let position = player.position;
    let mut events = Vec::new();
    pickups.retain(|&pickup| {
        if pickup.distance(position) > config.pickup_radius {
            return true;
        }
        player.battery = (player.battery + config.pickup_charge).min(config.battery_capacity);
        debug!("battery pickup at {pickup:?}, charge now {:.1}", player.battery);
        events.push(SimEvent::PickupCollected {
            at: pickup,
            battery: player.battery,
        });
        false
    });
    events
}

#[must_use]
pub fn reach_exit(player: &Player, exit_pad: Option<Vec3>, config: &PlayerConfig) -> Option<SimEvent> {
    let exit = exit_pad?;
    (exit.distance(player.position) <= config.exit_radius).then(|| {
        info!("player reached the exit");
        SimEvent::ExitReached
    })
}
