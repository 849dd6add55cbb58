use bevy_math::Vec3;
use std::fmt;

use crate::systems::enemies::AiState;

// Index of an enemy within the simulation, stable for its whole run
pub type EnemyIndex = usize;

// ============================================================================
// Simulation Events
// ============================================================================

// Everything observable that happened during one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    EnemyStateChanged { enemy: EnemyIndex, from: AiState, to: AiState },
    EnemyLightChanged { enemy: EnemyIndex, in_light: bool },
    EnemyJittered { enemy: EnemyIndex, at: Vec3 },
    EnemyDetoured { enemy: EnemyIndex, toward: Vec3 },
    PlayerHit { enemy: EnemyIndex, health: u32 },
    FlashlightDepleted,
    PickupCollected { at: Vec3, battery: f32 },
    PlayerDied,
    ExitReached,
}

impl SimEvent {
    // Events that end the run
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::PlayerDied | Self::ExitReached)
    }
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnemyStateChanged { enemy, from, to } => write!(f, "enemy {enemy}: {from} -> {to}"),
            Self::EnemyLightChanged { enemy, in_light: true } => write!(f, "enemy {enemy} caught in the light"),
            Self::EnemyLightChanged { enemy, in_light: false } => write!(f, "enemy {enemy} left the light"),
            Self::EnemyJittered { enemy, at } => write!(f, "enemy {enemy} got unstuck at ({:.1}, {:.1})", at.x, at.z),
            Self::EnemyDetoured { enemy, toward } => {
                write!(f, "enemy {enemy} detours toward ({:.1}, {:.1})", toward.x, toward.z)
            }
            Self::PlayerHit { enemy, health } => write!(f, "player hit by enemy {enemy}, health {health}"),
            Self::FlashlightDepleted => f.write_str("flashlight battery depleted"),
            Self::PickupCollected { battery, .. } => write!(f, "battery picked up, charge {battery:.0}"),
            Self::PlayerDied => f.write_str("player died"),
            Self::ExitReached => f.write_str("exit reached"),
        }
    }
}
