pub mod enemies;
pub mod light;
pub mod player;
pub mod spawn;
pub mod survival;

pub use light::{ExposureBoard, LightCoordinator, LightSource};
pub use spawn::{SpawnPlan, SpawnPlanner, find_player_spawn};
pub use survival::survival_system;
