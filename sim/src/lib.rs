pub mod agent;
pub mod autopilot;
pub mod config;
pub mod events;
pub mod map;
pub mod navigation;
pub mod services;
pub mod simulation;
pub mod systems;
pub mod world;

pub use autopilot::exit_autopilot;
pub use config::{init_tracing, load_config};
pub use events::SimEvent;
pub use simulation::{Outcome, Simulation};
pub use systems::player::PlayerCommand;
