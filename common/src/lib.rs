pub mod collision;
pub mod config;
pub mod constants;
pub mod map;
pub mod markers;
