pub mod catalog;
pub mod command;
pub mod constants;
pub mod dispatch;
pub mod dungeon;
pub mod error;
pub mod grid;
pub mod logging;
pub mod movement;
pub mod pathfinding;
pub mod player;
pub mod rng;
pub mod server_utils;
pub mod session;
pub mod town;
pub mod types;
pub mod world;
