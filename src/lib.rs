pub mod clock;
pub mod constants;
pub mod engine;
pub mod error;
pub mod learning;
pub mod maze;
pub mod pathfinding;
pub mod player;
pub mod session;
pub mod types;
