pub mod agent;
pub mod autopilot;
pub mod collision;
pub mod constants;
pub mod engine;
pub mod error;
pub mod maze;
pub mod pathfinding;
pub mod session;
pub mod types;
