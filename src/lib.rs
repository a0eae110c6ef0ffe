pub mod app;
pub mod assignment;
pub mod communication;
pub mod logging;
pub mod map;
pub mod pathfinding;
pub mod robot;
pub mod simulation;
pub mod task;
pub mod terminal;
pub mod ui;
