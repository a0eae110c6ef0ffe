pub mod config;
pub mod movement;
pub mod state;

pub use state::{Robot, RobotIcon, RobotId, RobotStatus};
