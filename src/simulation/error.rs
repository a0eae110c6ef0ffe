use thiserror::Error;

use super::engine::EngineStatus;
use crate::map::Coordinates;
use crate::robot::{RobotId, RobotStatus};
use crate::task::{TaskId, TaskStatus};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("invalid placement at {location}: {reason}")]
    InvalidPlacement {
        location: Coordinates,
        reason: &'static str,
    },

    #[error("no grid loaded")]
    NoGridLoaded,

    #[error("cannot start without robots")]
    NoRobots,

    #[error("cannot start without an assignment strategy")]
    NoStrategy,

    #[error("cannot {action} while {from:?}")]
    InvalidStateTransition {
        from: EngineStatus,
        action: &'static str,
    },

    #[error("engine is not running ({0:?})")]
    NotRunning(EngineStatus),

    #[error("speed factor {0} out of range")]
    InvalidSpeed(f64),

    #[error("grid '{0}' not found")]
    GridNotFound(String),

    #[error("invalid grid: {0}")]
    GridParse(String),

    #[error("robot {robot}: illegal transition {from:?} -> {to:?}")]
    InvalidRobotTransition {
        robot: RobotId,
        from: RobotStatus,
        to: RobotStatus,
    },

    #[error("task {task}: illegal transition {from:?} -> {to:?}")]
    InvalidTaskTransition {
        task: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },
}
