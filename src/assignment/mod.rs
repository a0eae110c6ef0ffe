//! Task assignment strategies.
//!
//! Policies never touch entities directly. They read an [`AssignmentView`]
//! and hand back [`Assignment`] intents, which the engine validates and
//! applies during its assignment phase.

pub mod nearest;
pub mod round_robin;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::map::Grid;
use crate::pathfinding::{NoPathFound, Path};
use crate::robot::{Robot, RobotId, RobotStatus};
use crate::task::{Task, TaskId, TaskStatus};

pub use nearest::NearestPolicy;
pub use round_robin::RoundRobinPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Nearest,
    RoundRobin,
}

impl Strategy {
    pub fn policy(self) -> Box<dyn TaskAssignmentPolicy> {
        match self {
            Strategy::Nearest => Box::new(NearestPolicy),
            Strategy::RoundRobin => Box::new(RoundRobinPolicy::new()),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Nearest => write!(f, "nearest"),
            Strategy::RoundRobin => write!(f, "round_robin"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearest" => Ok(Strategy::Nearest),
            "round_robin" | "round-robin" => Ok(Strategy::RoundRobin),
            other => Err(format!("unknown strategy '{}'", other)),
        }
    }
}

/// Read-only state handed to a policy for one assignment phase.
pub struct AssignmentView<'a> {
    pub grid: &'a Grid,
    pub robots: &'a BTreeMap<RobotId, Robot>,
    pub tasks: &'a BTreeMap<TaskId, Task>,
    /// Idle robots the policy may use this phase, in id order.
    pub candidates: &'a [RobotId],
    /// Tasks flagged unassignable.
    pub excluded: &'a BTreeSet<TaskId>,
}

impl AssignmentView<'_> {
    pub fn robot(&self, id: RobotId) -> &Robot {
        self.robots
            .get(&id)
            .unwrap_or_else(|| panic!("assignment view references unknown robot {}", id))
    }

    /// Unassigned, non-excluded tasks, oldest first.
    pub fn open_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks
            .values()
            .filter(|task| task.status == TaskStatus::Unassigned)
            .filter(|task| !self.excluded.contains(&task.id))
    }

    pub fn is_candidate(&self, id: RobotId) -> bool {
        self.candidates.contains(&id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub robot: RobotId,
    pub task: TaskId,
    pub path: Path,
}

pub trait TaskAssignmentPolicy {
    fn strategy(&self) -> Strategy;

    /// Decides assignments for this phase. Each robot and task appears at most once.
    fn assign(&mut self, view: &AssignmentView<'_>) -> Vec<Assignment>;

    /// Forget any rotation state.
    fn reset(&mut self) {}
}

/// The robot is idle, the task is reachable, and the trip plus the work fit in the battery.
pub fn is_robot_available_for_task(
    robot: &Robot,
    task: &Task,
    path: &Result<Path, NoPathFound>,
) -> bool {
    if robot.status != RobotStatus::Idle {
        return false;
    }
    let Ok(path) = path else {
        return false;
    };
    let needed = path.len() as u64 * robot.movement_cost as u64 + task.battery_cost as u64;
    robot.battery as u64 >= needed
}
