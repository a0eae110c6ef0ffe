use std::collections::HashMap;

use thiserror::Error;

use super::engine::EngineStatus;
use crate::map::{Coordinates, Grid};
use crate::robot::{Robot, RobotId};
use crate::task::{Task, TaskId};

/// Settled view of a run, taken between ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub clock: u64,
    pub status: EngineStatus,
    pub robots: Vec<Robot>,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("robot {robot}: battery {battery} outside [0, {max}]")]
    BatteryOutOfRange { robot: RobotId, battery: u32, max: u32 },

    #[error("robot {robot}: standing on impassable cell {location}")]
    RobotOffGrid { robot: RobotId, location: Coordinates },

    #[error("robots {first} and {second} share cell {location}")]
    SharedCell {
        first: RobotId,
        second: RobotId,
        location: Coordinates,
    },

    #[error("robot {robot}: assigned task {task} is not active or points elsewhere")]
    BrokenAssignment { robot: RobotId, task: TaskId },

    #[error("task {task}: active but robot {robot:?} does not hold it")]
    OrphanTask { task: TaskId, robot: Option<RobotId> },

    #[error("robot {robot}: path is not contiguous")]
    BrokenPath { robot: RobotId },

    #[error("robot {robot}: path does not end at its target")]
    PathMissesTarget { robot: RobotId },
}

impl Snapshot {
    pub fn robot(&self, id: RobotId) -> Option<&Robot> {
        self.robots.iter().find(|robot| robot.id == id)
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Checks every entity invariant and collision safety. Returns all violations found.
    pub fn validate(&self, grid: &Grid) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();
        let mut cells: HashMap<Coordinates, RobotId> = HashMap::new();

        for robot in &self.robots {
            if robot.battery > robot.max_battery {
                violations.push(InvariantViolation::BatteryOutOfRange {
                    robot: robot.id,
                    battery: robot.battery,
                    max: robot.max_battery,
                });
            }
            if !grid.is_passable(robot.location) {
                violations.push(InvariantViolation::RobotOffGrid {
                    robot: robot.id,
                    location: robot.location,
                });
            }
            if let Some(first) = cells.insert(robot.location, robot.id) {
                violations.push(InvariantViolation::SharedCell {
                    first,
                    second: robot.id,
                    location: robot.location,
                });
            }
            if let Some(task_id) = robot.assigned_task {
                let holds = self
                    .task(task_id)
                    .is_some_and(|task| task.is_active() && task.assigned_robot == Some(robot.id));
                if !holds {
                    violations.push(InvariantViolation::BrokenAssignment {
                        robot: robot.id,
                        task: task_id,
                    });
                }
            }
            violations.extend(check_path(robot, grid));
        }

        for task in self.tasks.iter().filter(|task| task.is_active()) {
            let held = task
                .assigned_robot
                .and_then(|id| self.robot(id))
                .is_some_and(|robot| robot.assigned_task == Some(task.id));
            if !held {
                violations.push(InvariantViolation::OrphanTask {
                    task: task.id,
                    robot: task.assigned_robot,
                });
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

fn check_path(robot: &Robot, grid: &Grid) -> Option<InvariantViolation> {
    let last = *robot.current_path.back()?;
    let mut prev = robot.location;
    for step in &robot.current_path {
        if !prev.is_adjacent(step) || !grid.is_passable(*step) {
            return Some(InvariantViolation::BrokenPath { robot: robot.id });
        }
        prev = *step;
    }
    if robot.current_target != Some(last) {
        return Some(InvariantViolation::PathMissesTarget { robot: robot.id });
    }
    None
}
