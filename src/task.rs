use std::fmt;

use crate::map::Coordinates;
use crate::robot::RobotId;
use crate::simulation::error::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u32);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered by lifecycle stage; a task only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskStatus {
    Unassigned,
    Assigned,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn successor(self) -> Option<TaskStatus> {
        match self {
            TaskStatus::Unassigned => Some(TaskStatus::Assigned),
            TaskStatus::Assigned => Some(TaskStatus::InProgress),
            TaskStatus::InProgress => Some(TaskStatus::Completed),
            TaskStatus::Completed => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSpec {
    pub work_duration: u32,
    pub battery_cost: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub location: Coordinates,
    pub status: TaskStatus,
    /// Ticks of work remaining.
    pub work_duration: u32,
    pub battery_cost: u32,
    pub assigned_robot: Option<RobotId>,
    spec: TaskSpec,
}

impl Task {
    pub fn new(id: TaskId, location: Coordinates, spec: TaskSpec) -> Self {
        Self {
            id,
            location,
            status: TaskStatus::Unassigned,
            work_duration: spec.work_duration,
            battery_cost: spec.battery_cost,
            assigned_robot: None,
            spec,
        }
    }

    /// Moves to the next lifecycle stage. Skipping or going back is an error.
    pub fn advance_to(&mut self, next: TaskStatus) -> Result<(), SimError> {
        if self.status.successor() != Some(next) {
            return Err(SimError::InvalidTaskTransition {
                task: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// One tick of work. Returns true when the counter reaches zero.
    pub fn work(&mut self) -> bool {
        self.work_duration = self.work_duration.saturating_sub(1);
        self.work_duration == 0
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, TaskStatus::Assigned | TaskStatus::InProgress)
    }

    pub fn reset(&mut self) {
        *self = Task::new(self.id, self.location, self.spec);
    }
}
