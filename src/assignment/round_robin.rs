use std::collections::BTreeSet;

use log::debug;

use super::{
    is_robot_available_for_task, Assignment, AssignmentView, Strategy, TaskAssignmentPolicy,
};
use crate::pathfinding::find_path;
use crate::robot::RobotId;

/// Rotates through robots in placement order. Each opportunity starts at the
/// pointer and offers idle robots the oldest task they can feasibly reach; a
/// robot is offered at most once per phase.
#[derive(Debug, Default)]
pub struct RoundRobinPolicy {
    next: usize,
}

impl RoundRobinPolicy {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    pub fn pointer(&self) -> usize {
        self.next
    }
}

impl TaskAssignmentPolicy for RoundRobinPolicy {
    fn strategy(&self) -> Strategy {
        Strategy::RoundRobin
    }

    fn assign(&mut self, view: &AssignmentView<'_>) -> Vec<Assignment> {
        let order: Vec<RobotId> = view.robots.keys().copied().collect();
        if order.is_empty() {
            return Vec::new();
        }

        let mut offered = BTreeSet::new();
        let mut taken = BTreeSet::new();
        let mut assignments = Vec::new();

        'opportunity: loop {
            for step in 0..order.len() {
                let idx = (self.next + step) % order.len();
                let robot_id = order[idx];
                if !view.is_candidate(robot_id) || !offered.insert(robot_id) {
                    continue;
                }

                let robot = view.robot(robot_id);
                let offer = view
                    .open_tasks()
                    .filter(|task| !taken.contains(&task.id))
                    .find_map(|task| {
                        let path = find_path(view.grid, robot.location, task.location);
                        if is_robot_available_for_task(robot, task, &path) {
                            path.ok().map(|path| (task.id, path))
                        } else {
                            None
                        }
                    });

                if let Some((task, path)) = offer {
                    debug!("Robot {}: round-robin offer of task {} accepted", robot_id, task);
                    taken.insert(task);
                    assignments.push(Assignment {
                        robot: robot_id,
                        task,
                        path,
                    });
                    self.next = (idx + 1) % order.len();
                    continue 'opportunity;
                }
                debug!("Robot {}: no task it can reach", robot_id);
            }
            break;
        }

        assignments
    }

    fn reset(&mut self) {
        self.next = 0;
    }
}
