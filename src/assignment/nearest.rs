use std::collections::BTreeSet;

use log::debug;

use super::{
    is_robot_available_for_task, Assignment, AssignmentView, Strategy, TaskAssignmentPolicy,
};
use crate::pathfinding::find_path;

/// Each idle robot, in id order, takes the feasible task with the shortest
/// path. Ties go to the lowest task id.
#[derive(Debug, Default)]
pub struct NearestPolicy;

impl TaskAssignmentPolicy for NearestPolicy {
    fn strategy(&self) -> Strategy {
        Strategy::Nearest
    }

    fn assign(&mut self, view: &AssignmentView<'_>) -> Vec<Assignment> {
        let mut taken = BTreeSet::new();
        let mut assignments = Vec::new();

        for &robot_id in view.candidates {
            let robot = view.robot(robot_id);
            let best = view
                .open_tasks()
                .filter(|task| !taken.contains(&task.id))
                .filter_map(|task| {
                    let path = find_path(view.grid, robot.location, task.location);
                    if is_robot_available_for_task(robot, task, &path) {
                        path.ok().map(|path| (path.len(), task.id, path))
                    } else {
                        None
                    }
                })
                .min_by_key(|(len, task_id, _)| (*len, *task_id));

            match best {
                Some((len, task, path)) => {
                    debug!("Robot {}: nearest task {} is {} steps away", robot_id, task, len);
                    taken.insert(task);
                    assignments.push(Assignment {
                        robot: robot_id,
                        task,
                        path,
                    });
                }
                None => debug!("Robot {}: no feasible task", robot_id),
            }
        }

        assignments
    }
}
