use std::collections::HashMap;

use super::*;
use crate::assignment::Strategy;
use crate::map::{Coordinates, Grid, InMemoryGridRepository};
use crate::robot::{RobotIcon, RobotId, RobotStatus};
use crate::task::{TaskId, TaskSpec, TaskStatus};

fn at(x: usize, y: usize) -> Coordinates {
    Coordinates::new(x, y)
}

fn spec(work_duration: u32, battery_cost: u32) -> TaskSpec {
    TaskSpec {
        work_duration,
        battery_cost,
    }
}

fn engine_on(grid: &str) -> SimulationEngine {
    let mut engine = SimulationEngine::default();
    let grid: Grid = grid.parse().unwrap();
    engine.load_grid("test", grid).unwrap();
    engine
}

/// Ticks until the run ends, checking every invariant after each tick.
fn run_checked(engine: &mut SimulationEngine, max_ticks: u64) -> Vec<Snapshot> {
    let grid = engine.grid().unwrap().clone();
    let mut last_status: HashMap<TaskId, TaskStatus> = engine
        .snapshot()
        .tasks
        .iter()
        .map(|task| (task.id, task.status))
        .collect();
    let mut history = Vec::new();

    while engine.status() == EngineStatus::Running {
        assert!(engine.clock() < max_ticks, "no termination within {} ticks", max_ticks);
        engine.tick().unwrap();
        let snapshot = engine.snapshot();
        if let Err(violations) = snapshot.validate(&grid) {
            panic!("tick {}: {:?}", snapshot.clock, violations);
        }
        for task in &snapshot.tasks {
            let prev = last_status.insert(task.id, task.status).unwrap();
            assert!(task.status >= prev, "task {} regressed", task.id);
        }
        history.push(snapshot);
    }
    history
}

#[test]
fn test_single_robot_open_grid_ends_at_eleven() {
    let mut engine = engine_on(".....\n.....\n.....\n.....\n.....");
    let robot = engine.add_robot(at(0, 0), RobotIcon::Rover).unwrap();
    let task = engine.add_task_with(at(4, 4), spec(3, 2)).unwrap();
    engine.set_strategy(Strategy::Nearest).unwrap();
    engine.start().unwrap();

    assert_eq!(engine.robot(robot).status, RobotStatus::EnRouteToTask);
    assert_eq!(engine.robot(robot).current_path.len(), 8);
    assert_eq!(engine.task(task).status, TaskStatus::Assigned);

    for _ in 0..8 {
        engine.tick().unwrap();
    }
    assert_eq!(engine.robot(robot).location, at(4, 4));
    assert_eq!(engine.robot(robot).status, RobotStatus::PerformingTask);
    assert_eq!(engine.task(task).status, TaskStatus::InProgress);
    assert_eq!(engine.robot(robot).battery, 100 - 8 - 2);

    run_checked(&mut engine, 50);
    assert_eq!(engine.status(), EngineStatus::Ended);
    assert_eq!(engine.task(task).status, TaskStatus::Completed);
    let metrics = engine.metrics().unwrap();
    assert_eq!(metrics.total_time, 11);
    assert_eq!(metrics.total_recharges, 0);
    assert_eq!(metrics.tasks_completed, 1);
    assert_eq!(metrics.cells_moved, 8);
}

#[test]
fn test_wall_detour_lengthens_route() {
    let mut engine = engine_on(".....\n####.\n.....\n.####\n.....");
    let robot = engine.add_robot(at(0, 0), RobotIcon::Rover).unwrap();
    engine.add_task_with(at(4, 4), spec(1, 0)).unwrap();
    engine.set_strategy(Strategy::Nearest).unwrap();
    engine.start().unwrap();

    assert_eq!(engine.robot(robot).current_path.len(), 8 + 8);
    run_checked(&mut engine, 50);
    assert_eq!(engine.metrics().unwrap().total_time, 16 + 1);
}

#[test]
fn test_contested_junction_lower_id_proceeds() {
    let mut engine = engine_on("#.#\n...\n#.#");
    let first = engine.add_robot(at(0, 1), RobotIcon::Rover).unwrap();
    let second = engine.add_robot(at(2, 1), RobotIcon::Rover).unwrap();
    let down = engine.add_task_with(at(1, 2), spec(1, 0)).unwrap();
    let up = engine.add_task_with(at(1, 0), spec(1, 0)).unwrap();
    engine.set_strategy(Strategy::Nearest).unwrap();
    engine.start().unwrap();

    assert_eq!(engine.robot(first).assigned_task, Some(down));
    assert_eq!(engine.robot(second).assigned_task, Some(up));

    engine.tick().unwrap();
    assert_eq!(engine.robot(first).location, at(1, 1));
    assert_eq!(engine.robot(second).location, at(2, 1));
    assert_eq!(engine.robot(second).consecutive_wait_steps, 1);

    engine.tick().unwrap();
    assert_eq!(engine.robot(first).location, at(1, 2));
    assert_eq!(engine.robot(second).location, at(1, 1));

    run_checked(&mut engine, 20);
    assert_eq!(engine.robot(second).location, at(1, 0));
    assert_eq!(engine.metrics().unwrap().tasks_completed, 2);
    assert_eq!(engine.metrics().unwrap().replans, 0);
}

#[test]
fn test_head_on_two_lanes_broken_by_repath() {
    let mut engine = engine_on(".....\n.....");
    let left = engine.add_robot(at(0, 0), RobotIcon::Rover).unwrap();
    let right = engine.add_robot(at(4, 0), RobotIcon::Rover).unwrap();
    engine.add_task_with(at(4, 0), spec(1, 0)).unwrap();
    engine.add_task_with(at(0, 0), spec(1, 0)).unwrap();
    engine.set_strategy(Strategy::RoundRobin).unwrap();
    engine.start().unwrap();

    assert_eq!(engine.robot(left).assigned_task, Some(TaskId(0)));
    assert_eq!(engine.robot(right).assigned_task, Some(TaskId(1)));

    run_checked(&mut engine, 30);
    assert_eq!(engine.robot(left).location, at(4, 0));
    assert_eq!(engine.robot(right).location, at(0, 0));
    let metrics = engine.metrics().unwrap();
    assert_eq!(metrics.tasks_completed, 2);
    assert_eq!(metrics.replans, 1);
    assert!(metrics.collision_waits > 0);
}

#[test]
fn test_head_on_corridor_blocker_steps_into_pocket() {
    let mut engine = engine_on("###.###\n.......");
    let left = engine.add_robot(at(0, 1), RobotIcon::Rover).unwrap();
    let right = engine.add_robot(at(6, 1), RobotIcon::Rover).unwrap();
    engine.add_task_with(at(5, 1), spec(1, 0)).unwrap();
    engine.add_task_with(at(1, 1), spec(1, 0)).unwrap();
    engine.set_strategy(Strategy::RoundRobin).unwrap();
    engine.start().unwrap();

    assert_eq!(engine.robot(left).assigned_task, Some(TaskId(0)));
    assert_eq!(engine.robot(right).assigned_task, Some(TaskId(1)));

    let history = run_checked(&mut engine, 40);
    assert!(history
        .iter()
        .any(|s| s.robot(left).is_some_and(|r| r.location == at(3, 0))));
    assert_eq!(engine.robot(left).location, at(5, 1));
    assert_eq!(engine.robot(right).location, at(1, 1));
    let metrics = engine.metrics().unwrap();
    assert_eq!(metrics.tasks_completed, 2);
    assert_eq!(metrics.total_time, 11);
}

#[test]
fn test_idle_robot_on_task_cell_trades_places() {
    let mut engine = engine_on("...");
    let worker = engine.add_robot(at(0, 0), RobotIcon::Rover).unwrap();
    let idler = engine.add_robot(at(2, 0), RobotIcon::Rover).unwrap();
    let task = engine.add_task_with(at(2, 0), spec(1, 1)).unwrap();
    engine.set_strategy(Strategy::Nearest).unwrap();
    engine.start().unwrap();
    assert_eq!(engine.robot(worker).assigned_task, Some(task));

    run_checked(&mut engine, 50);
    assert_eq!(engine.task(task).status, TaskStatus::Completed);
    assert_eq!(engine.robot(worker).location, at(2, 0));
    assert_eq!(engine.robot(idler).location, at(1, 0));
    assert_eq!(engine.robot(idler).status, RobotStatus::Idle);
    assert_eq!(engine.metrics().unwrap().total_time, 6);
}

#[test]
fn test_idle_robot_pushed_down_dead_end_corridor() {
    let mut engine = engine_on(".....");
    let far = engine.add_robot(at(0, 0), RobotIcon::Rover).unwrap();
    let near = engine.add_robot(at(3, 0), RobotIcon::Rover).unwrap();
    engine.add_task_with(at(4, 0), spec(1, 0)).unwrap();
    engine.add_task_with(at(2, 0), spec(1, 0)).unwrap();
    engine.set_strategy(Strategy::RoundRobin).unwrap();
    engine.start().unwrap();

    let history = run_checked(&mut engine, 100);
    // Pushed along the corridor before trading places at the end.
    assert!(history
        .iter()
        .any(|s| s.robot(near).is_some_and(|r| r.location == at(4, 0))));
    assert_eq!(engine.robot(far).location, at(4, 0));
    assert_eq!(engine.robot(near).location, at(3, 0));
    let metrics = engine.metrics().unwrap();
    assert_eq!(metrics.tasks_completed, 2);
    assert_eq!(metrics.total_time, 14);
}

#[test]
fn test_recharge_cycle() {
    let mut engine = engine_on("C....");
    let drone = engine.add_robot(at(1, 0), RobotIcon::Drone).unwrap();
    engine.add_task_with(at(4, 0), spec(1, 50)).unwrap();
    let near = engine.add_task_with(at(2, 0), spec(1, 50)).unwrap();
    engine.set_strategy(Strategy::Nearest).unwrap();
    engine.start().unwrap();
    assert_eq!(engine.robot(drone).assigned_task, Some(near));

    engine.tick().unwrap();
    engine.tick().unwrap();
    // 60 - 1 step - 50 work leaves 9, under 20%.
    assert_eq!(engine.robot(drone).status, RobotStatus::EnRouteToCharger);
    assert_eq!(engine.live_metrics().recharges(), 1);

    engine.tick().unwrap();
    engine.tick().unwrap();
    assert_eq!(engine.robot(drone).location, at(0, 0));
    assert_eq!(engine.robot(drone).status, RobotStatus::Charging);

    let history = run_checked(&mut engine, 40);
    assert!(history
        .iter()
        .any(|s| s.robot(drone).is_some_and(|r| r.battery == r.max_battery)));

    let metrics = engine.metrics().unwrap();
    assert_eq!(metrics.total_time, 15);
    assert_eq!(metrics.total_recharges, 2);
}

#[test]
fn test_low_battery_without_charger_still_works() {
    let mut engine = engine_on(".....");
    let drone = engine.add_robot(at(0, 0), RobotIcon::Drone).unwrap();
    engine.add_task_with(at(1, 0), spec(1, 50)).unwrap();
    engine.add_task_with(at(3, 0), spec(1, 2)).unwrap();
    engine.set_strategy(Strategy::Nearest).unwrap();
    engine.start().unwrap();

    run_checked(&mut engine, 20);
    assert_eq!(engine.robot(drone).battery, 5);
    let metrics = engine.metrics().unwrap();
    assert_eq!(metrics.total_time, 5);
    assert_eq!(metrics.total_recharges, 0);
    assert_eq!(metrics.tasks_completed, 2);
}

#[test]
fn test_unreachable_task_flagged_and_run_ends() {
    let mut engine = engine_on("..#..");
    engine.add_robot(at(0, 0), RobotIcon::Rover).unwrap();
    engine.add_task_with(at(1, 0), spec(2, 1)).unwrap();
    let walled = engine.add_task_with(at(4, 0), spec(2, 1)).unwrap();
    engine.set_strategy(Strategy::Nearest).unwrap();
    engine.start().unwrap();

    assert!(engine.state().unassignable.contains(&walled));
    run_checked(&mut engine, 20);
    let metrics = engine.metrics().unwrap();
    assert_eq!(metrics.unassignable_tasks, vec![walled]);
    assert_eq!(metrics.tasks_completed, 1);
    assert_eq!(engine.task(walled).status, TaskStatus::Unassigned);
}

#[test]
fn test_no_tasks_ends_on_first_tick() {
    let mut engine = engine_on("...");
    engine.add_robot(at(1, 0), RobotIcon::Rover).unwrap();
    engine.set_strategy(Strategy::RoundRobin).unwrap();
    engine.start().unwrap();
    assert_eq!(engine.tick(), Ok(EngineStatus::Ended));
    assert_eq!(engine.metrics().unwrap().total_time, 1);
}

#[test]
fn test_start_preconditions() {
    let mut engine = SimulationEngine::default();
    assert_eq!(engine.start(), Err(SimError::NoGridLoaded));

    engine.load_grid("test", Grid::open(3, 3).unwrap()).unwrap();
    assert_eq!(engine.start(), Err(SimError::NoRobots));

    engine.add_robot(at(0, 0), RobotIcon::Rover).unwrap();
    assert_eq!(engine.start(), Err(SimError::NoStrategy));
    assert_eq!(engine.status(), EngineStatus::Idle);

    engine.set_strategy(Strategy::Nearest).unwrap();
    engine.start().unwrap();
    assert!(matches!(
        engine.start(),
        Err(SimError::InvalidStateTransition {
            from: EngineStatus::Running,
            ..
        })
    ));
}

#[test]
fn test_invalid_placements_leave_state_unchanged() {
    let mut engine = SimulationEngine::default();
    assert_eq!(
        engine.add_robot(at(0, 0), RobotIcon::Rover),
        Err(SimError::NoGridLoaded)
    );

    let mut engine = engine_on(".#C");
    engine.add_robot(at(0, 0), RobotIcon::Rover).unwrap();
    let before = engine.snapshot();

    for bad in [at(1, 0), at(3, 0), at(0, 4), at(0, 0)] {
        assert!(matches!(
            engine.add_robot(bad, RobotIcon::Rover),
            Err(SimError::InvalidPlacement { .. })
        ));
    }
    for bad in [at(1, 0), at(2, 0), at(9, 9)] {
        assert!(matches!(
            engine.add_task(bad),
            Err(SimError::InvalidPlacement { .. })
        ));
    }
    assert_eq!(engine.snapshot(), before);

    // Robots may start on a charger.
    assert_eq!(engine.add_robot(at(2, 0), RobotIcon::Drone), Ok(RobotId(1)));
}

#[test]
fn test_default_task_spec_from_config() {
    let mut engine = engine_on("...");
    let id = engine.add_task(at(2, 0)).unwrap();
    let defaults = engine.config().default_task;
    assert_eq!(engine.task(id).work_duration, defaults.work_duration);
    assert_eq!(engine.task(id).battery_cost, defaults.battery_cost);
}

#[test]
fn test_setup_locked_after_start() {
    let mut engine = engine_on("....");
    engine.add_robot(at(0, 0), RobotIcon::Rover).unwrap();
    engine.add_task(at(3, 0)).unwrap();
    engine.set_strategy(Strategy::Nearest).unwrap();
    engine.start().unwrap();

    assert!(matches!(
        engine.add_robot(at(1, 0), RobotIcon::Rover),
        Err(SimError::InvalidStateTransition { .. })
    ));
    assert!(matches!(
        engine.set_strategy(Strategy::RoundRobin),
        Err(SimError::InvalidStateTransition { .. })
    ));
    assert_eq!(engine.strategy(), Some(Strategy::Nearest));
}

#[test]
fn test_pause_resume_retains_state() {
    let mut engine = engine_on("......");
    let robot = engine.add_robot(at(0, 0), RobotIcon::Rover).unwrap();
    engine.add_task_with(at(5, 0), spec(2, 1)).unwrap();
    engine.set_strategy(Strategy::Nearest).unwrap();

    assert!(engine.pause().is_err());
    assert_eq!(engine.tick(), Err(SimError::NotRunning(EngineStatus::Idle)));

    engine.start().unwrap();
    engine.tick().unwrap();
    engine.tick().unwrap();
    engine.pause().unwrap();
    let paused = engine.snapshot();

    assert_eq!(engine.tick(), Err(SimError::NotRunning(EngineStatus::Paused)));
    assert_eq!(engine.snapshot(), paused);

    engine.resume().unwrap();
    assert!(engine.resume().is_err());
    engine.tick().unwrap();
    assert_eq!(engine.clock(), 3);
    assert_eq!(engine.robot(robot).location, at(3, 0));
}

#[test]
fn test_reset_restores_setup_and_replays_identically() {
    let mut engine = engine_on("C.....\n..##..\n......");
    engine.add_robot(at(0, 2), RobotIcon::Rover).unwrap();
    engine.add_robot(at(5, 0), RobotIcon::Drone).unwrap();
    engine.add_task_with(at(5, 2), spec(3, 30)).unwrap();
    engine.add_task_with(at(1, 0), spec(2, 30)).unwrap();
    engine.add_task_with(at(3, 0), spec(4, 10)).unwrap();
    engine.set_strategy(Strategy::Nearest).unwrap();
    let setup = engine.snapshot();

    engine.start().unwrap();
    let first = run_checked(&mut engine, 200);
    let first_metrics = engine.metrics().cloned().unwrap();

    engine.reset();
    assert_eq!(engine.status(), EngineStatus::Idle);
    assert_eq!(engine.clock(), 0);
    assert!(engine.metrics().is_none());
    assert_eq!(engine.snapshot(), setup);
    assert_eq!(engine.strategy(), Some(Strategy::Nearest));

    engine.start().unwrap();
    let second = run_checked(&mut engine, 200);
    assert_eq!(first, second);
    assert_eq!(engine.metrics(), Some(&first_metrics));
}

#[test]
fn test_reset_mid_run() {
    let mut engine = engine_on(".....");
    let robot = engine.add_robot(at(0, 0), RobotIcon::Rover).unwrap();
    let task = engine.add_task_with(at(4, 0), spec(5, 5)).unwrap();
    engine.set_strategy(Strategy::RoundRobin).unwrap();
    engine.start().unwrap();
    engine.tick().unwrap();
    engine.pause().unwrap();

    engine.reset();
    let robot = engine.robot(robot);
    assert_eq!(robot.location, at(0, 0));
    assert_eq!(robot.battery, robot.max_battery);
    assert!(robot.current_path.is_empty());
    assert_eq!(robot.status, RobotStatus::Idle);
    assert_eq!(engine.task(task).status, TaskStatus::Unassigned);
    assert_eq!(engine.task(task).assigned_robot, None);
}

#[test]
fn test_speed_only_changes_interval() {
    let mut engine = SimulationEngine::default();
    let base = engine.tick_interval();
    engine.set_speed(2.0).unwrap();
    assert_eq!(engine.tick_interval(), base / 2);
    assert_eq!(engine.set_speed(0.0), Err(SimError::InvalidSpeed(0.0)));
    assert!(engine.set_speed(f64::NAN).is_err());
    assert!(engine.set_speed(100.0).is_err());
    assert_eq!(engine.speed(), 2.0);
}

#[test]
fn test_many_robots_reach_end_with_both_strategies() {
    let tasks = [
        at(3, 0),
        at(4, 4),
        at(1, 6),
        at(6, 2),
        at(2, 2),
        at(5, 6),
        at(7, 4),
        at(0, 3),
        at(4, 1),
        at(3, 7),
    ];
    for strategy in [Strategy::Nearest, Strategy::RoundRobin] {
        let mut engine = SimulationEngine::default();
        engine.load_grid("open", Grid::open(8, 8).unwrap()).unwrap();
        for corner in [at(0, 0), at(7, 0), at(0, 7), at(7, 7)] {
            engine.add_robot(corner, RobotIcon::Rover).unwrap();
        }
        for location in tasks {
            engine.add_task(location).unwrap();
        }
        engine.set_strategy(strategy).unwrap();
        engine.start().unwrap();

        run_checked(&mut engine, 500);
        let metrics = engine.metrics().unwrap();
        assert_eq!(metrics.tasks_completed, 10, "{}", strategy);
        assert!(metrics.unassignable_tasks.is_empty());
    }
}

#[test]
fn test_run_record_after_end() {
    let mut engine = engine_on("...");
    engine.add_robot(at(0, 0), RobotIcon::Rover).unwrap();
    engine.add_task_with(at(2, 0), spec(1, 1)).unwrap();
    engine.set_strategy(Strategy::RoundRobin).unwrap();
    engine.start().unwrap();
    assert!(engine.run_record().is_none());

    run_checked(&mut engine, 10);
    let record = engine.run_record().unwrap();
    assert_eq!(record.grid_id, "test");
    assert_eq!(record.strategy, Strategy::RoundRobin);
    assert_eq!(record.total_time, 3);
    assert_eq!(record.robot_count, 1);
    assert_eq!(record.task_count, 1);
}

#[test]
fn test_load_grid_from_repository() {
    let mut repo = InMemoryGridRepository::new();
    repo.insert("bay", "..C\n...".parse::<Grid>().unwrap());

    let mut engine = SimulationEngine::default();
    assert_eq!(
        engine.load_grid_from(&repo, "dock"),
        Err(SimError::GridNotFound("dock".to_string()))
    );
    engine.load_grid_from(&repo, "bay").unwrap();
    assert_eq!(engine.grid_id(), Some("bay"));
    assert_eq!(engine.grid().unwrap().charging_stations().count(), 1);
}
