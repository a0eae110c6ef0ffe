use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};

use super::error::SimError;
use super::metrics::{MetricsCollector, RunMetrics, RunRecord};
use super::snapshot::Snapshot;
use crate::assignment::{Assignment, AssignmentView, Strategy, TaskAssignmentPolicy};
use crate::map::{Coordinates, Grid, GridRepository};
use crate::pathfinding::{find_path, find_path_avoiding, NoPathFound, Path};
use crate::robot::config::{self, SimulationConfig};
use crate::robot::movement::{is_valid_move, passable_neighbors};
use crate::robot::{Robot, RobotIcon, RobotId, RobotStatus};
use crate::task::{Task, TaskId, TaskSpec, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineStatus {
    /// Not started yet, or reset.
    Idle,
    Running,
    Paused,
    /// Every task is completed or unassignable.
    Ended,
}

/// Everything that changes during a run.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub clock: u64,
    pub status: EngineStatus,
    pub robots: BTreeMap<RobotId, Robot>,
    pub tasks: BTreeMap<TaskId, Task>,
    pub unassignable: BTreeSet<TaskId>,
    reachability_checked: BTreeSet<TaskId>,
    stalled: BTreeSet<RobotId>,
}

impl SimulationState {
    fn new() -> Self {
        Self {
            clock: 0,
            status: EngineStatus::Idle,
            robots: BTreeMap::new(),
            tasks: BTreeMap::new(),
            unassignable: BTreeSet::new(),
            reachability_checked: BTreeSet::new(),
            stalled: BTreeSet::new(),
        }
    }

    fn robot_mut(&mut self, id: RobotId) -> &mut Robot {
        self.robots
            .get_mut(&id)
            .unwrap_or_else(|| panic!("unknown robot {}", id))
    }

    fn task_mut(&mut self, id: TaskId) -> &mut Task {
        self.tasks
            .get_mut(&id)
            .unwrap_or_else(|| panic!("unknown task {}", id))
    }
}

/// Owns one run: the grid, the entities, the assignment policy and the clock.
///
/// The engine has no timer. A driver calls [`SimulationEngine::tick`] at
/// whatever cadence it likes; each call runs to completion and leaves a
/// settled state behind.
pub struct SimulationEngine {
    config: SimulationConfig,
    grid: Option<Arc<Grid>>,
    grid_id: Option<String>,
    policy: Option<Box<dyn TaskAssignmentPolicy>>,
    state: SimulationState,
    metrics: MetricsCollector,
    final_metrics: Option<RunMetrics>,
    speed: f64,
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl SimulationEngine {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            grid: None,
            grid_id: None,
            policy: None,
            state: SimulationState::new(),
            metrics: MetricsCollector::new(),
            final_metrics: None,
            speed: 1.0,
        }
    }

    // ---- setup ----

    /// Installs the grid for this run. Existing placements are dropped.
    pub fn load_grid(&mut self, grid_id: impl Into<String>, grid: Grid) -> Result<(), SimError> {
        self.require_setup("load a grid")?;
        let grid_id = grid_id.into();
        info!(
            "Loaded grid '{}' ({}x{})",
            grid_id,
            grid.width(),
            grid.height()
        );
        self.state = SimulationState::new();
        self.grid = Some(Arc::new(grid));
        self.grid_id = Some(grid_id);
        Ok(())
    }

    pub fn load_grid_from(
        &mut self,
        repository: &dyn GridRepository,
        grid_id: &str,
    ) -> Result<(), SimError> {
        self.require_setup("load a grid")?;
        let grid = repository.fetch_grid(grid_id)?;
        self.load_grid(grid_id, grid)
    }

    pub fn add_robot(&mut self, location: Coordinates, icon: RobotIcon) -> Result<RobotId, SimError> {
        self.require_setup("add a robot")?;
        let grid = self.grid.as_ref().ok_or(SimError::NoGridLoaded)?;
        check_in_bounds(grid, location)?;
        if !grid.is_passable(location) {
            return Err(SimError::InvalidPlacement {
                location,
                reason: "robots need a walkable or charging cell",
            });
        }
        if self.state.robots.values().any(|r| r.location == location) {
            return Err(SimError::InvalidPlacement {
                location,
                reason: "cell already holds a robot",
            });
        }

        let id = RobotId(self.state.robots.len() as u32);
        self.state.robots.insert(id, Robot::new(id, location, icon));
        info!("Robot {}: placed at {} as {:?}", id, location, icon);
        Ok(id)
    }

    pub fn add_task(&mut self, location: Coordinates) -> Result<TaskId, SimError> {
        let spec = self.config.default_task;
        self.add_task_with(location, spec)
    }

    pub fn add_task_with(&mut self, location: Coordinates, spec: TaskSpec) -> Result<TaskId, SimError> {
        self.require_setup("add a task")?;
        let grid = self.grid.as_ref().ok_or(SimError::NoGridLoaded)?;
        check_in_bounds(grid, location)?;
        if !grid.is_walkable(location) {
            return Err(SimError::InvalidPlacement {
                location,
                reason: "tasks need a walkable cell",
            });
        }

        let id = TaskId(self.state.tasks.len() as u32);
        self.state.tasks.insert(id, Task::new(id, location, spec));
        info!(
            "Task {}: placed at {} ({} ticks, cost {})",
            id, location, spec.work_duration, spec.battery_cost
        );
        Ok(id)
    }

    pub fn set_strategy(&mut self, strategy: Strategy) -> Result<(), SimError> {
        self.require_setup("change strategy")?;
        info!("Assignment strategy set to {}", strategy);
        self.policy = Some(strategy.policy());
        Ok(())
    }

    // ---- lifecycle ----

    pub fn start(&mut self) -> Result<(), SimError> {
        if self.state.status != EngineStatus::Idle {
            return Err(SimError::InvalidStateTransition {
                from: self.state.status,
                action: "start",
            });
        }
        let grid = Arc::clone(self.grid.as_ref().ok_or(SimError::NoGridLoaded)?);
        if self.state.robots.is_empty() {
            return Err(SimError::NoRobots);
        }
        if self.policy.is_none() {
            return Err(SimError::NoStrategy);
        }

        self.state.clock = 0;
        self.metrics.reset();
        self.final_metrics = None;
        self.assignment_phase(&grid);
        self.state.status = EngineStatus::Running;
        info!(
            "Simulation started: {} robots, {} tasks",
            self.state.robots.len(),
            self.state.tasks.len()
        );
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), SimError> {
        if self.state.status != EngineStatus::Running {
            return Err(SimError::InvalidStateTransition {
                from: self.state.status,
                action: "pause",
            });
        }
        self.state.status = EngineStatus::Paused;
        info!("Simulation paused at tick {}", self.state.clock);
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), SimError> {
        if self.state.status != EngineStatus::Paused {
            return Err(SimError::InvalidStateTransition {
                from: self.state.status,
                action: "resume",
            });
        }
        self.state.status = EngineStatus::Running;
        info!("Simulation resumed at tick {}", self.state.clock);
        Ok(())
    }

    /// Restores placement-time robots and tasks and zeroes the clock.
    /// Grid, placements and strategy are kept.
    pub fn reset(&mut self) {
        for robot in self.state.robots.values_mut() {
            robot.reset();
        }
        for task in self.state.tasks.values_mut() {
            task.reset();
        }
        self.state.clock = 0;
        self.state.status = EngineStatus::Idle;
        self.state.unassignable.clear();
        self.state.reachability_checked.clear();
        self.state.stalled.clear();
        self.metrics.reset();
        self.final_metrics = None;
        if let Some(policy) = self.policy.as_mut() {
            policy.reset();
        }
        info!("Simulation reset");
    }

    /// Scales the driver's tick cadence. Tick semantics are unaffected.
    pub fn set_speed(&mut self, factor: f64) -> Result<(), SimError> {
        if !factor.is_finite() || !(config::MIN_SPEED..=config::MAX_SPEED).contains(&factor) {
            return Err(SimError::InvalidSpeed(factor));
        }
        self.speed = factor;
        debug!("Speed factor set to {}", factor);
        Ok(())
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn tick_interval(&self) -> Duration {
        config::BASE_TICK_INTERVAL.div_f64(self.speed)
    }

    // ---- the tick ----

    /// Advances the clock by one and runs every phase in order:
    /// movement, task work, charging, assignment, termination check.
    pub fn tick(&mut self) -> Result<EngineStatus, SimError> {
        if self.state.status != EngineStatus::Running {
            return Err(SimError::NotRunning(self.state.status));
        }
        let grid = Arc::clone(self.grid.as_ref().ok_or(SimError::NoGridLoaded)?);

        self.state.clock += 1;
        debug!("Tick {}", self.state.clock);

        let arrived = self.movement_phase(&grid);
        self.task_work_phase(&arrived);
        self.charging_phase(&arrived);
        self.assignment_phase(&grid);
        self.termination_check();

        if cfg!(debug_assertions) {
            if let Err(violations) = self.snapshot().validate(&grid) {
                for violation in violations {
                    error!("Tick {}: {}", self.state.clock, violation);
                }
            }
        }

        Ok(self.state.status)
    }

    /// Moves every en-route robot one step if it can. Returns robots that
    /// reached their target this tick.
    fn movement_phase(&mut self, grid: &Grid) -> BTreeSet<RobotId> {
        let mut occupied: HashMap<Coordinates, RobotId> = self
            .state
            .robots
            .values()
            .map(|robot| (robot.location, robot.id))
            .collect();
        let parked: HashSet<Coordinates> = self
            .state
            .robots
            .values()
            .filter(|robot| !robot.status.is_en_route())
            .map(|robot| robot.location)
            .collect();
        let threshold = self.config.deadlock_threshold;
        let ids: Vec<RobotId> = self.state.robots.keys().copied().collect();
        let mut moved = HashSet::new();
        let mut arrived = BTreeSet::new();

        for id in ids {
            if moved.contains(&id) {
                continue;
            }
            let Some(robot) = self.state.robots.get_mut(&id) else {
                continue;
            };
            if !robot.status.is_en_route() {
                continue;
            }

            if robot.next_step().is_some() {
                let outcome = step_robot(
                    robot,
                    grid,
                    &mut occupied,
                    &parked,
                    threshold,
                    &mut self.metrics,
                    &mut self.state.stalled,
                );
                match outcome {
                    StepOutcome::Moved => {
                        moved.insert(id);
                    }
                    StepOutcome::Waited => {}
                    StepOutcome::Stuck(blocker) => {
                        if self.make_way(id, blocker, grid, &mut occupied, &moved) {
                            moved.insert(id);
                            moved.insert(blocker);
                            let other = self.robot(blocker);
                            if other.status.is_en_route() && other.has_arrived() {
                                arrived.insert(blocker);
                            }
                        } else {
                            debug!("Robot {}: robot {} cannot make way", id, blocker);
                            self.state.robot_mut(id).consecutive_wait_steps = 0;
                        }
                    }
                }
            } else if !robot.has_arrived() {
                warn!("Robot {}: en route with no path, re-planning", robot.id);
                replan(robot, grid, &HashSet::new());
                continue;
            }

            if self.robot(id).has_arrived() {
                arrived.insert(id);
            }
        }

        for &id in &arrived {
            self.arrive(id);
        }
        arrived
    }

    /// Moves `blocker` out of the way of `waiter`, then moves `waiter` into
    /// the freed cell. The blocker takes a free cell off the waiter's
    /// remaining path if it has one, else the next free cell along that
    /// path, else the two trade places. Working, charging and
    /// already-moved robots stay put.
    fn make_way(
        &mut self,
        waiter: RobotId,
        blocker: RobotId,
        grid: &Grid,
        occupied: &mut HashMap<Coordinates, RobotId>,
        moved: &HashSet<RobotId>,
    ) -> bool {
        let waiter_robot = self.robot(waiter);
        let waiter_at = waiter_robot.location;
        let lane: Vec<Coordinates> = waiter_robot.current_path.iter().copied().collect();

        let other = self.robot(blocker);
        let free_to_move = other.status == RobotStatus::Idle || other.status.is_en_route();
        if moved.contains(&blocker) || !free_to_move || !other.can_afford_step() {
            return false;
        }
        let from = other.location;
        let aside = passable_neighbors(from, grid)
            .find(|cell| !occupied.contains_key(cell) && !lane.contains(cell));
        let ahead = lane
            .get(1)
            .copied()
            .filter(|cell| !occupied.contains_key(cell));
        let to = aside.or(ahead).unwrap_or(waiter_at);

        let other = self.state.robot_mut(blocker);
        other.location = to;
        other.drain(other.movement_cost);
        other.consecutive_wait_steps = 0;
        if let Some(target) = other.current_target {
            match find_path(grid, to, target) {
                Ok(path) => other.set_route(target, path),
                Err(NoPathFound) => other.current_path.clear(),
            }
        }
        self.metrics.record_move();
        info!(
            "Robot {}: stepped from {} to {} to let robot {} pass",
            blocker, from, to, waiter
        );

        occupied.remove(&from);
        let robot = self.state.robot_mut(waiter);
        move_robot(robot, occupied, &mut self.metrics);
        occupied.insert(to, blocker);
        true
    }

    fn arrive(&mut self, id: RobotId) {
        let robot = self.state.robot_mut(id);
        let status = robot.status;
        match status {
            RobotStatus::EnRouteToTask => {
                let Some(task_id) = robot.assigned_task else {
                    warn!("Robot {}: arrived without a task, skipping", id);
                    return;
                };
                if let Err(e) = robot.transition(RobotStatus::PerformingTask) {
                    error!("{}", e);
                    return;
                }
                let task = self.state.task_mut(task_id);
                let cost = task.battery_cost;
                if let Err(e) = task.advance_to(TaskStatus::InProgress) {
                    error!("{}", e);
                }
                let robot = self.state.robot_mut(id);
                robot.drain(cost);
                info!(
                    "Robot {}: started task {} at {} (battery {})",
                    id, task_id, robot.location, robot.battery
                );
            }
            RobotStatus::EnRouteToCharger => {
                if let Err(e) = robot.transition(RobotStatus::Charging) {
                    error!("{}", e);
                    return;
                }
                info!("Robot {}: charging at {}", id, robot.location);
            }
            other => warn!("Robot {}: arrival while {:?} ignored", id, other),
        }
    }

    fn task_work_phase(&mut self, arrived: &BTreeSet<RobotId>) {
        let state = &mut self.state;
        for robot in state.robots.values_mut() {
            if robot.status != RobotStatus::PerformingTask || arrived.contains(&robot.id) {
                continue;
            }
            let Some(task_id) = robot.assigned_task else {
                warn!("Robot {}: performing without a task, skipping", robot.id);
                continue;
            };
            let task = state
                .tasks
                .get_mut(&task_id)
                .unwrap_or_else(|| panic!("unknown task {}", task_id));

            if !task.work() {
                continue;
            }
            if let Err(e) = task.advance_to(TaskStatus::Completed) {
                error!("{}", e);
                continue;
            }
            task.assigned_robot = None;
            robot.assigned_task = None;
            robot.clear_route();
            if let Err(e) = robot.transition(RobotStatus::Idle) {
                error!("{}", e);
            }
            self.metrics.record_completion();
            info!("Robot {}: completed task {}", robot.id, task_id);
        }
    }

    fn charging_phase(&mut self, arrived: &BTreeSet<RobotId>) {
        let rate = self.config.charge_rate;
        for robot in self.state.robots.values_mut() {
            if robot.status != RobotStatus::Charging || arrived.contains(&robot.id) {
                continue;
            }
            if robot.charge(rate) {
                robot.clear_route();
                if let Err(e) = robot.transition(RobotStatus::Idle) {
                    error!("{}", e);
                    continue;
                }
                info!("Robot {}: fully charged", robot.id);
            }
        }
    }

    /// Idle robots either head for a charger or become candidates for the policy.
    fn assignment_phase(&mut self, grid: &Grid) {
        self.flag_unreachable_tasks(grid);

        let low = self.config.low_battery_fraction;
        let mut candidates = Vec::new();
        for robot in self.state.robots.values_mut() {
            if robot.status != RobotStatus::Idle {
                continue;
            }
            if robot.assigned_task.is_none() && robot.needs_charge(low) {
                match nearest_charger(grid, robot.location) {
                    Some((station, path)) => {
                        let steps = path.len();
                        robot.set_route(station, path);
                        if let Err(e) = robot.transition(RobotStatus::EnRouteToCharger) {
                            error!("{}", e);
                            robot.clear_route();
                            continue;
                        }
                        self.metrics.record_recharge();
                        info!(
                            "Robot {}: battery {}/{}, heading to charger at {} ({} steps)",
                            robot.id, robot.battery, robot.max_battery, station, steps
                        );
                        continue;
                    }
                    None => debug!("Robot {}: low battery but no reachable charger", robot.id),
                }
            }
            candidates.push(robot.id);
        }

        if candidates.is_empty() {
            return;
        }
        let Some(policy) = self.policy.as_mut() else {
            return;
        };
        let view = AssignmentView {
            grid,
            robots: &self.state.robots,
            tasks: &self.state.tasks,
            candidates: &candidates,
            excluded: &self.state.unassignable,
        };
        let assignments = policy.assign(&view);

        for assignment in assignments {
            self.apply_assignment(assignment);
        }
    }

    /// Unreachable from every robot means unreachable for the whole run,
    /// since the grid never changes. Each task is checked once.
    fn flag_unreachable_tasks(&mut self, grid: &Grid) {
        let state = &mut self.state;
        for task in state.tasks.values() {
            if task.status != TaskStatus::Unassigned || !state.reachability_checked.insert(task.id) {
                continue;
            }
            let reachable = state
                .robots
                .values()
                .any(|robot| find_path(grid, robot.location, task.location).is_ok());
            if !reachable {
                warn!(
                    "Task {}: unreachable from every robot, flagged unassignable",
                    task.id
                );
                state.unassignable.insert(task.id);
            }
        }
    }

    fn apply_assignment(&mut self, assignment: Assignment) {
        let Assignment { robot: robot_id, task: task_id, path } = assignment;
        let task = self.state.task_mut(task_id);
        let task_location = task.location;
        if task.status != TaskStatus::Unassigned {
            warn!("Task {}: already {:?}, assignment dropped", task_id, task.status);
            return;
        }

        let robot = self.state.robot_mut(robot_id);
        if robot.status != RobotStatus::Idle {
            warn!("Robot {}: no longer idle, assignment dropped", robot_id);
            return;
        }
        if path.last().copied().unwrap_or(robot.location) != task_location {
            warn!("Robot {}: path does not reach task {}, dropped", robot_id, task_id);
            return;
        }

        let steps = path.len();
        robot.set_route(task_location, path);
        if let Err(e) = robot.transition(RobotStatus::EnRouteToTask) {
            error!("{}", e);
            robot.clear_route();
            return;
        }
        robot.assigned_task = Some(task_id);

        let task = self.state.task_mut(task_id);
        if let Err(e) = task.advance_to(TaskStatus::Assigned) {
            error!("{}", e);
        }
        task.assigned_robot = Some(robot_id);
        info!(
            "Robot {}: assigned task {} at {} ({} steps)",
            robot_id, task_id, task_location, steps
        );
    }

    fn termination_check(&mut self) {
        let state = &self.state;
        let done = state
            .tasks
            .values()
            .all(|task| task.status == TaskStatus::Completed || state.unassignable.contains(&task.id));
        if !done {
            return;
        }

        let unassignable: Vec<TaskId> = state.unassignable.iter().copied().collect();
        let metrics = self.metrics.finalize(state.clock, unassignable);
        info!(
            "Simulation ended at tick {}: {} tasks completed, {} recharges",
            metrics.total_time, metrics.tasks_completed, metrics.total_recharges
        );
        self.final_metrics = Some(metrics);
        self.state.status = EngineStatus::Ended;
    }

    // ---- read side ----

    pub fn status(&self) -> EngineStatus {
        self.state.status
    }

    pub fn clock(&self) -> u64 {
        self.state.clock
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_deref()
    }

    pub fn grid_id(&self) -> Option<&str> {
        self.grid_id.as_deref()
    }

    pub fn strategy(&self) -> Option<Strategy> {
        self.policy.as_ref().map(|policy| policy.strategy())
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn robot(&self, id: RobotId) -> &Robot {
        self.state
            .robots
            .get(&id)
            .unwrap_or_else(|| panic!("unknown robot {}", id))
    }

    pub fn task(&self, id: TaskId) -> &Task {
        self.state
            .tasks
            .get(&id)
            .unwrap_or_else(|| panic!("unknown task {}", id))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            clock: self.state.clock,
            status: self.state.status,
            robots: self.state.robots.values().cloned().collect(),
            tasks: self.state.tasks.values().cloned().collect(),
        }
    }

    /// Present once the run has ended.
    pub fn metrics(&self) -> Option<&RunMetrics> {
        self.final_metrics.as_ref()
    }

    /// Counters so far, for display while running.
    pub fn live_metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn run_record(&self) -> Option<RunRecord> {
        let metrics = self.final_metrics.as_ref()?;
        Some(RunRecord::new(
            self.grid_id.clone()?,
            self.strategy()?,
            metrics,
            self.state.robots.len(),
            self.state.tasks.len(),
        ))
    }

    fn require_setup(&self, action: &'static str) -> Result<(), SimError> {
        if self.state.status == EngineStatus::Idle {
            Ok(())
        } else {
            Err(SimError::InvalidStateTransition {
                from: self.state.status,
                action,
            })
        }
    }
}

fn check_in_bounds(grid: &Grid, location: Coordinates) -> Result<(), SimError> {
    if grid.in_bounds(location) {
        Ok(())
    } else {
        Err(SimError::InvalidPlacement {
            location,
            reason: "out of bounds",
        })
    }
}

/// Shortest reachable station. Ties go to the lowest station coordinate.
fn nearest_charger(grid: &Grid, from: Coordinates) -> Option<(Coordinates, Path)> {
    grid.charging_stations()
        .filter_map(|station| {
            find_path(grid, from, station)
                .ok()
                .map(|path| (station, path))
        })
        .min_by_key(|(station, path)| (path.len(), *station))
}

/// Result of one movement attempt.
enum StepOutcome {
    Moved,
    Waited,
    /// Waited past the deadlock threshold and found no detour around this robot.
    Stuck(RobotId),
}

/// One movement attempt for a robot with a non-empty path.
fn step_robot(
    robot: &mut Robot,
    grid: &Grid,
    occupied: &mut HashMap<Coordinates, RobotId>,
    parked: &HashSet<Coordinates>,
    threshold: u32,
    metrics: &mut MetricsCollector,
    stalled: &mut BTreeSet<RobotId>,
) -> StepOutcome {
    let Some(next) = robot.next_step() else {
        return StepOutcome::Waited;
    };
    if !is_valid_move(robot.location, next, grid) {
        warn!(
            "Robot {}: step {} -> {} is not a valid move, re-planning",
            robot.id, robot.location, next
        );
        replan(robot, grid, &HashSet::new());
        return StepOutcome::Waited;
    }
    if !robot.can_afford_step() {
        if stalled.insert(robot.id) {
            warn!(
                "Robot {}: battery {} too low to move (needs {})",
                robot.id, robot.battery, robot.movement_cost
            );
        }
        return StepOutcome::Waited;
    }
    stalled.remove(&robot.id);

    let Some(&blocker) = occupied.get(&next) else {
        move_robot(robot, occupied, metrics);
        return StepOutcome::Moved;
    };

    robot.consecutive_wait_steps += 1;
    metrics.record_wait();
    debug!(
        "Robot {}: waiting for robot {} at {} ({} ticks)",
        robot.id, blocker, next, robot.consecutive_wait_steps
    );
    if robot.consecutive_wait_steps <= threshold {
        return StepOutcome::Waited;
    }

    // Route around the blocker and anything that is not going anywhere.
    let mut blocked = parked.clone();
    blocked.insert(next);
    if !replan(robot, grid, &blocked) {
        debug!("Robot {}: no detour around robot {}", robot.id, blocker);
        return StepOutcome::Stuck(blocker);
    }
    metrics.record_replan();
    info!("Robot {}: re-routed around robot {}", robot.id, blocker);
    if robot.next_step().is_some_and(|step| !occupied.contains_key(&step)) {
        move_robot(robot, occupied, metrics);
        return StepOutcome::Moved;
    }
    StepOutcome::Waited
}

fn move_robot(robot: &mut Robot, occupied: &mut HashMap<Coordinates, RobotId>, metrics: &mut MetricsCollector) {
    occupied.remove(&robot.location);
    if robot.advance().is_some() {
        metrics.record_move();
    }
    occupied.insert(robot.location, robot.id);
}

/// Recomputes the path to the current target. Keeps the old path on failure.
fn replan(robot: &mut Robot, grid: &Grid, blocked: &HashSet<Coordinates>) -> bool {
    let Some(target) = robot.current_target else {
        return false;
    };
    match find_path_avoiding(grid, robot.location, target, blocked) {
        Ok(path) => {
            robot.set_route(target, path);
            true
        }
        Err(NoPathFound) => false,
    }
}
