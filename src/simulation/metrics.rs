use chrono::{DateTime, Utc};

use crate::assignment::Strategy;
use crate::task::TaskId;

/// Counters accumulated while a run is in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsCollector {
    recharges: u32,
    tasks_completed: u32,
    cells_moved: u64,
    collision_waits: u64,
    replans: u32,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts an `idle -> en_route_to_charger` transition.
    pub fn record_recharge(&mut self) {
        self.recharges += 1;
    }

    pub fn record_completion(&mut self) {
        self.tasks_completed += 1;
    }

    pub fn record_move(&mut self) {
        self.cells_moved += 1;
    }

    pub fn record_wait(&mut self) {
        self.collision_waits += 1;
    }

    pub fn record_replan(&mut self) {
        self.replans += 1;
    }

    pub fn recharges(&self) -> u32 {
        self.recharges
    }

    pub fn tasks_completed(&self) -> u32 {
        self.tasks_completed
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn finalize(&self, clock: u64, unassignable_tasks: Vec<TaskId>) -> RunMetrics {
        RunMetrics {
            total_time: clock,
            total_recharges: self.recharges,
            tasks_completed: self.tasks_completed,
            unassignable_tasks,
            cells_moved: self.cells_moved,
            collision_waits: self.collision_waits,
            replans: self.replans,
        }
    }
}

/// Statistics for a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMetrics {
    pub total_time: u64,
    pub total_recharges: u32,
    pub tasks_completed: u32,
    pub unassignable_tasks: Vec<TaskId>,
    pub cells_moved: u64,
    pub collision_waits: u64,
    pub replans: u32,
}

/// What a persistence sink stores once a run ends.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub grid_id: String,
    pub strategy: Strategy,
    pub total_time: u64,
    pub total_recharges: u32,
    pub robot_count: usize,
    pub task_count: usize,
    pub timestamp: DateTime<Utc>,
}

impl RunRecord {
    pub fn new(
        grid_id: impl Into<String>,
        strategy: Strategy,
        metrics: &RunMetrics,
        robot_count: usize,
        task_count: usize,
    ) -> Self {
        Self {
            grid_id: grid_id.into(),
            strategy,
            total_time: metrics.total_time,
            total_recharges: metrics.total_recharges,
            robot_count,
            task_count,
            timestamp: Utc::now(),
        }
    }
}
