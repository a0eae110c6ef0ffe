use std::time::Duration;

use crate::task::TaskSpec;

/// Idle robots below this share of max battery go looking for a charger.
pub const LOW_BATTERY_FRACTION: f64 = 0.20;
/// Battery restored per tick while charging.
pub const CHARGE_RATE_PER_TICK: u32 = 10;
/// Consecutive collision waits tolerated before re-pathing.
pub const DEADLOCK_WAIT_THRESHOLD: u32 = 3;

pub const DEFAULT_TASK_WORK_DURATION: u32 = 5;
pub const DEFAULT_TASK_BATTERY_COST: u32 = 5;

/// Driver cadence at speed factor 1.0.
pub const BASE_TICK_INTERVAL: Duration = Duration::from_millis(200);
pub const MIN_SPEED: f64 = 0.25;
pub const MAX_SPEED: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobotProfile {
    pub max_battery: u32,
    pub movement_cost: u32,
}

pub const ROVER_PROFILE: RobotProfile = RobotProfile {
    max_battery: 100,
    movement_cost: 1,
};

pub const DRONE_PROFILE: RobotProfile = RobotProfile {
    max_battery: 60,
    movement_cost: 1,
};

pub const HAULER_PROFILE: RobotProfile = RobotProfile {
    max_battery: 200,
    movement_cost: 2,
};

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub low_battery_fraction: f64,
    pub charge_rate: u32,
    pub deadlock_threshold: u32,
    pub default_task: TaskSpec,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            low_battery_fraction: LOW_BATTERY_FRACTION,
            charge_rate: CHARGE_RATE_PER_TICK,
            deadlock_threshold: DEADLOCK_WAIT_THRESHOLD,
            default_task: TaskSpec {
                work_duration: DEFAULT_TASK_WORK_DURATION,
                battery_cost: DEFAULT_TASK_BATTERY_COST,
            },
        }
    }
}
