use std::collections::VecDeque;
use std::fmt;

use super::config::{self, RobotProfile};
use crate::map::Coordinates;
use crate::simulation::error::SimError;
use crate::task::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RobotId(pub u32);

impl fmt::Display for RobotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RobotIcon {
    Rover,
    Drone,
    Hauler,
}

impl RobotIcon {
    pub fn profile(&self) -> RobotProfile {
        match self {
            RobotIcon::Rover => config::ROVER_PROFILE,
            RobotIcon::Drone => config::DRONE_PROFILE,
            RobotIcon::Hauler => config::HAULER_PROFILE,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            RobotIcon::Rover => 'R',
            RobotIcon::Drone => 'D',
            RobotIcon::Hauler => 'H',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RobotStatus {
    Idle,
    EnRouteToTask,
    PerformingTask,
    EnRouteToCharger,
    Charging,
}

impl RobotStatus {
    /// The complete transition table. Anything not listed here is rejected.
    pub fn can_transition_to(self, next: RobotStatus) -> bool {
        use RobotStatus::*;
        matches!(
            (self, next),
            (Idle, EnRouteToTask)
                | (Idle, EnRouteToCharger)
                | (EnRouteToTask, PerformingTask)
                | (PerformingTask, Idle)
                | (EnRouteToCharger, Charging)
                | (Charging, Idle)
        )
    }

    pub fn is_en_route(self) -> bool {
        matches!(self, RobotStatus::EnRouteToTask | RobotStatus::EnRouteToCharger)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Robot {
    pub id: RobotId,
    pub icon: RobotIcon,
    pub home: Coordinates,
    pub location: Coordinates,
    pub battery: u32,
    pub max_battery: u32,
    pub movement_cost: u32,
    pub status: RobotStatus,
    pub assigned_task: Option<TaskId>,
    pub current_target: Option<Coordinates>,
    pub current_path: VecDeque<Coordinates>,
    pub consecutive_wait_steps: u32,
}

impl Robot {
    pub fn new(id: RobotId, location: Coordinates, icon: RobotIcon) -> Self {
        let profile = icon.profile();
        Self {
            id,
            icon,
            home: location,
            location,
            battery: profile.max_battery,
            max_battery: profile.max_battery,
            movement_cost: profile.movement_cost,
            status: RobotStatus::Idle,
            assigned_task: None,
            current_target: None,
            current_path: VecDeque::new(),
            consecutive_wait_steps: 0,
        }
    }

    pub fn with_battery(mut self, battery: u32) -> Self {
        self.battery = battery.min(self.max_battery);
        self
    }

    /// Applies `next` if the transition table allows it.
    pub fn transition(&mut self, next: RobotStatus) -> Result<(), SimError> {
        if !self.status.can_transition_to(next) {
            return Err(SimError::InvalidRobotTransition {
                robot: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn battery_fraction(&self) -> f64 {
        if self.max_battery == 0 {
            return 0.0;
        }
        self.battery as f64 / self.max_battery as f64
    }

    pub fn needs_charge(&self, low_fraction: f64) -> bool {
        self.battery_fraction() < low_fraction
    }

    pub fn can_afford_step(&self) -> bool {
        self.battery >= self.movement_cost
    }

    pub fn drain(&mut self, amount: u32) {
        self.battery = self.battery.saturating_sub(amount);
    }

    /// Adds charge up to max. Returns true once full.
    pub fn charge(&mut self, rate: u32) -> bool {
        self.battery = self.battery.saturating_add(rate).min(self.max_battery);
        self.battery == self.max_battery
    }

    pub fn next_step(&self) -> Option<Coordinates> {
        self.current_path.front().copied()
    }

    /// Moves onto the next path cell and pays for it.
    pub fn advance(&mut self) -> Option<Coordinates> {
        let next = self.current_path.pop_front()?;
        self.location = next;
        self.drain(self.movement_cost);
        self.consecutive_wait_steps = 0;
        Some(next)
    }

    pub fn set_route(&mut self, target: Coordinates, path: Vec<Coordinates>) {
        self.current_target = Some(target);
        self.current_path = path.into();
        self.consecutive_wait_steps = 0;
    }

    pub fn clear_route(&mut self) {
        self.current_target = None;
        self.current_path.clear();
        self.consecutive_wait_steps = 0;
    }

    pub fn has_arrived(&self) -> bool {
        self.current_path.is_empty() && self.current_target == Some(self.location)
    }

    /// Back to placement-time values.
    pub fn reset(&mut self) {
        *self = Robot::new(self.id, self.home, self.icon);
    }
}
