pub mod engine;
pub mod error;
pub mod metrics;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use engine::{EngineStatus, SimulationEngine, SimulationState};
pub use error::SimError;
pub use metrics::{MetricsCollector, RunMetrics, RunRecord};
pub use snapshot::{InvariantViolation, Snapshot};
