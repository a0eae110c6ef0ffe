use log::{info, warn};
use std::sync::mpsc::{channel, Receiver, Sender};

use crate::simulation::{RunMetrics, RunRecord, Snapshot};

/// What the engine's driver publishes to whoever is watching the run.
#[derive(Debug, Clone)]
pub enum SimulationEvent {
    Snapshot(Snapshot),
    Finished {
        snapshot: Snapshot,
        metrics: RunMetrics,
    },
}

/// Consumer of settled snapshots. Only ever fed between ticks.
pub trait BroadcastSink {
    fn publish_snapshot(&mut self, snapshot: &Snapshot);
    fn publish_metrics(&mut self, snapshot: &Snapshot, metrics: &RunMetrics);
}

/// Broadcasts over an mpsc channel.
pub struct ChannelSink {
    sender: Sender<SimulationEvent>,
}

impl ChannelSink {
    pub fn new(sender: Sender<SimulationEvent>) -> Self {
        Self { sender }
    }
}

impl BroadcastSink for ChannelSink {
    fn publish_snapshot(&mut self, snapshot: &Snapshot) {
        if let Err(e) = self.sender.send(SimulationEvent::Snapshot(snapshot.clone())) {
            warn!("Broadcast: snapshot for tick {} dropped: {}", snapshot.clock, e);
        }
    }

    fn publish_metrics(&mut self, snapshot: &Snapshot, metrics: &RunMetrics) {
        let event = SimulationEvent::Finished {
            snapshot: snapshot.clone(),
            metrics: metrics.clone(),
        };
        if let Err(e) = self.sender.send(event) {
            warn!("Broadcast: final metrics dropped: {}", e);
        }
    }
}

/// Creates the channel between the engine driver and its watchers.
pub fn create_channel() -> (ChannelSink, Receiver<SimulationEvent>) {
    let (sender, receiver) = channel();
    (ChannelSink::new(sender), receiver)
}

/// Stores finished-run records.
pub trait PersistenceSink {
    fn store(&mut self, record: RunRecord);
}

/// Keeps past runs in memory, newest last.
#[derive(Debug, Default)]
pub struct RunHistory {
    records: Vec<RunRecord>,
}

impl RunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    pub fn latest(&self) -> Option<&RunRecord> {
        self.records.last()
    }
}

impl PersistenceSink for RunHistory {
    fn store(&mut self, record: RunRecord) {
        info!(
            "Run on grid '{}' ({}) stored: {} ticks, {} recharges",
            record.grid_id, record.strategy, record.total_time, record.total_recharges
        );
        self.records.push(record);
    }
}
