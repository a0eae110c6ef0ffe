use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::mpsc::Receiver;
use std::time::Instant;

use crate::assignment::Strategy;
use crate::communication::channels::{
    create_channel, BroadcastSink, ChannelSink, PersistenceSink, RunHistory, SimulationEvent,
};
use crate::map::noise::NoiseGridRepository;
use crate::map::{Coordinates, Grid};
use crate::robot::RobotIcon;
use crate::simulation::{EngineStatus, RunMetrics, SimError, SimulationEngine, Snapshot};

const CHARGING_STATIONS: usize = 3;
const PLACEMENT_ATTEMPTS: usize = 1000;
const ICONS: [RobotIcon; 3] = [RobotIcon::Rover, RobotIcon::Drone, RobotIcon::Hauler];

/// Terminal driver state: owns the engine and decides when to tick it.
pub struct App {
    pub engine: SimulationEngine,
    sink: ChannelSink,
    events: Receiver<SimulationEvent>,
    pub view: Snapshot,
    pub final_metrics: Option<RunMetrics>,
    pub history: RunHistory,
    last_tick: Instant,
}

impl App {
    /// Generates the grid from `map_seed`, scatters robots and tasks using
    /// `placement_seed`, and leaves the engine ready to start.
    pub fn new(
        width: usize,
        height: usize,
        map_seed: u32,
        placement_seed: u64,
        robots: usize,
        tasks: usize,
    ) -> Result<Self, SimError> {
        let repository = NoiseGridRepository::new(width, height, CHARGING_STATIONS);
        let mut engine = SimulationEngine::default();
        engine.load_grid_from(&repository, &map_seed.to_string())?;
        engine.set_strategy(Strategy::Nearest)?;

        let mut rng = StdRng::seed_from_u64(placement_seed);
        let mut taken = Vec::new();
        for i in 0..robots {
            match place(&mut rng, &engine, &taken, |grid, at| grid.is_passable(at)) {
                Some(at) => {
                    engine.add_robot(at, ICONS[i % ICONS.len()])?;
                    taken.push(at);
                }
                None => warn!("No free cell left for robot {}", i),
            }
        }
        for i in 0..tasks {
            match place(&mut rng, &engine, &taken, |grid, at| grid.is_walkable(at)) {
                Some(at) => {
                    engine.add_task(at)?;
                    taken.push(at);
                }
                None => warn!("No free cell left for task {}", i),
            }
        }

        let (sink, events) = create_channel();
        let view = engine.snapshot();
        Ok(Self {
            engine,
            sink,
            events,
            view,
            final_metrics: None,
            history: RunHistory::new(),
            last_tick: Instant::now(),
        })
    }

    /// Ticks the engine if its cadence says so, then folds broadcast events into the view.
    pub fn update(&mut self) {
        if self.engine.status() == EngineStatus::Running
            && self.last_tick.elapsed() >= self.engine.tick_interval()
        {
            self.last_tick = Instant::now();
            match self.engine.tick() {
                Ok(EngineStatus::Ended) => self.finish(),
                Ok(_) => self.sink.publish_snapshot(&self.engine.snapshot()),
                Err(e) => warn!("Tick skipped: {}", e),
            }
        }

        while let Ok(event) = self.events.try_recv() {
            match event {
                SimulationEvent::Snapshot(snapshot) => self.view = snapshot,
                SimulationEvent::Finished { snapshot, metrics } => {
                    self.view = snapshot;
                    self.final_metrics = Some(metrics);
                }
            }
        }
    }

    fn finish(&mut self) {
        let snapshot = self.engine.snapshot();
        if let Some(metrics) = self.engine.metrics() {
            self.sink.publish_metrics(&snapshot, metrics);
        }
        if let Some(record) = self.engine.run_record() {
            self.history.store(record);
        }
    }

    /// Space bar: start, pause or resume depending on where the run is.
    pub fn toggle_run(&mut self) {
        let result = match self.engine.status() {
            EngineStatus::Idle => self.engine.start(),
            EngineStatus::Running => self.engine.pause(),
            EngineStatus::Paused => self.engine.resume(),
            EngineStatus::Ended => Ok(()),
        };
        if let Err(e) = result {
            warn!("{}", e);
        }
        self.refresh_view();
    }

    pub fn reset(&mut self) {
        self.engine.reset();
        self.final_metrics = None;
        self.refresh_view();
    }

    pub fn faster(&mut self) {
        self.change_speed(2.0);
    }

    pub fn slower(&mut self) {
        self.change_speed(0.5);
    }

    fn change_speed(&mut self, factor: f64) {
        let speed = self.engine.speed() * factor;
        match self.engine.set_speed(speed) {
            Ok(()) => info!("Speed x{}", speed),
            Err(e) => warn!("{}", e),
        }
    }

    /// Swaps strategies between runs.
    pub fn cycle_strategy(&mut self) {
        let next = match self.engine.strategy() {
            Some(Strategy::Nearest) => Strategy::RoundRobin,
            _ => Strategy::Nearest,
        };
        if let Err(e) = self.engine.set_strategy(next) {
            warn!("{}", e);
        }
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.engine.grid()
    }

    fn refresh_view(&mut self) {
        let snapshot = self.engine.snapshot();
        self.sink.publish_snapshot(&snapshot);
    }
}

fn place<F>(
    rng: &mut StdRng,
    engine: &SimulationEngine,
    taken: &[Coordinates],
    accept: F,
) -> Option<Coordinates>
where
    F: Fn(&Grid, Coordinates) -> bool,
{
    let grid = engine.grid()?;
    (0..PLACEMENT_ATTEMPTS)
        .map(|_| {
            Coordinates::new(
                rng.random_range(0..grid.width()),
                rng.random_range(0..grid.height()),
            )
        })
        .find(|at| accept(grid, *at) && !taken.contains(at))
}
