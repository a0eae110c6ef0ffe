use log::{debug, info};
use noise::{NoiseFn, Perlin};

use super::grid::{CellType, Coordinates, Grid};
use super::repository::GridRepository;
use crate::simulation::error::SimError;

/// Perlin values above this become walls.
const WALL_THRESHOLD: f64 = 0.25;
const NOISE_SCALE: f64 = 8.0;

/// Procedural grid source. The grid id is the decimal noise seed.
pub struct NoiseGridRepository {
    pub width: usize,
    pub height: usize,
    pub stations: usize,
}

impl NoiseGridRepository {
    pub fn new(width: usize, height: usize, stations: usize) -> Self {
        Self {
            width,
            height,
            stations,
        }
    }

    pub fn generate(&self, seed: u32) -> Result<Grid, SimError> {
        let perlin = Perlin::new(seed);
        let mut rows = vec![vec![CellType::Walkable; self.width]; self.height];

        for (y, row) in rows.iter_mut().enumerate() {
            for (x, cell) in row.iter_mut().enumerate() {
                let value = perlin.get([x as f64 / NOISE_SCALE, y as f64 / NOISE_SCALE]);
                if value > WALL_THRESHOLD {
                    *cell = CellType::Wall;
                }
            }
        }

        for anchor in self.station_anchors() {
            if let Some(at) = nearest_open_cell(&rows, anchor) {
                debug!("Charging station placed at {}", at);
                rows[at.y][at.x] = CellType::ChargingStation;
            }
        }

        info!(
            "Generated {}x{} grid from noise seed {}",
            self.width, self.height, seed
        );
        Grid::from_rows(rows)
    }

    /// Stations spread evenly along the horizontal midline.
    fn station_anchors(&self) -> Vec<Coordinates> {
        let y = self.height / 2;
        (0..self.stations)
            .map(|i| Coordinates::new((2 * i + 1) * self.width / (2 * self.stations.max(1)), y))
            .collect()
    }
}

impl GridRepository for NoiseGridRepository {
    fn fetch_grid(&self, id: &str) -> Result<Grid, SimError> {
        let seed = id
            .parse::<u32>()
            .map_err(|_| SimError::GridNotFound(id.to_string()))?;
        self.generate(seed)
    }
}

fn nearest_open_cell(rows: &[Vec<CellType>], anchor: Coordinates) -> Option<Coordinates> {
    rows.iter()
        .enumerate()
        .flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, cell)| **cell == CellType::Walkable)
                .map(move |(x, _)| Coordinates::new(x, y))
        })
        .min_by_key(|at| (at.manhattan(&anchor), *at))
}
