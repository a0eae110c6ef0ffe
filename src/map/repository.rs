use std::collections::HashMap;

use super::grid::Grid;
use crate::simulation::error::SimError;

/// Source of grids for a run. Storage format is up to the implementor.
pub trait GridRepository {
    fn fetch_grid(&self, id: &str) -> Result<Grid, SimError>;
}

pub struct InMemoryGridRepository {
    grids: HashMap<String, Grid>,
}

impl InMemoryGridRepository {
    pub fn new() -> Self {
        Self {
            grids: HashMap::new(),
        }
    }

    pub fn insert(&mut self, id: impl Into<String>, grid: Grid) {
        self.grids.insert(id.into(), grid);
    }
}

impl Default for InMemoryGridRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl GridRepository for InMemoryGridRepository {
    fn fetch_grid(&self, id: &str) -> Result<Grid, SimError> {
        self.grids
            .get(id)
            .cloned()
            .ok_or_else(|| SimError::GridNotFound(id.to_string()))
    }
}
