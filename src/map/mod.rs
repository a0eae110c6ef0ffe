pub mod grid;
pub mod noise;
pub mod repository;

pub use grid::{Cell, CellType, Coordinates, Grid};
pub use repository::{GridRepository, InMemoryGridRepository};
