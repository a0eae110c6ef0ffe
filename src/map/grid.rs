use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::simulation::error::SimError;

/// Grid-relative cell position. Ordered row-major: `y` first, then `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coordinates {
    pub x: usize,
    pub y: usize,
}

impl Coordinates {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn manhattan(&self, other: &Coordinates) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn is_adjacent(&self, other: &Coordinates) -> bool {
        self.manhattan(other) == 1
    }
}

impl Ord for Coordinates {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Coordinates {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    Walkable,
    Wall,
    ChargingStation,
}

impl CellType {
    pub fn is_passable(&self) -> bool {
        !matches!(self, CellType::Wall)
    }

    pub fn symbol(&self) -> char {
        match self {
            CellType::Walkable => '.',
            CellType::Wall => '#',
            CellType::ChargingStation => 'C',
        }
    }

    fn from_symbol(c: char) -> Option<Self> {
        match c {
            '.' => Some(CellType::Walkable),
            '#' => Some(CellType::Wall),
            'C' => Some(CellType::ChargingStation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub cell_type: CellType,
    pub coordinates: Coordinates,
}

/// Rectangular cell matrix. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Builds a grid from row-major cell types. Every row must have the same width.
    pub fn from_rows(rows: Vec<Vec<CellType>>) -> Result<Self, SimError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if width == 0 {
            return Err(SimError::GridParse("grid has no cells".to_string()));
        }

        let mut cells = Vec::with_capacity(width * height);
        for (y, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(SimError::GridParse(format!(
                    "row {} has width {}, expected {}",
                    y,
                    row.len(),
                    width
                )));
            }
            cells.extend(row.into_iter().enumerate().map(|(x, cell_type)| Cell {
                cell_type,
                coordinates: Coordinates::new(x, y),
            }));
        }

        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// An all-walkable grid.
    pub fn open(width: usize, height: usize) -> Result<Self, SimError> {
        Self::from_rows(vec![vec![CellType::Walkable; width]; height])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, at: Coordinates) -> bool {
        at.x < self.width && at.y < self.height
    }

    pub fn cell(&self, at: Coordinates) -> Option<&Cell> {
        if self.in_bounds(at) {
            self.cells.get(at.y * self.width + at.x)
        } else {
            None
        }
    }

    pub fn cell_type(&self, at: Coordinates) -> Option<CellType> {
        self.cell(at).map(|cell| cell.cell_type)
    }

    /// Walkable or charging station.
    pub fn is_passable(&self, at: Coordinates) -> bool {
        self.cell_type(at).is_some_and(|t| t.is_passable())
    }

    pub fn is_walkable(&self, at: Coordinates) -> bool {
        self.cell_type(at) == Some(CellType::Walkable)
    }

    pub fn is_charging_station(&self, at: Coordinates) -> bool {
        self.cell_type(at) == Some(CellType::ChargingStation)
    }

    /// Charging stations in row-major order.
    pub fn charging_stations(&self) -> impl Iterator<Item = Coordinates> + '_ {
        self.cells
            .iter()
            .filter(|cell| cell.cell_type == CellType::ChargingStation)
            .map(|cell| cell.coordinates)
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }
}

impl FromStr for Grid {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(y, line)| {
                line.chars()
                    .enumerate()
                    .map(|(x, c)| {
                        CellType::from_symbol(c).ok_or_else(|| {
                            SimError::GridParse(format!("unknown cell '{}' at ({}, {})", c, x, y))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Grid::from_rows(rows)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.width) {
            for cell in row {
                write!(f, "{}", cell.cell_type.symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_round_trip_text() {
        let text = "..#\nC..\n";
        let grid: Grid = text.parse().unwrap();
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.to_string(), text);
    }

    #[test]
    fn test_cell_lookup_and_bounds() {
        let grid: Grid = "..#\nC..".parse().unwrap();
        assert_eq!(grid.cell_type(Coordinates::new(2, 0)), Some(CellType::Wall));
        assert!(grid.is_charging_station(Coordinates::new(0, 1)));
        assert!(grid.is_passable(Coordinates::new(0, 1)));
        assert!(!grid.is_walkable(Coordinates::new(0, 1)));
        assert_eq!(grid.cell_type(Coordinates::new(3, 0)), None);
        assert!(!grid.is_passable(Coordinates::new(0, 5)));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result: Result<Grid, _> = "...\n..".parse();
        assert!(matches!(result, Err(SimError::GridParse(_))));
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        let result: Result<Grid, _> = ".x.".parse();
        assert!(matches!(result, Err(SimError::GridParse(_))));
    }

    #[test]
    fn test_coordinates_order_row_major() {
        let a = Coordinates::new(5, 0);
        let b = Coordinates::new(0, 1);
        assert!(a < b);
        assert!(Coordinates::new(1, 1) > Coordinates::new(0, 1));
    }

    #[test]
    fn test_charging_stations_row_major() {
        let grid: Grid = ".C\nC.".parse().unwrap();
        let stations: Vec<_> = grid.charging_stations().collect();
        assert_eq!(
            stations,
            vec![Coordinates::new(1, 0), Coordinates::new(0, 1)]
        );
    }
}
