use crate::map::{Coordinates, Grid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn all() -> [Self; 4] {
        [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ]
    }
}

/// One step in `dir`, or `None` when it would leave the non-negative quadrant.
/// Upper bounds are the grid's business.
pub fn step(at: Coordinates, dir: Direction) -> Option<Coordinates> {
    match dir {
        Direction::Up => at.y.checked_sub(1).map(|y| Coordinates::new(at.x, y)),
        Direction::Down => Some(Coordinates::new(at.x, at.y + 1)),
        Direction::Left => at.x.checked_sub(1).map(|x| Coordinates::new(x, at.y)),
        Direction::Right => Some(Coordinates::new(at.x + 1, at.y)),
    }
}

/// Passable orthogonal neighbours, in `Direction::all()` order.
pub fn passable_neighbors(at: Coordinates, grid: &Grid) -> impl Iterator<Item = Coordinates> + '_ {
    Direction::all()
        .into_iter()
        .filter_map(move |dir| step(at, dir))
        .filter(move |next| grid.is_passable(*next))
}

pub fn is_valid_move(from: Coordinates, to: Coordinates, grid: &Grid) -> bool {
    from.is_adjacent(&to) && grid.is_passable(to)
}
