//! A* search over a [`Grid`].
//!
//! Movement is 4-connected with unit step cost and the heuristic is the
//! Manhattan distance, which is admissible and consistent here, so the first
//! time the goal is popped its path is optimal.
//!
//! Open-set ordering is fully deterministic: lowest `f`, then lowest `h`, then
//! lowest `(y, x)`. Identical inputs always produce the identical sequence.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use thiserror::Error;

use crate::map::{Coordinates, Grid};
use crate::robot::movement::passable_neighbors;

/// No route exists between the two cells. A normal outcome, not a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no path found")]
pub struct NoPathFound;

/// Steps from `start` to `end`, excluding `start` and including `end`.
pub type Path = Vec<Coordinates>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    f: usize,
    h: usize,
    at: Coordinates,
}

// Reversed so `BinaryHeap` pops the smallest key first.
impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.at.cmp(&self.at))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest orthogonal path from `start` to `end`.
///
/// Returns an empty path when `start == end` and [`NoPathFound`] when either
/// endpoint is out of bounds, on a wall, or disconnected.
pub fn find_path(grid: &Grid, start: Coordinates, end: Coordinates) -> Result<Path, NoPathFound> {
    find_path_avoiding(grid, start, end, &HashSet::new())
}

/// Like [`find_path`] but treats every cell in `blocked` as impassable.
///
/// `start` itself is never considered blocked. Used to route around a robot
/// that has been in the way for too long.
pub fn find_path_avoiding(
    grid: &Grid,
    start: Coordinates,
    end: Coordinates,
    blocked: &HashSet<Coordinates>,
) -> Result<Path, NoPathFound> {
    if !grid.is_passable(start) || !grid.is_passable(end) {
        return Err(NoPathFound);
    }
    if start == end {
        return Ok(Vec::new());
    }
    if blocked.contains(&end) {
        return Err(NoPathFound);
    }

    let mut open = BinaryHeap::new();
    let mut closed: HashSet<Coordinates> = HashSet::new();
    let mut g_score: HashMap<Coordinates, usize> = HashMap::new();
    let mut came_from: HashMap<Coordinates, Coordinates> = HashMap::new();

    let h = start.manhattan(&end);
    g_score.insert(start, 0);
    open.push(OpenNode { f: h, h, at: start });

    while let Some(current) = open.pop() {
        if current.at == end {
            return Ok(reconstruct(&came_from, start, end));
        }
        if !closed.insert(current.at) {
            continue;
        }

        let current_g = g_score.get(&current.at).copied().unwrap_or(usize::MAX);
        for neighbor in passable_neighbors(current.at, grid) {
            if closed.contains(&neighbor) || blocked.contains(&neighbor) {
                continue;
            }
            let tentative = current_g + 1;
            if tentative < g_score.get(&neighbor).copied().unwrap_or(usize::MAX) {
                came_from.insert(neighbor, current.at);
                g_score.insert(neighbor, tentative);
                let h = neighbor.manhattan(&end);
                open.push(OpenNode {
                    f: tentative + h,
                    h,
                    at: neighbor,
                });
            }
        }
    }

    Err(NoPathFound)
}

fn reconstruct(
    came_from: &HashMap<Coordinates, Coordinates>,
    start: Coordinates,
    end: Coordinates,
) -> Path {
    let mut path = vec![end];
    let mut current = end;
    while let Some(&parent) = came_from.get(&current) {
        if parent == start {
            break;
        }
        path.push(parent);
        current = parent;
    }
    path.reverse();
    path
}
