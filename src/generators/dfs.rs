use std::collections::VecDeque;

use rand::Rng;

use crate::{
    error::MazeError,
    generators::{GenerationEvent, MazeGenerator},
    maze::{Coord, Grid, WallSet},
};

/// Randomized depth-first search with an explicit backtracking stack.
pub struct DfsBacktracker<R> {
    grid: Grid,
    walls: WallSet,
    rng: R,
    /// Top of the stack is the current cell
    stack: Vec<Coord>,
    visited: usize,
    pending: VecDeque<GenerationEvent>,
}

impl<R: Rng> DfsBacktracker<R> {
    pub fn new(width: u16, height: u16, mut rng: R) -> Result<Self, MazeError> {
        let mut grid = Grid::new(width, height)?;
        let walls = WallSet::new(width, height)?;

        // Initialize the starting point
        let start: Coord = (rng.random_range(0..width), rng.random_range(0..height));
        grid[start].visited = true;

        Ok(DfsBacktracker {
            grid,
            walls,
            rng,
            stack: vec![start],
            visited: 1,
            pending: VecDeque::from([GenerationEvent::CellVisited(start)]),
        })
    }

    pub fn current(&self) -> Option<Coord> {
        self.stack.last().copied()
    }

    pub fn visited_count(&self) -> usize {
        self.visited
    }

    fn step(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        let Some(current) = self.current() else {
            unreachable!("the start cell stays on the stack until every cell is visited");
        };

        let neighbors = self
            .grid
            .neighbors(current)
            .iter()
            .filter(|&c| !self.grid[c].visited)
            .collect::<Vec<_>>();

        if neighbors.is_empty() {
            // Dead end: drop the current cell and resume from the one below it
            self.stack.pop();
            match self.current() {
                Some(previous) => {
                    self.pending.push_back(GenerationEvent::Backtrack(previous));
                }
                None => unreachable!("backtracked past the start cell with unvisited cells left"),
            }
            return true;
        }

        let next = neighbors[self.rng.random_range(0..neighbors.len())];
        self.walls.carve(current, next);
        self.grid[next].visited = true;
        self.visited += 1;
        self.stack.push(next);
        self.pending.push_back(GenerationEvent::WallOpened(current, next));
        self.pending.push_back(GenerationEvent::CellVisited(next));
        true
    }
}

impl<R: Rng> Iterator for DfsBacktracker<R> {
    type Item = GenerationEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if !self.step() {
                return None;
            }
        }
    }
}

impl<R: Rng> MazeGenerator for DfsBacktracker<R> {
    fn maze(&self) -> WallSet {
        self.walls.clone()
    }

    fn is_finished(&self) -> bool {
        self.visited == self.grid.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_each_cell_carved_once_from_visited_neighbor() {
        let mut dfs = DfsBacktracker::new(6, 5, StdRng::seed_from_u64(5)).unwrap();
        let mut visited = std::collections::HashSet::new();
        let mut carves = 0;
        let mut start = None;
        while let Some(event) = dfs.next() {
            match event {
                GenerationEvent::CellVisited(c) => {
                    assert!(visited.insert(c), "cell {:?} visited twice", c);
                    start.get_or_insert(c);
                }
                GenerationEvent::WallOpened(from, to) => {
                    assert!(visited.contains(&from));
                    assert!(!visited.contains(&to));
                    carves += 1;
                }
                GenerationEvent::Backtrack(c) => assert!(visited.contains(&c)),
                other => panic!("unexpected event {:?}", other),
            }
        }
        assert_eq!(visited.len(), 30);
        assert_eq!(carves, 29);
        assert!(dfs.is_finished());
        // The start cell is still at the bottom of the stack
        assert_eq!(dfs.stack.first().copied(), start);
        assert!(dfs.maze().is_perfect());
    }

    #[test]
    fn test_visited_count_reaches_total() {
        let mut dfs = DfsBacktracker::new(4, 4, StdRng::seed_from_u64(0)).unwrap();
        let mut last = dfs.visited_count();
        while dfs.next().is_some() {
            assert!(dfs.visited_count() >= last);
            last = dfs.visited_count();
        }
        assert_eq!(last, 16);
        assert!(dfs.current().is_some());
    }

    #[test]
    fn test_single_cell() {
        let mut dfs = DfsBacktracker::new(1, 1, StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(dfs.next(), Some(GenerationEvent::CellVisited((0, 0))));
        assert_eq!(dfs.next(), None);
        assert_eq!(dfs.maze().open_count(), 0);
    }
}
