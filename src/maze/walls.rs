use std::collections::VecDeque;

use crate::error::MazeError;

use super::{Coord, Direction};

/// Which stored wall a pair of adjacent cells maps to.
#[derive(Clone, Copy)]
enum Slot {
    /// Wall on the east side of the cell at this index
    East(usize),
    /// Wall on the south side of the cell at this index
    South(usize),
}

/// Open/closed state for every wall between two 4-adjacent cells.
///
/// Each wall is stored once, on the west or north cell of the pair, so the
/// pair is effectively unordered. All walls start closed and can only be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallSet {
    east: Box<[bool]>,
    south: Box<[bool]>,
    width: u16,
    height: u16,
    open_count: usize,
}

impl WallSet {
    pub fn new(width: u16, height: u16) -> Result<Self, MazeError> {
        if width == 0 || height == 0 {
            return Err(MazeError::InvalidDimensions { width, height });
        }
        let len = width as usize * height as usize;
        Ok(WallSet {
            east: vec![false; len].into_boxed_slice(),
            south: vec![false; len].into_boxed_slice(),
            width,
            height,
            open_count: 0,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Number of cells in the maze.
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Number of walls opened so far.
    pub fn open_count(&self) -> usize {
        self.open_count
    }

    fn contains(&self, coord: Coord) -> bool {
        coord.0 < self.width && coord.1 < self.height
    }

    fn ravel_index(&self, coord: Coord) -> usize {
        coord.1 as usize * self.width as usize + coord.0 as usize
    }

    fn slot(&self, a: Coord, b: Coord) -> Option<Slot> {
        if !self.contains(a) || !self.contains(b) {
            return None;
        }
        match Direction::between(a, b)? {
            Direction::East => Some(Slot::East(self.ravel_index(a))),
            Direction::West => Some(Slot::East(self.ravel_index(b))),
            Direction::South => Some(Slot::South(self.ravel_index(a))),
            Direction::North => Some(Slot::South(self.ravel_index(b))),
        }
    }

    /// Opens the wall between two adjacent cells.
    ///
    /// # Returns
    /// `true` if the wall was closed and is now open, `false` if it was already open
    ///
    /// # Panics
    /// If `a` and `b` are not 4-adjacent cells of this maze. Generators only ever
    /// carve between neighbors, so this signals a bug in the caller.
    pub fn carve(&mut self, a: Coord, b: Coord) -> bool {
        let slot = match self.slot(a, b) {
            Some(slot) => slot,
            None => panic!("{}", MazeError::NotAdjacent { a, b }),
        };
        let opened = match slot {
            Slot::East(idx) => !std::mem::replace(&mut self.east[idx], true),
            Slot::South(idx) => !std::mem::replace(&mut self.south[idx], true),
        };
        if opened {
            self.open_count += 1;
        }
        opened
    }

    /// Whether the wall between `a` and `b` is open.
    pub fn is_open(&self, a: Coord, b: Coord) -> Result<bool, MazeError> {
        match self.slot(a, b) {
            Some(Slot::East(idx)) => Ok(self.east[idx]),
            Some(Slot::South(idx)) => Ok(self.south[idx]),
            None => Err(MazeError::NotAdjacent { a, b }),
        }
    }

    /// Cells reachable from `coord` through one open wall.
    pub fn open_neighbors(&self, coord: Coord) -> impl Iterator<Item = Coord> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |dir| dir.step(coord))
            .filter(move |&n| matches!(self.is_open(coord, n), Ok(true)))
    }

    /// Every open wall as a `(west-or-north cell, east-or-south cell)` pair, row-major.
    pub fn open_walls(&self) -> impl Iterator<Item = (Coord, Coord)> + '_ {
        let width = self.width;
        (0..self.cell_count()).flat_map(move |idx| {
            let coord = ((idx % width as usize) as u16, (idx / width as usize) as u16);
            let east = self.east[idx].then(|| (coord, (coord.0 + 1, coord.1)));
            let south = self.south[idx].then(|| (coord, (coord.0, coord.1 + 1)));
            east.into_iter().chain(south)
        })
    }

    /// Whether every cell can be reached from `(0, 0)` through open walls.
    pub fn is_connected(&self) -> bool {
        let mut seen = vec![false; self.cell_count()];
        let mut queue = VecDeque::from([(0u16, 0u16)]);
        seen[0] = true;
        let mut reached = 1;
        while let Some(coord) = queue.pop_front() {
            for next in self.open_neighbors(coord) {
                let idx = self.ravel_index(next);
                if !seen[idx] {
                    seen[idx] = true;
                    reached += 1;
                    queue.push_back(next);
                }
            }
        }
        reached == self.cell_count()
    }

    /// Connected with exactly `cells - 1` open walls, i.e. a spanning tree.
    pub fn is_perfect(&self) -> bool {
        self.open_count == self.cell_count() - 1 && self.is_connected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walls_start_closed() {
        let walls = WallSet::new(3, 3).unwrap();
        assert_eq!(walls.open_count(), 0);
        assert_eq!(walls.is_open((0, 0), (1, 0)), Ok(false));
        assert_eq!(walls.is_open((1, 1), (1, 2)), Ok(false));
        assert!(!walls.is_connected());
    }

    #[test]
    fn test_carve_is_unordered_and_idempotent() {
        let mut walls = WallSet::new(3, 3).unwrap();
        assert!(walls.carve((1, 1), (0, 1)));
        assert_eq!(walls.is_open((0, 1), (1, 1)), Ok(true));
        assert_eq!(walls.is_open((1, 1), (0, 1)), Ok(true));
        // Carving the same wall again does not count twice
        assert!(!walls.carve((0, 1), (1, 1)));
        assert_eq!(walls.open_count(), 1);
    }

    #[test]
    fn test_query_not_adjacent() {
        let walls = WallSet::new(3, 3).unwrap();
        assert_eq!(
            walls.is_open((0, 0), (1, 1)),
            Err(MazeError::NotAdjacent {
                a: (0, 0),
                b: (1, 1)
            })
        );
        assert!(walls.is_open((2, 0), (3, 0)).is_err());
        assert!(walls.is_open((1, 1), (1, 1)).is_err());
    }

    #[test]
    #[should_panic(expected = "not adjacent")]
    fn test_carve_not_adjacent_panics() {
        let mut walls = WallSet::new(3, 3).unwrap();
        walls.carve((0, 0), (2, 0));
    }

    #[test]
    fn test_perfect_corridor() {
        let mut walls = WallSet::new(3, 2).unwrap();
        walls.carve((0, 0), (1, 0));
        walls.carve((1, 0), (2, 0));
        walls.carve((2, 0), (2, 1));
        walls.carve((2, 1), (1, 1));
        assert!(!walls.is_perfect());
        walls.carve((1, 1), (0, 1));
        assert!(walls.is_perfect());
        // A cycle breaks the edge count
        walls.carve((0, 0), (0, 1));
        assert!(walls.is_connected());
        assert!(!walls.is_perfect());
        assert_eq!(walls.open_walls().count(), 6);
    }

    #[test]
    fn test_single_cell_is_perfect() {
        let walls = WallSet::new(1, 1).unwrap();
        assert!(walls.is_perfect());
    }
}
