use std::collections::VecDeque;

use rand::Rng;

use crate::{
    error::MazeError,
    generators::{GenerationEvent, MazeGenerator},
    maze::{Coord, Direction, Grid, WallSet},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellState {
    Unvisited,
    /// Part of the current walk, at this index of the path
    InPath(usize),
    InMaze,
}

/// Wilson's algorithm: loop-erased random walks from unvisited cells until they
/// hit the maze, each completed walk being committed as a branch of the tree.
///
/// Samples uniformly among all spanning trees of the grid.
pub struct WilsonWalker<R> {
    grid: Grid,
    walls: WallSet,
    rng: R,
    states: Box<[CellState]>,
    /// Cells not yet in the maze, in no particular order
    unvisited: Vec<Coord>,
    /// Position of each cell inside `unvisited`, by linear index
    unvisited_pos: Box<[Option<usize>]>,
    /// The current walk. Never holds the same cell twice.
    path: Vec<Coord>,
    /// `directions[i]` points from `path[i]` to its successor
    directions: Vec<Direction>,
    maze_size: usize,
    pending: VecDeque<GenerationEvent>,
}

impl<R: Rng> WilsonWalker<R> {
    pub fn new(width: u16, height: u16, mut rng: R) -> Result<Self, MazeError> {
        let grid = Grid::new(width, height)?;
        let walls = WallSet::new(width, height)?;
        let unvisited = grid.coords().collect::<Vec<_>>();
        let unvisited_pos = (0..unvisited.len())
            .map(Some)
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let states = vec![CellState::Unvisited; grid.len()].into_boxed_slice();
        let seed = unvisited[rng.random_range(0..unvisited.len())];

        let mut walker = WilsonWalker {
            grid,
            walls,
            rng,
            states,
            unvisited,
            unvisited_pos,
            path: Vec::new(),
            directions: Vec::new(),
            maze_size: 0,
            pending: VecDeque::new(),
        };
        walker.add_to_maze(seed);
        Ok(walker)
    }

    /// The walk in progress, from its start cell to its current tail.
    pub fn path(&self) -> &[Coord] {
        &self.path
    }

    /// Direction recorded on each path cell toward its successor.
    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    /// Number of cells committed to the maze.
    pub fn maze_size(&self) -> usize {
        self.maze_size
    }

    fn state(&self, coord: Coord) -> CellState {
        self.states[self.grid.index_of(coord)]
    }

    fn set_state(&mut self, coord: Coord, state: CellState) {
        let idx = self.grid.index_of(coord);
        self.states[idx] = state;
    }

    fn add_to_maze(&mut self, coord: Coord) {
        let idx = self.grid.index_of(coord);
        if let Some(pos) = self.unvisited_pos[idx].take() {
            self.unvisited.swap_remove(pos);
            // The former last element now sits at `pos`
            if let Some(&moved) = self.unvisited.get(pos) {
                let moved_idx = self.grid.index_of(moved);
                self.unvisited_pos[moved_idx] = Some(pos);
            }
        }
        self.states[idx] = CellState::InMaze;
        self.maze_size += 1;
        self.pending.push_back(GenerationEvent::CellVisited(coord));
    }

    fn start_walk(&mut self) {
        let start = self.unvisited[self.rng.random_range(0..self.unvisited.len())];
        self.path.push(start);
        self.set_state(start, CellState::InPath(0));
        self.pending.push_back(GenerationEvent::WalkStarted(start));
    }

    /// Drops every path entry from `from_index` on, returning those cells to unvisited.
    fn erase_from(&mut self, from_index: usize) {
        let erased = self.path.split_off(from_index);
        for coord in &erased {
            self.set_state(*coord, CellState::Unvisited);
        }
        self.directions.truncate(from_index.saturating_sub(1));
        tracing::trace!("[wilson] erased loop of {} cells", erased.len());
        self.pending.push_back(GenerationEvent::PathErased { from_index });
    }

    /// Carves the whole walk into the maze along the recorded directions.
    /// `landing` is the maze cell the walk reached.
    fn commit(&mut self, landing: Coord) {
        let path = std::mem::take(&mut self.path);
        let directions = std::mem::take(&mut self.directions);
        debug_assert_eq!(path.len(), directions.len());
        let mut successor = None;
        for (&cell, &direction) in path.iter().zip(&directions) {
            let Some(next) = direction.step(cell) else {
                unreachable!("walk directions only point at grid neighbors");
            };
            self.walls.carve(cell, next);
            self.pending.push_back(GenerationEvent::WallOpened(cell, next));
            self.add_to_maze(cell);
            successor = Some(next);
        }
        debug_assert_eq!(successor, Some(landing));
        tracing::debug!(
            "[wilson] committed walk of {} cells, {} left unvisited",
            path.len(),
            self.unvisited.len()
        );
    }

    fn step(&mut self) -> bool {
        let Some(&tail) = self.path.last() else {
            // Nothing left to walk from: the maze is complete
            if self.unvisited.is_empty() {
                return false;
            }
            self.start_walk();
            return true;
        };

        let neighbors = *self.grid.neighbors(tail);
        let Some(next) = neighbors.get(self.rng.random_range(0..neighbors.len())) else {
            unreachable!("a walk only starts on grids with more than one cell");
        };
        let Some(direction) = Direction::between(tail, next) else {
            unreachable!("grid adjacency only holds 4-neighbors");
        };

        match self.state(next) {
            CellState::InPath(index) => self.erase_from(index + 1),
            CellState::InMaze => {
                self.directions.push(direction);
                self.pending.push_back(GenerationEvent::PathStep(tail, direction));
                self.commit(next);
            }
            CellState::Unvisited => {
                self.directions.push(direction);
                self.path.push(next);
                self.set_state(next, CellState::InPath(self.path.len() - 1));
                self.pending.push_back(GenerationEvent::PathStep(tail, direction));
            }
        }
        true
    }
}

impl<R: Rng> Iterator for WilsonWalker<R> {
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

impl<R: Rng> MazeGenerator for WilsonWalker<R> {
    fn maze(&self) -> WallSet {
        self.walls.clone()
    }

    fn is_finished(&self) -> bool {
        self.unvisited.is_empty() && self.path.is_empty()
    }
}
