use crossterm::style::{Color, Stylize};

use std::fmt;

use crate::{
    generators::{GenerationEvent, Generator},
    maze::{Coord, Orientation},
};

/// Represents a cell in the canvas, which can be either a path or a wall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridCell {
    Path(PathType),
    Wall,
}

impl GridCell {
    pub const EMPTY: GridCell = GridCell::Path(PathType::Empty);
    pub const WALL: GridCell = GridCell::Wall;
    pub const VISITED: GridCell = GridCell::Path(PathType::Visited);
    pub const CURRENT: GridCell = GridCell::Path(PathType::Current);
    pub const BACKTRACKED: GridCell = GridCell::Path(PathType::Backtracked);
    pub const WALK: GridCell = GridCell::Path(PathType::Walk);
    pub const RUN: GridCell = GridCell::Path(PathType::Run);
    /// The width of each cell when rendered, in character widths.
    pub const CELL_WIDTH: u16 = 2;
}

/// Represents different types of path cells in the canvas.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub enum PathType {
    /// Not yet part of the maze
    #[default]
    Empty,
    /// Part of the maze
    Visited,
    /// Head of the depth-first walk
    Current,
    /// Popped off the depth-first stack
    Backtracked,
    /// On the in-progress loop-erased walk
    Walk,
    /// Member of the open Sidewinder run
    Run,
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let styled_symbol = match self {
            GridCell::Path(path) => match path {
                PathType::Empty => "  ".with(Color::Reset),
                PathType::Visited => "░░".with(Color::DarkBlue),
                PathType::Current => "██".with(Color::Green),
                PathType::Backtracked => "░░".with(Color::Blue),
                PathType::Walk => "▓▓".with(Color::Yellow),
                PathType::Run => "▓▓".with(Color::Magenta),
            },
            GridCell::Wall => "██".with(Color::White),
        };

        #[cfg(debug_assertions)]
        {
            use unicode_width::UnicodeWidthStr;
            assert_eq!(
                styled_symbol.content().width(),
                GridCell::CELL_WIDTH as usize,
                "Each cell must occupy exactly two character widths."
            );
        }

        write!(f, "{}", styled_symbol)
    }
}

/// Terminal picture of a maze: `2w+1 x 2h+1` tiles, cells at odd coordinates
/// and walls in between.
pub struct Canvas {
    data: Box<[GridCell]>,
    width: u16,
    height: u16,
    /// Tiles changed since the last call to `take_changes`
    changes: Vec<(u16, u16)>,
    /// Current depth-first head
    head: Option<Coord>,
    /// Shadow of the loop-erased walk
    walk: Vec<Coord>,
}

impl Canvas {
    /// Builds the starting picture for the given algorithm: a fully walled grid,
    /// or an open area for recursive division, which draws its own walls.
    pub fn new(generator: Generator, maze_width: u16, maze_height: u16) -> Self {
        // n cells in each dimension -> n + 1 walls -> 2n + 1 total
        let width = maze_width * 2 + 1;
        let height = maze_height * 2 + 1;
        let walled = generator != Generator::RecurDiv;
        let data = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| match (x % 2, y % 2) {
                (1, 1) => GridCell::EMPTY,
                _ if walled => GridCell::WALL,
                _ => GridCell::EMPTY,
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Canvas {
            data,
            width,
            height,
            changes: Vec::new(),
            head: None,
            walk: Vec::new(),
        }
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    fn ravel_index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn cell_tile(coord: Coord) -> (u16, u16) {
        (coord.0 * 2 + 1, coord.1 * 2 + 1)
    }

    fn wall_tile(a: Coord, b: Coord) -> (u16, u16) {
        (a.0 + b.0 + 1, a.1 + b.1 + 1)
    }

    /// Tile of a unit wall segment; horizontal segments sit above row `y`,
    /// vertical ones left of column `x`.
    fn segment_tile(x: u16, y: u16, orientation: Orientation) -> (u16, u16) {
        match orientation {
            Orientation::Horizontal => (x * 2 + 1, y * 2),
            Orientation::Vertical => (x * 2, y * 2 + 1),
        }
    }

    pub fn set(&mut self, tile: (u16, u16), cell: GridCell) {
        let idx = self.ravel_index(tile.0, tile.1);
        if self.data[idx] != cell {
            self.data[idx] = cell;
            self.changes.push(tile);
        }
    }

    fn set_cell(&mut self, coord: Coord, cell: GridCell) {
        self.set(Canvas::cell_tile(coord), cell);
    }

    /// Tiles whose content changed, with their new content.
    pub fn take_changes(&mut self) -> Vec<((u16, u16), GridCell)> {
        std::mem::take(&mut self.changes)
            .into_iter()
            .map(|tile| (tile, self[tile]))
            .collect()
    }

    /// Every tile, row by row.
    pub fn rows(&self) -> impl Iterator<Item = &[GridCell]> {
        self.data.chunks(self.width as usize)
    }

    fn move_head(&mut self, to: Coord, left_behind: GridCell) {
        if let Some(previous) = self.head.replace(to) {
            self.set_cell(previous, left_behind);
        }
        self.set_cell(to, GridCell::CURRENT);
    }

    pub fn apply(&mut self, generator: Generator, event: &GenerationEvent) {
        match event {
            GenerationEvent::CellVisited(coord) => match generator {
                Generator::Dfs => self.move_head(*coord, GridCell::VISITED),
                Generator::Sidewinder => self.set_cell(*coord, GridCell::RUN),
                _ => self.set_cell(*coord, GridCell::VISITED),
            },
            GenerationEvent::Backtrack(coord) => self.move_head(*coord, GridCell::BACKTRACKED),
            GenerationEvent::WallOpened(a, b) => {
                self.set(Canvas::wall_tile(*a, *b), GridCell::VISITED);
            }
            GenerationEvent::RunCommitted(run) => {
                for coord in run {
                    self.set_cell(*coord, GridCell::VISITED);
                }
            }
            GenerationEvent::WalkStarted(coord) => {
                self.walk.clear();
                self.walk.push(*coord);
                self.set_cell(*coord, GridCell::WALK);
            }
            GenerationEvent::PathStep(from, direction) => {
                let Some(to) = direction.step(*from) else {
                    return;
                };
                self.set(Canvas::wall_tile(*from, to), GridCell::WALK);
                if self[Canvas::cell_tile(to)] != GridCell::VISITED {
                    self.walk.push(to);
                    self.set_cell(to, GridCell::WALK);
                }
            }
            GenerationEvent::PathErased { from_index } => {
                let from_index = *from_index;
                if from_index == 0 || from_index >= self.walk.len() {
                    return;
                }
                let erased = self.walk.split_off(from_index);
                let mut previous = self.walk[from_index - 1];
                for coord in erased {
                    self.set(Canvas::wall_tile(previous, coord), GridCell::WALL);
                    self.set_cell(coord, GridCell::EMPTY);
                    previous = coord;
                }
            }
            GenerationEvent::ChamberDivided { .. } => {}
            GenerationEvent::WallSegmentCreated { x, y, orientation } => {
                let tile = Canvas::segment_tile(*x, *y, *orientation);
                self.set(tile, GridCell::WALL);
                // Pillars at both ends of the segment
                let ends = match orientation {
                    Orientation::Horizontal => [(tile.0 - 1, tile.1), (tile.0 + 1, tile.1)],
                    Orientation::Vertical => [(tile.0, tile.1 - 1), (tile.0, tile.1 + 1)],
                };
                for end in ends {
                    self.set(end, GridCell::WALL);
                }
            }
            GenerationEvent::PassageCarved { x, y, orientation } => {
                self.set(Canvas::segment_tile(*x, *y, *orientation), GridCell::EMPTY);
            }
        }
    }
}

impl std::ops::Index<(u16, u16)> for Canvas {
    type Output = GridCell;

    fn index(&self, index: (u16, u16)) -> &Self::Output {
        &self.data[self.ravel_index(index.0, index.1)]
    }
}
