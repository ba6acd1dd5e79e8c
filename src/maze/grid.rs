use crate::error::MazeError;

use super::{Coord, Direction};

/// Up to four in-bounds neighbors, stored inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbors {
    cells: [Coord; 4],
    len: u8,
}

impl Neighbors {
    fn push(&mut self, coord: Coord) {
        self.cells[self.len as usize] = coord;
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Option<Coord> {
        self.as_slice().get(index).copied()
    }

    pub fn as_slice(&self) -> &[Coord] {
        &self.cells[..self.len as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = Coord> + '_ {
        self.as_slice().iter().copied()
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.as_slice().contains(&coord)
    }
}

#[derive(Debug, Clone)]
pub struct Cell {
    pub coord: Coord,
    /// Meaning depends on the algorithm driving the grid.
    pub visited: bool,
    adjacency: Neighbors,
}

impl Cell {
    pub fn adjacency(&self) -> &Neighbors {
        &self.adjacency
    }
}

/// Arena of cells addressed by linear index `y * width + x`.
pub struct Grid {
    cells: Box<[Cell]>,
    width: u16,
    height: u16,
}

impl Grid {
    /// Builds the cell arena and the (immutable) adjacency of every cell.
    pub fn new(width: u16, height: u16) -> Result<Self, MazeError> {
        if width == 0 || height == 0 {
            return Err(MazeError::InvalidDimensions { width, height });
        }
        let cells = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|coord| {
                let mut adjacency = Neighbors {
                    cells: [(0, 0); 4],
                    len: 0,
                };
                Direction::ALL
                    .into_iter()
                    .filter_map(|dir| dir.step(coord))
                    .filter(|&(nx, ny)| nx < width && ny < height)
                    .for_each(|n| adjacency.push(n));
                Cell {
                    coord,
                    visited: false,
                    adjacency,
                }
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Ok(Grid {
            cells,
            width,
            height,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.0 < self.width && coord.1 < self.height
    }

    pub fn index_of(&self, coord: Coord) -> usize {
        // Overflow-safe since width and height are u16 (assuming usize is at least 32 bits)
        coord.1 as usize * self.width as usize + coord.0 as usize
    }

    pub fn coord_of(&self, index: usize) -> Coord {
        (
            (index % self.width as usize) as u16,
            (index / self.width as usize) as u16,
        )
    }

    pub fn cell(&self, coord: Coord) -> &Cell {
        &self.cells[self.index_of(coord)]
    }

    pub fn cell_mut(&mut self, coord: Coord) -> &mut Cell {
        let idx = self.index_of(coord);
        &mut self.cells[idx]
    }

    pub fn neighbors(&self, coord: Coord) -> &Neighbors {
        &self.cell(coord).adjacency
    }

    pub fn is_adjacent(&self, a: Coord, b: Coord) -> bool {
        self.contains(a) && self.contains(b) && self.neighbors(a).contains(b)
    }

    /// All coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        self.cells.iter().map(|cell| cell.coord)
    }

    pub fn reset_visited(&mut self) {
        self.cells.iter_mut().for_each(|cell| cell.visited = false);
    }
}

impl std::ops::Index<Coord> for Grid {
    type Output = Cell;

    fn index(&self, index: Coord) -> &Self::Output {
        self.cell(index)
    }
}

impl std::ops::IndexMut<Coord> for Grid {
    fn index_mut(&mut self, index: Coord) -> &mut Self::Output {
        self.cell_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_dimensions() {
        assert_eq!(
            Grid::new(0, 5).err(),
            Some(MazeError::InvalidDimensions {
                width: 0,
                height: 5
            })
        );
        assert!(Grid::new(5, 0).is_err());
        assert!(Grid::new(1, 1).is_ok());
    }

    #[test]
    fn test_adjacency() {
        let grid = Grid::new(4, 3).unwrap();
        assert_eq!(grid.len(), 12);
        // Corners have two neighbors, edges three, interior four
        assert_eq!(grid.neighbors((0, 0)).len(), 2);
        assert_eq!(grid.neighbors((3, 2)).len(), 2);
        assert_eq!(grid.neighbors((1, 0)).len(), 3);
        assert_eq!(grid.neighbors((1, 1)).len(), 4);
        let mut around = grid.neighbors((1, 1)).iter().collect::<Vec<_>>();
        around.sort();
        assert_eq!(around, vec![(0, 1), (1, 0), (1, 2), (2, 1)]);
        assert!(grid.is_adjacent((0, 0), (1, 0)));
        assert!(!grid.is_adjacent((0, 0), (1, 1)));
        assert!(!grid.is_adjacent((3, 0), (4, 0)));
    }

    #[test]
    fn test_single_cell_has_no_neighbors() {
        let grid = Grid::new(1, 1).unwrap();
        assert!(grid.neighbors((0, 0)).is_empty());
    }

    #[test]
    fn test_index_roundtrip() {
        let grid = Grid::new(7, 5).unwrap();
        for coord in grid.coords() {
            assert_eq!(grid.coord_of(grid.index_of(coord)), coord);
        }
        assert_eq!(grid.index_of((2, 3)), 23);
    }

    #[test]
    fn test_visited_flags() {
        let mut grid = Grid::new(3, 3).unwrap();
        grid[(2, 1)].visited = true;
        assert!(grid.cell((2, 1)).visited);
        grid.reset_visited();
        assert!(grid.coords().all(|c| !grid[c].visited));
    }
}
