pub mod grid;
pub mod walls;

pub use grid::{Cell, Grid, Neighbors};
pub use walls::WallSet;

/// Cell coordinate `(x, y)`. `y = 0` is the top row.
pub type Coord = (u16, u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Compass direction between two 4-adjacent cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// Moves one step from `coord` in this direction.
    /// Returns `None` when the step would underflow; the upper bound is the caller's concern.
    pub fn step(self, coord: Coord) -> Option<Coord> {
        let (x, y) = coord;
        match self {
            Direction::North => y.checked_sub(1).map(|y| (x, y)),
            Direction::South => y.checked_add(1).map(|y| (x, y)),
            Direction::East => x.checked_add(1).map(|x| (x, y)),
            Direction::West => x.checked_sub(1).map(|x| (x, y)),
        }
    }

    /// Direction of travel from `from` to `to`, if the two cells are 4-adjacent.
    pub fn between(from: Coord, to: Coord) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|&dir| dir.step(from) == Some(to))
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::North => write!(f, "north"),
            Direction::South => write!(f, "south"),
            Direction::East => write!(f, "east"),
            Direction::West => write!(f, "west"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_between() {
        assert_eq!(Direction::between((2, 2), (2, 1)), Some(Direction::North));
        assert_eq!(Direction::between((2, 2), (2, 3)), Some(Direction::South));
        assert_eq!(Direction::between((2, 2), (3, 2)), Some(Direction::East));
        assert_eq!(Direction::between((2, 2), (1, 2)), Some(Direction::West));
        assert_eq!(Direction::between((2, 2), (3, 3)), None);
        assert_eq!(Direction::between((2, 2), (2, 2)), None);
    }

    #[test]
    fn test_step_underflow() {
        assert_eq!(Direction::North.step((0, 0)), None);
        assert_eq!(Direction::West.step((0, 5)), None);
        assert_eq!(Direction::South.step((0, 0)), Some((0, 1)));
        for dir in Direction::ALL {
            let moved = dir.step((4, 4)).unwrap();
            assert_eq!(dir.opposite().step(moved), Some((4, 4)));
        }
    }
}
