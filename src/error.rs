use thiserror::Error;

use crate::maze::Coord;

/// Errors surfaced by the maze core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MazeError {
    #[error("invalid maze dimensions {width}x{height}: width and height must be at least 1")]
    InvalidDimensions { width: u16, height: u16 },
    #[error("cells {a:?} and {b:?} are not adjacent")]
    NotAdjacent { a: Coord, b: Coord },
    #[error("extend probability {0} is outside [0, 1]")]
    InvalidBias(f64),
}
