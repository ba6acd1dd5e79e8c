use std::collections::VecDeque;

use rand::Rng;

use crate::{
    error::MazeError,
    generators::{GenerationEvent, MazeGenerator},
    maze::{Coord, Direction, Grid, WallSet},
};

/// Order in which Sidewinder processes rows. Runs always close out toward the
/// previously processed row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowOrder {
    /// First row is `y = 0`; runs connect north
    #[default]
    TopDown,
    /// First row is `y = height - 1`; runs connect south
    BottomUp,
}

impl RowOrder {
    fn close_out_direction(self) -> Direction {
        match self {
            RowOrder::TopDown => Direction::North,
            RowOrder::BottomUp => Direction::South,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SidewinderOptions {
    pub row_order: RowOrder,
    /// Probability of extending the run east instead of closing it out
    pub extend_probability: f64,
}

impl Default for SidewinderOptions {
    fn default() -> Self {
        Self {
            row_order: RowOrder::TopDown,
            extend_probability: 0.5,
        }
    }
}

/// Row-by-row run carving.
///
/// The first processed row has nothing to connect to and becomes a single
/// corridor. In every later row, each cell either extends the current run east
/// or closes it out, linking one random member of the run to the row processed
/// before it. The last column always closes out.
pub struct Sidewinder<R> {
    grid: Grid,
    walls: WallSet,
    rng: R,
    options: SidewinderOptions,
    /// Number of rows fully processed
    row: u16,
    x: u16,
    run: Vec<Coord>,
    pending: VecDeque<GenerationEvent>,
}

impl<R: Rng> Sidewinder<R> {
    pub fn new(
        width: u16,
        height: u16,
        options: SidewinderOptions,
        rng: R,
    ) -> Result<Self, MazeError> {
        if !(0.0..=1.0).contains(&options.extend_probability) {
            return Err(MazeError::InvalidBias(options.extend_probability));
        }
        Ok(Sidewinder {
            grid: Grid::new(width, height)?,
            walls: WallSet::new(width, height)?,
            rng,
            options,
            row: 0,
            x: 0,
            run: Vec::with_capacity(width as usize),
            pending: VecDeque::new(),
        })
    }

    /// Cells of the run currently being built.
    pub fn run(&self) -> &[Coord] {
        &self.run
    }

    fn row_y(&self, row: u16) -> u16 {
        match self.options.row_order {
            RowOrder::TopDown => row,
            RowOrder::BottomUp => self.walls.height() - 1 - row,
        }
    }

    /// Grid neighbor of `coord` in `direction`, if there is one.
    fn neighbor(&self, coord: Coord, direction: Direction) -> Option<Coord> {
        self.grid
            .neighbors(coord)
            .iter()
            .find(|&n| Direction::between(coord, n) == Some(direction))
    }

    fn commit_run(&mut self) {
        let run = std::mem::take(&mut self.run);
        self.pending.push_back(GenerationEvent::RunCommitted(run));
    }

    fn carve_east(&mut self, coord: Coord) {
        let Some(east) = self.neighbor(coord, Direction::East) else {
            unreachable!("runs only extend east before the last column");
        };
        self.walls.carve(coord, east);
        self.pending.push_back(GenerationEvent::WallOpened(coord, east));
    }

    fn step(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }

        let coord = (self.x, self.row_y(self.row));
        let last_column = self.neighbor(coord, Direction::East).is_none();
        self.run.push(coord);
        self.pending.push_back(GenerationEvent::CellVisited(coord));

        if self.row == 0 {
            // Nothing to close out toward: the first row is one corridor
            if last_column {
                self.commit_run();
            } else {
                self.carve_east(coord);
            }
        } else if !last_column && self.rng.random_bool(self.options.extend_probability) {
            self.carve_east(coord);
        } else {
            let member = self.run[self.rng.random_range(0..self.run.len())];
            let close_out = self.options.row_order.close_out_direction();
            let Some(linked) = self.neighbor(member, close_out) else {
                unreachable!("only rows after the first close out");
            };
            self.walls.carve(member, linked);
            self.pending.push_back(GenerationEvent::WallOpened(member, linked));
            self.commit_run();
        }

        self.x += 1;
        if self.x == self.walls.width() {
            tracing::trace!("[sidewinder] row {} done", self.row_y(self.row));
            self.x = 0;
            self.row += 1;
        }
        true
    }
}

impl<R: Rng> Iterator for Sidewinder<R> {
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

impl<R: Rng> MazeGenerator for Sidewinder<R> {
    fn maze(&self) -> WallSet {
        self.walls.clone()
    }

    fn is_finished(&self) -> bool {
        self.row == self.walls.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn sidewinder(width: u16, height: u16, options: SidewinderOptions) -> Sidewinder<StdRng> {
        Sidewinder::new(width, height, options, StdRng::seed_from_u64(9)).unwrap()
    }

    #[test]
    fn test_rejects_invalid_bias() {
        for p in [-0.1, 1.5, f64::NAN] {
            let options = SidewinderOptions {
                extend_probability: p,
                ..Default::default()
            };
            assert!(matches!(
                Sidewinder::new(4, 4, options, StdRng::seed_from_u64(0)),
                Err(MazeError::InvalidBias(_))
            ));
        }
    }

    #[test]
    fn test_first_row_is_corridor() {
        for row_order in [RowOrder::TopDown, RowOrder::BottomUp] {
            let options = SidewinderOptions {
                row_order,
                ..Default::default()
            };
            let mut generator = sidewinder(6, 4, options);
            let first_run = generator
                .by_ref()
                .find_map(|event| match event {
                    GenerationEvent::RunCommitted(run) => Some(run),
                    _ => None,
                })
                .unwrap();
            let y = if row_order == RowOrder::TopDown { 0 } else { 3 };
            assert_eq!(first_run, (0..6).map(|x| (x, y)).collect::<Vec<_>>());
            generator.by_ref().for_each(drop);
            let maze = generator.maze();
            for x in 0..5 {
                assert_eq!(maze.is_open((x, y), (x + 1, y)), Ok(true));
            }
            assert!(maze.is_perfect());
        }
    }

    #[test]
    fn test_runs_are_contiguous_within_their_row() {
        let mut generator = sidewinder(9, 7, SidewinderOptions::default());
        let mut expected_next = (0u16, 0u16);
        let mut last_link = None;
        for event in generator.by_ref() {
            match event {
                GenerationEvent::WallOpened(a, b) if a.1 != b.1 => last_link = Some((a, b)),
                GenerationEvent::RunCommitted(run) => {
                    assert!(!run.is_empty());
                    // Each run starts right where the previous one ended
                    assert_eq!(run[0], expected_next);
                    for pair in run.windows(2) {
                        assert_eq!(pair[1], (pair[0].0 + 1, pair[0].1));
                    }
                    let end = run[run.len() - 1];
                    if end.1 > 0 {
                        // The single upward link belongs to this run
                        let (member, above) = last_link.take().unwrap();
                        assert!(run.contains(&member));
                        assert_eq!(above, (member.0, member.1 - 1));
                    }
                    expected_next = if end.0 == 8 { (0, end.1 + 1) } else { (end.0 + 1, end.1) };
                }
                _ => {}
            }
        }
        assert_eq!(expected_next, (0, 7));
        assert!(generator.maze().is_perfect());
    }

    #[test]
    fn test_bias_extremes() {
        // Never extending links every cell upward on its own
        let options = SidewinderOptions {
            extend_probability: 0.0,
            ..Default::default()
        };
        let maze = {
            let mut generator = sidewinder(5, 4, options);
            generator.by_ref().for_each(drop);
            generator.maze()
        };
        for y in 1..4 {
            for x in 0..5 {
                assert_eq!(maze.is_open((x, y), (x, y - 1)), Ok(true));
            }
        }
        assert!(maze.is_perfect());

        // Always extending yields one run per row
        let options = SidewinderOptions {
            extend_probability: 1.0,
            ..Default::default()
        };
        let runs = sidewinder(5, 4, options)
            .filter(|event| matches!(event, GenerationEvent::RunCommitted(_)))
            .count();
        assert_eq!(runs, 4);
    }

    #[test]
    fn test_neighbor_stays_on_the_grid() {
        let generator = sidewinder(4, 3, SidewinderOptions::default());
        assert_eq!(generator.neighbor((1, 1), Direction::East), Some((2, 1)));
        assert_eq!(generator.neighbor((1, 1), Direction::North), Some((1, 0)));
        assert_eq!(generator.neighbor((3, 1), Direction::East), None);
        assert_eq!(generator.neighbor((2, 0), Direction::North), None);
        assert_eq!(generator.neighbor((2, 2), Direction::South), None);
    }

    #[test]
    fn test_single_row_and_single_column() {
        let mut row = sidewinder(7, 1, SidewinderOptions::default());
        row.by_ref().for_each(drop);
        assert!(row.maze().is_perfect());

        let mut column = sidewinder(1, 6, SidewinderOptions::default());
        let runs = column
            .by_ref()
            .filter(|event| matches!(event, GenerationEvent::RunCommitted(_)))
            .count();
        assert_eq!(runs, 6);
        assert!(column.maze().is_perfect());
        assert!(column.run().is_empty());
    }
}
