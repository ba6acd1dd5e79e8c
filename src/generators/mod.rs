use rand::{Rng, SeedableRng, rngs::StdRng};

mod dfs;
mod recur_div;
mod sidewinder;
mod wilson;

pub use dfs::DfsBacktracker;
pub use recur_div::{Chamber, RecursiveDivider, SegmentMap};
pub use sidewinder::{RowOrder, Sidewinder, SidewinderOptions};
pub use wilson::WilsonWalker;

use crate::{
    error::MazeError,
    maze::{Coord, Direction, Orientation, WallSet},
};

/// One observable step of a generation run, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationEvent {
    /// A cell became part of the maze
    CellVisited(Coord),
    /// The wall between two adjacent cells was opened
    WallOpened(Coord, Coord),
    /// The depth-first walk returned to this cell
    Backtrack(Coord),
    /// A loop-erased walk started from this cell
    WalkStarted(Coord),
    /// The walk left this cell in the given direction
    PathStep(Coord, Direction),
    /// Walk path entries at `from_index` and beyond were erased
    PathErased { from_index: usize },
    /// A Sidewinder run was closed out
    RunCommitted(Vec<Coord>),
    /// A chamber is about to be split by a wall of this orientation
    ChamberDivided {
        chamber: Chamber,
        orientation: Orientation,
    },
    WallSegmentCreated {
        x: u16,
        y: u16,
        orientation: Orientation,
    },
    PassageCarved {
        x: u16,
        y: u16,
        orientation: Orientation,
    },
}

/// A pull-based maze generation run. Each `next()` advances the algorithm by at
/// most one step; dropping the generator abandons the run.
pub trait MazeGenerator: Iterator<Item = GenerationEvent> {
    /// Snapshot of the passages carved so far.
    fn maze(&self) -> WallSet;

    fn is_finished(&self) -> bool;
}

/// Get a random number generator, optionally seeded for reproducibility.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generator {
    Dfs,
    Sidewinder,
    Wilson,
    RecurDiv,
}

impl std::fmt::Display for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Generator::Dfs => write!(f, "Depth-First Backtracker"),
            Generator::Sidewinder => write!(f, "Sidewinder"),
            Generator::Wilson => write!(f, "Wilson's Algorithm"),
            Generator::RecurDiv => write!(f, "Recursive Division"),
        }
    }
}

impl Generator {
    pub const ALL: [Generator; 4] = [
        Generator::Dfs,
        Generator::Sidewinder,
        Generator::Wilson,
        Generator::RecurDiv,
    ];

    /// Start a fresh run of this algorithm.
    pub fn start<R>(
        self,
        width: u16,
        height: u16,
        options: &GeneratorOptions,
        rng: R,
    ) -> Result<Box<dyn MazeGenerator + Send>, MazeError>
    where
        R: Rng + Send + 'static,
    {
        tracing::debug!("[generators] starting {} on a {}x{} grid", self, width, height);
        Ok(match self {
            Generator::Dfs => Box::new(DfsBacktracker::new(width, height, rng)?),
            Generator::Sidewinder => Box::new(Sidewinder::new(
                width,
                height,
                options.sidewinder,
                rng,
            )?),
            Generator::Wilson => Box::new(WilsonWalker::new(width, height, rng)?),
            Generator::RecurDiv => Box::new(RecursiveDivider::new(width, height, rng)?),
        })
    }
}

/// Per-algorithm knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeneratorOptions {
    pub sidewinder: SidewinderOptions,
}

/// Batch mode: run the generator to completion and return the maze.
pub fn generate_maze(
    generator: Generator,
    width: u16,
    height: u16,
    options: &GeneratorOptions,
    seed: Option<u64>,
) -> Result<WallSet, MazeError> {
    let mut run = generator.start(width, height, options, rng_from_seed(seed))?;
    let steps = run.by_ref().count();
    let maze = run.maze();
    tracing::debug!(
        "[generators] {} finished after {} events with {} passages",
        generator,
        steps,
        maze.open_count()
    );
    Ok(maze)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_all_generators_build_perfect_mazes() {
        let options = GeneratorOptions::default();
        for generator in Generator::ALL {
            for (width, height) in [(1, 1), (1, 5), (5, 1), (2, 2), (5, 5), (12, 7), (30, 30)] {
                let maze = generate_maze(generator, width, height, &options, Some(42)).unwrap();
                assert!(
                    maze.is_perfect(),
                    "{} produced an imperfect {}x{} maze",
                    generator,
                    width,
                    height
                );
                assert_eq!(maze.open_count(), width as usize * height as usize - 1);
            }
        }
    }

    #[test]
    fn test_deterministic_for_same_seed() {
        let options = GeneratorOptions::default();
        for generator in Generator::ALL {
            let first = generate_maze(generator, 16, 9, &options, Some(7)).unwrap();
            let second = generate_maze(generator, 16, 9, &options, Some(7)).unwrap();
            assert_eq!(first, second, "{} is not deterministic", generator);
            assert_eq!(
                first.open_walls().collect::<Vec<_>>(),
                second.open_walls().collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn test_single_column_is_a_corridor() {
        let options = GeneratorOptions::default();
        for generator in [Generator::Dfs, Generator::Sidewinder, Generator::Wilson] {
            let maze = generate_maze(generator, 1, 5, &options, Some(3)).unwrap();
            for y in 0..4 {
                assert_eq!(maze.is_open((0, y), (0, y + 1)), Ok(true));
            }
            assert_eq!(maze.open_count(), 4);
        }
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        let options = GeneratorOptions::default();
        for generator in Generator::ALL {
            assert_eq!(
                generate_maze(generator, 0, 4, &options, Some(1)).err(),
                Some(MazeError::InvalidDimensions {
                    width: 0,
                    height: 4
                })
            );
        }
    }

    #[test]
    fn test_walls_never_close_during_a_run() {
        let options = GeneratorOptions::default();
        // Recursive division starts from an open area and is checked on its own segments
        for generator in [Generator::Dfs, Generator::Sidewinder, Generator::Wilson] {
            let mut run = generator.start(8, 6, &options, rng_from_seed(Some(11))).unwrap();
            let mut previous = run.maze();
            while run.next().is_some() {
                let current = run.maze();
                for (a, b) in previous.open_walls() {
                    assert_eq!(current.is_open(a, b), Ok(true), "{} closed a wall", generator);
                }
                assert!(current.open_count() >= previous.open_count());
                previous = current;
            }
            assert!(run.is_finished());
        }
    }

    proptest! {
        #[test]
        fn prop_spanning_tree(width in 1u16..20, height in 1u16..20, seed in any::<u64>()) {
            let options = GeneratorOptions::default();
            for generator in Generator::ALL {
                let maze = generate_maze(generator, width, height, &options, Some(seed)).unwrap();
                prop_assert!(maze.is_connected());
                prop_assert_eq!(maze.open_count(), width as usize * height as usize - 1);
            }
        }
    }
}
