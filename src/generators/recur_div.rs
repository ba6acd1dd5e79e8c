use std::collections::VecDeque;

use rand::Rng;

use crate::{
    error::MazeError,
    generators::{GenerationEvent, MazeGenerator},
    maze::{Orientation, WallSet},
};

/// Rectangular region of the grid, in cell units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chamber {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Chamber {
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Presence of every unit wall segment of a `width x height` area.
///
/// Horizontal segment `(x, y)` runs along the top edge of cell `(x, y)`, with
/// `y == height` being the bottom boundary. Vertical segment `(x, y)` runs along
/// the left edge of cell `(x, y)`, with `x == width` being the right boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMap {
    horizontal: Box<[bool]>,
    vertical: Box<[bool]>,
    width: u16,
    height: u16,
}

impl SegmentMap {
    fn new(width: u16, height: u16) -> Self {
        let (w, h) = (width as usize, height as usize);
        SegmentMap {
            horizontal: vec![false; w * (h + 1)].into_boxed_slice(),
            vertical: vec![false; (w + 1) * h].into_boxed_slice(),
            width,
            height,
        }
    }

    fn ravel_index(&self, x: u16, y: u16, orientation: Orientation) -> usize {
        match orientation {
            Orientation::Horizontal => y as usize * self.width as usize + x as usize,
            Orientation::Vertical => y as usize * (self.width as usize + 1) + x as usize,
        }
    }

    fn in_bounds(&self, x: u16, y: u16, orientation: Orientation) -> bool {
        match orientation {
            Orientation::Horizontal => x < self.width && y <= self.height,
            Orientation::Vertical => x <= self.width && y < self.height,
        }
    }

    fn slot_mut(&mut self, x: u16, y: u16, orientation: Orientation) -> &mut bool {
        let idx = self.ravel_index(x, y, orientation);
        match orientation {
            Orientation::Horizontal => &mut self.horizontal[idx],
            Orientation::Vertical => &mut self.vertical[idx],
        }
    }

    /// Whether a wall segment stands at this position.
    pub fn contains(&self, x: u16, y: u16, orientation: Orientation) -> bool {
        if !self.in_bounds(x, y, orientation) {
            return false;
        }
        let idx = self.ravel_index(x, y, orientation);
        match orientation {
            Orientation::Horizontal => self.horizontal[idx],
            Orientation::Vertical => self.vertical[idx],
        }
    }

    fn insert(&mut self, x: u16, y: u16, orientation: Orientation) {
        *self.slot_mut(x, y, orientation) = true;
    }

    fn remove(&mut self, x: u16, y: u16, orientation: Orientation) {
        *self.slot_mut(x, y, orientation) = false;
    }

    pub fn segment_count(&self) -> usize {
        self.horizontal.iter().chain(self.vertical.iter()).filter(|&&s| s).count()
    }

    /// Passage graph: two adjacent cells are connected iff no segment separates them.
    pub fn to_wall_set(&self) -> WallSet {
        let mut walls = match WallSet::new(self.width, self.height) {
            Ok(walls) => walls,
            Err(err) => unreachable!("segment maps are only built for valid dimensions: {err}"),
        };
        for y in 0..self.height {
            for x in 0..self.width {
                if x + 1 < self.width && !self.contains(x + 1, y, Orientation::Vertical) {
                    walls.carve((x, y), (x + 1, y));
                }
                if y + 1 < self.height && !self.contains(x, y + 1, Orientation::Horizontal) {
                    walls.carve((x, y), (x, y + 1));
                }
            }
        }
        walls
    }
}

/// Recursive division on wall segments: split each chamber with a full wall,
/// open a single passage through it, and keep dividing both halves until every
/// chamber is a single cell.
pub struct RecursiveDivider<R> {
    segments: SegmentMap,
    rng: R,
    /// Chambers still to divide, processed last-in first-out
    chambers: Vec<Chamber>,
    divisions: usize,
    passages: usize,
    pending: VecDeque<GenerationEvent>,
}

impl<R: Rng> RecursiveDivider<R> {
    pub fn new(width: u16, height: u16, rng: R) -> Result<Self, MazeError> {
        if width == 0 || height == 0 {
            return Err(MazeError::InvalidDimensions { width, height });
        }
        let mut divider = RecursiveDivider {
            segments: SegmentMap::new(width, height),
            rng,
            chambers: vec![Chamber {
                x: 0,
                y: 0,
                width,
                height,
            }],
            divisions: 0,
            passages: 0,
            pending: VecDeque::new(),
        };

        // Fully enclosed outer boundary
        for x in 0..width {
            divider.create_segment(x, 0, Orientation::Horizontal);
            divider.create_segment(x, height, Orientation::Horizontal);
        }
        for y in 0..height {
            divider.create_segment(0, y, Orientation::Vertical);
            divider.create_segment(width, y, Orientation::Vertical);
        }
        Ok(divider)
    }

    pub fn segments(&self) -> &SegmentMap {
        &self.segments
    }

    /// Number of dividing walls created so far.
    pub fn divisions(&self) -> usize {
        self.divisions
    }

    /// Number of passages carved so far.
    pub fn passages(&self) -> usize {
        self.passages
    }

    fn create_segment(&mut self, x: u16, y: u16, orientation: Orientation) {
        self.segments.insert(x, y, orientation);
        self.pending.push_back(GenerationEvent::WallSegmentCreated { x, y, orientation });
    }

    fn carve_passage(&mut self, x: u16, y: u16, orientation: Orientation) {
        self.segments.remove(x, y, orientation);
        self.passages += 1;
        self.pending.push_back(GenerationEvent::PassageCarved { x, y, orientation });
    }

    fn step(&mut self) -> bool {
        let Some(chamber) = self.chambers.pop() else {
            return false;
        };

        // An axis can only be split if it is at least two cells long
        let orientation = match (chamber.width >= 2, chamber.height >= 2) {
            (true, true) => {
                if self.rng.random_bool(0.5) {
                    Orientation::Vertical
                } else {
                    Orientation::Horizontal
                }
            }
            (true, false) => Orientation::Vertical,
            (false, true) => Orientation::Horizontal,
            (false, false) => return true,
        };

        self.divisions += 1;
        self.pending.push_back(GenerationEvent::ChamberDivided {
            chamber,
            orientation,
        });
        let Chamber {
            x,
            y,
            width,
            height,
        } = chamber;

        let (first, second) = match orientation {
            Orientation::Vertical => {
                let wall_x = self.rng.random_range(x + 1..x + width);
                for wall_y in y..y + height {
                    self.create_segment(wall_x, wall_y, Orientation::Vertical);
                }
                let hole_y = y + self.rng.random_range(0..height);
                self.carve_passage(wall_x, hole_y, Orientation::Vertical);
                (
                    Chamber {
                        x,
                        y,
                        width: wall_x - x,
                        height,
                    },
                    Chamber {
                        x: wall_x,
                        y,
                        width: x + width - wall_x,
                        height,
                    },
                )
            }
            Orientation::Horizontal => {
                let wall_y = self.rng.random_range(y + 1..y + height);
                for wall_x in x..x + width {
                    self.create_segment(wall_x, wall_y, Orientation::Horizontal);
                }
                let hole_x = x + self.rng.random_range(0..width);
                self.carve_passage(hole_x, wall_y, Orientation::Horizontal);
                (
                    Chamber {
                        x,
                        y,
                        width,
                        height: wall_y - y,
                    },
                    Chamber {
                        x,
                        y: wall_y,
                        width,
                        height: y + height - wall_y,
                    },
                )
            }
        };
        tracing::trace!("[recur_div] divided {:?} into {:?} and {:?}", chamber, first, second);

        // Push the second half first so the first half is divided next
        self.chambers.push(second);
        self.chambers.push(first);
        true
    }
}

impl<R: Rng> Iterator for RecursiveDivider<R> {
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

impl<R: Rng> MazeGenerator for RecursiveDivider<R> {
    fn maze(&self) -> WallSet {
        self.segments.to_wall_set()
    }

    fn is_finished(&self) -> bool {
        self.chambers.is_empty()
    }
}
