use bit_set::BitSet;
use error_chain::bail;
use std::fmt;

use crate::cells::{Cartesian2DCoordinate, CompassPrimary};
use crate::errors::*;
use crate::units::{Height, Width};
use crate::utils::{self, FnvHashSet};

pub const MIN_DIMENSION: usize = 3;

/// Width and height of a maze grid, both always odd and at least `MIN_DIMENSION`.
///
/// Odd dimensions give a lattice of odd coordinate cells surrounded by a wall border, which is what
/// the carving algorithms work on.
#[derive(Eq, PartialEq, Debug, Copy, Clone)]
pub struct MazeDimensions {
    width: Width,
    height: Height,
}

impl MazeDimensions {
    /// Even sizes are bumped up by one. Anything smaller than `MIN_DIMENSION` is refused.
    pub fn new(width: Width, height: Height) -> Result<MazeDimensions> {
        let (Width(w), Height(h)) = (width, height);
        if w < MIN_DIMENSION || h < MIN_DIMENSION {
            bail!(ErrorKind::InvalidDimensions(w, h));
        }

        Ok(MazeDimensions {
            width: Width(make_odd(w)),
            height: Height(make_odd(h)),
        })
    }

    #[inline]
    pub fn width(&self) -> Width {
        self.width
    }

    #[inline]
    pub fn height(&self) -> Height {
        self.height
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.width.0 * self.height.0
    }
}

fn make_odd(n: usize) -> usize {
    if n % 2 == 0 { n + 1 } else { n }
}

/// A rectangular grid of cells that are either passage or wall.
#[derive(Clone, PartialEq, Eq)]
pub struct MazeGrid {
    passages: BitSet,
    width: usize,
    height: usize,
}

impl fmt::Debug for MazeGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,
               "MazeGrid :: width: {:?}, height: {:?}, passages: {:?}",
               self.width,
               self.height,
               self.passage_count())
    }
}

impl MazeGrid {
    /// A grid of the given dimensions with every cell a wall.
    pub fn new(dimensions: MazeDimensions) -> MazeGrid {
        let (Width(width), Height(height)) = (dimensions.width(), dimensions.height());
        MazeGrid {
            passages: BitSet::with_capacity(width * height),
            width,
            height,
        }
    }

    /// Build a grid from rows of cells, `true` meaning passage.
    ///
    /// Returns None if the rows are not all the same length.
    pub fn from_rows<R: AsRef<[bool]>>(rows: &[R]) -> Option<MazeGrid> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.as_ref().len());
        if rows.iter().any(|row| row.as_ref().len() != width) {
            return None;
        }

        let mut passages = BitSet::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            for (x, &is_passage) in row.as_ref().iter().enumerate() {
                if is_passage {
                    passages.insert(y * width + x);
                }
            }
        }

        Some(MazeGrid { passages, width, height })
    }

    #[inline]
    pub fn width(&self) -> Width {
        Width(self.width)
    }

    #[inline]
    pub fn height(&self) -> Height {
        Height(self.height)
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    #[inline]
    pub fn passage_count(&self) -> usize {
        self.passages.len()
    }

    /// Is the grid coordinate within the grid's dimensions
    #[inline]
    pub fn is_valid_coordinate(&self, coord: Cartesian2DCoordinate) -> bool {
        (coord.x as usize) < self.width && (coord.y as usize) < self.height
    }

    /// Is the coordinate strictly inside the wall border of the grid.
    #[inline]
    pub fn is_interior(&self, coord: Cartesian2DCoordinate) -> bool {
        let (x, y) = (coord.x as usize, coord.y as usize);
        x > 0 && y > 0 && x + 1 < self.width && y + 1 < self.height
    }

    /// Out of bounds coordinates are walls.
    pub fn is_passage(&self, coord: Cartesian2DCoordinate) -> bool {
        self.grid_coordinate_to_index(coord)
            .map_or(false, |index| self.passages.contains(index))
    }

    /// Turn a wall into a passage. Returns true if the cell was a wall before.
    pub fn carve(&mut self, coord: Cartesian2DCoordinate) -> bool {
        match self.grid_coordinate_to_index(coord) {
            Some(index) => self.passages.insert(index),
            None => false,
        }
    }

    /// Turn every cell back into a wall.
    pub fn fill(&mut self) {
        self.passages.clear();
    }

    /// Convert a grid coordinate to a one dimensional index in the range 0...grid.size().
    /// Returns None if the grid coordinate is invalid.
    #[inline]
    pub fn grid_coordinate_to_index(&self, coord: Cartesian2DCoordinate) -> Option<usize> {
        if self.is_valid_coordinate(coord) {
            Some(coord.y as usize * self.width + coord.x as usize)
        } else {
            None
        }
    }

    pub fn neighbour_at_direction(&self,
                                  coord: Cartesian2DCoordinate,
                                  direction: CompassPrimary)
                                  -> Option<Cartesian2DCoordinate> {
        coord.offset(direction, 1)
             .filter(|neighbour| self.is_valid_coordinate(*neighbour))
    }

    /// Every cell coordinate, rows top to bottom and columns left to right.
    pub fn iter(&self) -> impl Iterator<Item = Cartesian2DCoordinate> + '_ {
        let width = self.width;
        (0..self.size()).map(move |index| Cartesian2DCoordinate::from_row_major_index(index, width))
    }

    /// Every passage cell coordinate, in the same order as `iter`.
    pub fn iter_passages(&self) -> impl Iterator<Item = Cartesian2DCoordinate> + '_ {
        let width = self.width;
        self.passages.iter().map(move |index| Cartesian2DCoordinate::from_row_major_index(index, width))
    }

    /// Passage cells that can be reached from `start` by moving through passage cells only.
    pub fn reachable_from(&self, start: Cartesian2DCoordinate) -> FnvHashSet<Cartesian2DCoordinate> {
        let mut visited = utils::fnv_hashset(self.passage_count());
        if !self.is_passage(start) {
            return visited;
        }

        visited.insert(start);
        let mut frontier = vec![start];
        while let Some(coord) = frontier.pop() {
            for dir in CompassPrimary::ALL.iter() {
                if let Some(neighbour) = self.neighbour_at_direction(coord, *dir) {
                    if self.is_passage(neighbour) && visited.insert(neighbour) {
                        frontier.push(neighbour);
                    }
                }
            }
        }

        visited
    }

    /// Count of pairs of axis adjacent passage cells, i.e. the edges of the passage graph.
    pub fn connections_count(&self) -> usize {
        self.iter_passages()
            .map(|coord| {
                [CompassPrimary::East, CompassPrimary::South]
                    .iter()
                    .filter_map(|dir| self.neighbour_at_direction(coord, *dir))
                    .filter(|neighbour| self.is_passage(*neighbour))
                    .count()
            })
            .sum()
    }
}

impl fmt::Display for MazeGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for y in 0..self.height {
            let line: String = (0..self.width)
                .map(|x| {
                    if self.is_passage(Cartesian2DCoordinate::new(x as u32, y as u32)) {
                        ' '
                    } else {
                        '#'
                    }
                })
                .collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
