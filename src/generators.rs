use log::debug;
use rand::{self, rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use smallvec::SmallVec;

use crate::cells::{Cartesian2DCoordinate, CompassPrimary};
use crate::errors::*;
use crate::geometry::{self, CameraFrame, Rect2, Vec2};
use crate::grid::{MazeDimensions, MazeGrid};
use crate::layout::{self, PlacementSet};
use crate::styles::Style;
use crate::units::{Height, Width};

/// Where carving always begins. Every passage in a generated maze is reachable from here.
pub const CARVE_START: Cartesian2DCoordinate = Cartesian2DCoordinate { x: 1, y: 1 };

/// Apply the recursive backtracker maze generation algorithm to the grid.
///
/// The grid is reset to solid wall first. Carving jumps two cells at a time between the odd
/// coordinate lattice cells, knocking out the wall cell in between, and walks a random depth first
/// path until it gets stuck. It then backtracks along the stack of visited cells until it finds a
/// cell with an unvisited lattice neighbour.
/// Every lattice cell is visited exactly once and the wall border is never touched, so the passages
/// form a spanning tree of the lattice - a perfect maze.
pub fn recursive_backtracker(grid: &mut MazeGrid) {
    let mut rng = rand::thread_rng();
    recursive_backtracker_with_rng(grid, &mut rng);
}

/// Same as `recursive_backtracker` but reproducible for a given seed.
pub fn recursive_backtracker_seeded(grid: &mut MazeGrid, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    recursive_backtracker_with_rng(grid, &mut rng);
}

pub fn recursive_backtracker_with_rng<R: Rng + ?Sized>(grid: &mut MazeGrid, rng: &mut R) {
    grid.fill();
    if !grid.is_interior(CARVE_START) {
        return;
    }

    grid.carve(CARVE_START);
    let mut stack = vec![CARVE_START];
    let mut current = CARVE_START;

    loop {
        let candidates = unvisited_lattice_neighbours(grid, current);

        if let Some(&next) = candidates.choose(rng) {
            grid.carve(current.midpoint(next));
            grid.carve(next);
            stack.push(current);
            current = next;
        } else if let Some(previous) = stack.pop() {
            current = previous;
        } else {
            break;
        }
    }

    debug!("carved {}x{} maze with {} passage cells",
           grid.width().0,
           grid.height().0,
           grid.passage_count());
}

/// Lattice cells two steps away that are strictly inside the border and still solid wall.
fn unvisited_lattice_neighbours(grid: &MazeGrid,
                                coord: Cartesian2DCoordinate)
                                -> SmallVec<[Cartesian2DCoordinate; 4]> {
    CompassPrimary::ALL
        .iter()
        .filter_map(|dir| coord.offset(*dir, 2))
        .filter(|candidate| grid.is_interior(*candidate) && !grid.is_passage(*candidate))
        .collect()
}

/// Owns the current maze and the style it is shown with.
///
/// A grid only exists between a `generate` call and the next `clear`. Each `generate` replaces the
/// previous grid with a freshly allocated one.
#[derive(Debug, Clone)]
pub struct MazeGenerator {
    grid: Option<MazeGrid>,
    style: Style,
    tile_size: Vec2,
}

impl Default for MazeGenerator {
    fn default() -> Self {
        MazeGenerator::new(Style::classic())
    }
}

impl MazeGenerator {
    pub fn new(style: Style) -> MazeGenerator {
        MazeGenerator {
            grid: None,
            style,
            tile_size: geometry::DEFAULT_TILE_SIZE,
        }
    }

    pub fn with_tile_size(mut self, tile_size: Vec2) -> MazeGenerator {
        self.tile_size = tile_size;
        self
    }

    /// Carve a new maze. Even dimensions are bumped up to the next odd number.
    pub fn generate(&mut self, width: Width, height: Height) -> Result<&MazeGrid> {
        let mut grid = MazeGrid::new(MazeDimensions::new(width, height)?);
        recursive_backtracker(&mut grid);
        Ok(&*self.grid.insert(grid))
    }

    pub fn generate_seeded(&mut self, width: Width, height: Height, seed: u64) -> Result<&MazeGrid> {
        let mut grid = MazeGrid::new(MazeDimensions::new(width, height)?);
        recursive_backtracker_seeded(&mut grid, seed);
        Ok(&*self.grid.insert(grid))
    }

    pub fn clear(&mut self) {
        self.grid = None;
    }

    #[inline]
    pub fn grid(&self) -> Option<&MazeGrid> {
        self.grid.as_ref()
    }

    #[inline]
    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn set_style(&mut self, style: Style) {
        self.style = style;
    }

    #[inline]
    pub fn tile_size(&self) -> Vec2 {
        self.tile_size
    }

    /// Placement instructions for the current grid and style.
    pub fn layout(&self) -> Result<PlacementSet> {
        let grid = self.grid.as_ref().ok_or(ErrorKind::EmptyGrid)?;
        layout::resolve_layout(grid, &self.style)
    }

    /// World space bounds of everything the current style places, None if nothing is placed.
    pub fn content_bounds(&self) -> Result<Option<Rect2>> {
        let placements = self.layout()?;
        Ok(geometry::bounding_rect(placements.occupied_cells(), self.tile_size))
    }

    /// Zoom and centre that frame the current maze in an interactive viewport.
    pub fn camera_frame(&self, viewport: Vec2) -> Result<CameraFrame> {
        let bounds = self.content_bounds()?.unwrap_or_default();
        Ok(geometry::camera_frame(bounds, viewport))
    }
}
