use itertools::Itertools;
use log::debug;
use smallvec::SmallVec;
use std::fmt;

use crate::cells::{Cartesian2DCoordinate, CompassPrimary};
use crate::errors::*;
use crate::grid::MazeGrid;
use crate::styles::{Style, TerrainId, TileId};
use crate::utils::{self, FnvHashSet};

/// Which of the four axis neighbours of a tile belong to the same layer as the tile.
///
/// Used to pick the connected variant of a terrain tile.
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug, Default)]
pub struct Connections(u8);

impl Connections {
    #[inline]
    fn bit(dir: CompassPrimary) -> u8 {
        match dir {
            CompassPrimary::North => 0b0001,
            CompassPrimary::South => 0b0010,
            CompassPrimary::East => 0b0100,
            CompassPrimary::West => 0b1000,
        }
    }

    pub fn none() -> Connections {
        Connections(0)
    }

    pub fn with(self, dir: CompassPrimary) -> Connections {
        Connections(self.0 | Connections::bit(dir))
    }

    #[inline]
    pub fn contains(self, dir: CompassPrimary) -> bool {
        self.0 & Connections::bit(dir) != 0
    }

    #[inline]
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    pub fn directions(self) -> SmallVec<[CompassPrimary; 4]> {
        CompassPrimary::ALL.iter().cloned().filter(|dir| self.contains(*dir)).collect()
    }
}

/// The structural element a placement stands for, with the tile or terrain used to draw it.
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug)]
pub enum Element {
    Passage(TerrainId),
    Wall(TerrainId),
    Start(TileId),
    End(TileId),
}

#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug)]
pub struct Placement {
    pub coord: Cartesian2DCoordinate,
    pub element: Element,
    /// Always empty for markers.
    pub connections: Connections,
}

/// Everything to draw for one maze in one style, split by layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlacementSet {
    passages: Vec<Placement>,
    walls: Vec<Placement>,
    markers: SmallVec<[Placement; 2]>,
}

impl PlacementSet {
    #[inline]
    pub fn passages(&self) -> &[Placement] {
        &self.passages
    }

    #[inline]
    pub fn walls(&self) -> &[Placement] {
        &self.walls
    }

    #[inline]
    pub fn markers(&self) -> &[Placement] {
        &self.markers
    }

    pub fn start(&self) -> Option<Cartesian2DCoordinate> {
        self.marker_at(|element| matches!(element, Element::Start(_)))
    }

    pub fn end(&self) -> Option<Cartesian2DCoordinate> {
        self.marker_at(|element| matches!(element, Element::End(_)))
    }

    fn marker_at<F: Fn(Element) -> bool>(&self, is_kind: F) -> Option<Cartesian2DCoordinate> {
        self.markers.iter().find(|p| is_kind(p.element)).map(|p| p.coord)
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty() && self.walls.is_empty() && self.markers.is_empty()
    }

    /// Every cell with something placed on it, each cell listed once.
    pub fn occupied_cells(&self) -> Vec<Cartesian2DCoordinate> {
        self.passages
            .iter()
            .chain(self.walls.iter())
            .chain(self.markers.iter())
            .map(|placement| placement.coord)
            .unique()
            .collect()
    }
}

/// Work out which cells to draw in which layer for a grid shown in a style.
///
/// Fails with `InvalidStyle` if the style would draw neither passages nor walls.
pub fn resolve_layout(grid: &MazeGrid, style: &Style) -> Result<PlacementSet> {
    style.validate()?;

    let mut placements = PlacementSet::default();

    if style.has_passages {
        let cells = grid.iter().filter(|c| grid.is_passage(*c)).collect_vec();
        placements.passages = connected_placements(&cells, |_| Element::Passage(style.passage_terrain));
    }

    if style.has_walls {
        let cells = grid.iter().filter(|c| !grid.is_passage(*c)).collect_vec();
        placements.walls = connected_placements(&cells, |_| Element::Wall(style.wall_terrain));
    }

    if style.has_markers {
        let start = first_passage(grid, grid.iter());
        let end = first_passage(grid, grid.iter().collect_vec().into_iter().rev());

        if let Some(start_coord) = start {
            placements.markers.push(marker(start_coord, Element::Start(style.start_tile)));
        }
        match (start, end) {
            (Some(start_coord), Some(end_coord)) if start_coord != end_coord => {
                placements.markers.push(marker(end_coord, Element::End(style.end_tile)));
            }
            _ => {}
        }
    }

    debug!("resolved '{}' layout: {} passages, {} walls, {} markers",
           style.name,
           placements.passages.len(),
           placements.walls.len(),
           placements.markers.len());

    Ok(placements)
}

fn marker(coord: Cartesian2DCoordinate, element: Element) -> Placement {
    Placement {
        coord,
        element,
        connections: Connections::none(),
    }
}

fn first_passage<I>(grid: &MazeGrid, mut cells: I) -> Option<Cartesian2DCoordinate>
    where I: Iterator<Item = Cartesian2DCoordinate>
{
    cells.find(|c| grid.is_passage(*c))
}

/// Connections are only worked out once every member of the layer is known, so each tile sees the
/// same neighbourhood whatever order the cells are visited in.
fn connected_placements<F>(cells: &[Cartesian2DCoordinate], element_for: F) -> Vec<Placement>
    where F: Fn(Cartesian2DCoordinate) -> Element
{
    let mut members: FnvHashSet<Cartesian2DCoordinate> = utils::fnv_hashset(cells.len());
    members.extend(cells.iter().cloned());

    cells.iter()
        .map(|&coord| {
            let connections = CompassPrimary::ALL
                .iter()
                .filter(|dir| {
                    coord.offset(**dir, 1)
                         .map_or(false, |neighbour| members.contains(&neighbour))
                })
                .fold(Connections::none(), |acc, dir| acc.with(*dir));
            Placement {
                coord,
                element: element_for(coord),
                connections,
            }
        })
        .collect()
}

/// Text view of a grid with the start and end markers written in as `S` and `E`.
pub struct MarkedGrid<'a> {
    grid: &'a MazeGrid,
    placements: &'a PlacementSet,
}

impl<'a> MarkedGrid<'a> {
    pub fn new(grid: &'a MazeGrid, placements: &'a PlacementSet) -> MarkedGrid<'a> {
        MarkedGrid { grid, placements }
    }
}

impl<'a> fmt::Display for MarkedGrid<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (start, end) = (self.placements.start(), self.placements.end());
        for row in &self.grid.iter().chunks(self.grid.width().0.max(1)) {
            let line: String = row.map(|coord| {
                    if Some(coord) == start {
                        'S'
                    } else if Some(coord) == end {
                        'E'
                    } else if self.grid.is_passage(coord) {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators;
    use crate::grid::{MazeDimensions, MazeGrid};
    use crate::units::{Height, Width};

    fn gc(x: u32, y: u32) -> Cartesian2DCoordinate {
        Cartesian2DCoordinate::new(x, y)
    }

    fn minimum_maze() -> MazeGrid {
        let mut g = MazeGrid::new(MazeDimensions::new(Width(3), Height(3)).unwrap());
        generators::recursive_backtracker(&mut g);
        g
    }

    #[test]
    fn connections_mask() {
        let c = Connections::none().with(CompassPrimary::North).with(CompassPrimary::West);
        assert!(c.contains(CompassPrimary::North));
        assert!(c.contains(CompassPrimary::West));
        assert!(!c.contains(CompassPrimary::South));
        assert_eq!(c.count(), 2);
        assert_eq!(&*c.directions(), &[CompassPrimary::North, CompassPrimary::West]);
    }

    #[test]
    fn invalid_style_is_rejected() {
        let g = minimum_maze();
        match resolve_layout(&g, &Style::bare()) {
            Err(Error(ErrorKind::InvalidStyle(_), _)) => {}
            other => panic!("expected invalid style, got {:?}", other),
        }
    }

    #[test]
    fn minimum_maze_has_only_a_start_marker() {
        let g = minimum_maze();
        let placements = resolve_layout(&g, &Style::classic()).unwrap();
        assert_eq!(placements.passages().len(), 1);
        assert_eq!(placements.walls().len(), 8);
        assert_eq!(placements.markers().len(), 1);
        assert_eq!(placements.start(), Some(gc(1, 1)));
        assert_eq!(placements.end(), None);
    }

    #[test]
    fn layers_follow_style() {
        let g = MazeGrid::from_rows(&[[false, false, false, false, false],
                                      [false, true, true, true, false],
                                      [false, false, false, false, false]])
            .unwrap();

        let walls_only = resolve_layout(&g, &Style::walls_only()).unwrap();
        assert!(walls_only.passages().is_empty());
        assert_eq!(walls_only.walls().len(), 12);
        assert_eq!(walls_only.start(), Some(gc(1, 1)));
        assert_eq!(walls_only.end(), Some(gc(3, 1)));

        let passages_only = resolve_layout(&g, &Style::passages_only()).unwrap();
        assert!(passages_only.walls().is_empty());
        assert_eq!(passages_only.passages().len(), 3);

        let mut unmarked = Style::classic();
        unmarked.has_markers = false;
        assert!(resolve_layout(&g, &unmarked).unwrap().markers().is_empty());
    }

    #[test]
    fn markers_scan_from_opposite_corners() {
        let g = MazeGrid::from_rows(&[[false, true, false],
                                      [true, true, true],
                                      [false, true, false]])
            .unwrap();
        let placements = resolve_layout(&g, &Style::classic()).unwrap();
        assert_eq!(placements.start(), Some(gc(1, 0)));
        assert_eq!(placements.end(), Some(gc(1, 2)));
        assert_eq!(placements.markers()[0].element, Element::Start(crate::styles::START_TILE));
        assert_eq!(placements.markers()[1].element, Element::End(crate::styles::END_TILE));
    }

    #[test]
    fn connections_see_the_whole_layer() {
        let g = MazeGrid::from_rows(&[[false, true, false],
                                      [true, true, true],
                                      [false, true, false]])
            .unwrap();
        let placements = resolve_layout(&g, &Style::classic()).unwrap();

        let centre = placements.passages().iter().find(|p| p.coord == gc(1, 1)).unwrap();
        assert_eq!(centre.connections.count(), 4);

        // The first passage found still knows about the ones found after it.
        let top = placements.passages().iter().find(|p| p.coord == gc(1, 0)).unwrap();
        assert_eq!(top.connections, Connections::none().with(CompassPrimary::South));

        // Corner walls have no wall neighbours at all.
        assert!(placements.walls().iter().all(|p| p.connections.count() == 0));
    }

    #[test]
    fn zero_area_grid_places_nothing() {
        let g = MazeGrid::from_rows::<Vec<bool>>(&[]).unwrap();
        let placements = resolve_layout(&g, &Style::classic()).unwrap();
        assert!(placements.is_empty());
        assert!(placements.occupied_cells().is_empty());
    }

    #[test]
    fn layout_is_idempotent() {
        let mut g = MazeGrid::new(MazeDimensions::new(Width(15), Height(9)).unwrap());
        generators::recursive_backtracker_seeded(&mut g, 7);
        let style = Style::classic();
        assert_eq!(resolve_layout(&g, &style).unwrap(), resolve_layout(&g, &style).unwrap());
    }

    #[test]
    fn occupied_cells_are_unique() {
        let g = minimum_maze();
        let placements = resolve_layout(&g, &Style::classic()).unwrap();
        assert_eq!(placements.occupied_cells().len(), 9);
    }

    #[test]
    fn marked_text_view() {
        let g = MazeGrid::from_rows(&[[false, false, false, false, false],
                                      [false, true, true, true, false],
                                      [false, false, false, false, false]])
            .unwrap();
        let placements = resolve_layout(&g, &Style::classic()).unwrap();
        assert_eq!(format!("{}", MarkedGrid::new(&g, &placements)),
                   "#####\n#S E#\n#####\n");
    }
}
