use serde_derive::{Deserialize, Serialize};
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Cartesian2DCoordinate {
    pub x: u32,
    pub y: u32,
}

#[derive(Eq, PartialEq, Copy, Clone, Debug, Hash)]
pub enum CompassPrimary {
    North,
    South,
    East,
    West,
}

impl CompassPrimary {
    pub const ALL: [CompassPrimary; 4] = [CompassPrimary::North,
                                          CompassPrimary::South,
                                          CompassPrimary::East,
                                          CompassPrimary::West];
}

impl Cartesian2DCoordinate {
    pub fn new(x: u32, y: u32) -> Cartesian2DCoordinate {
        Cartesian2DCoordinate { x, y }
    }

    #[inline]
    pub fn from_row_major_index(index: usize, row_width: usize) -> Cartesian2DCoordinate {
        let x = index % row_width;
        let y = index / row_width;
        Cartesian2DCoordinate::new(x as u32, y as u32)
    }

    /// Creates a new coordinate `steps` cells away in the given direction.
    /// Returns None if the coordinate would go below zero or overflow.
    /// There is no upper bound check, that depends on the grid.
    pub fn offset(self, dir: CompassPrimary, steps: u32) -> Option<Cartesian2DCoordinate> {
        let (x, y) = (self.x, self.y);
        match dir {
            CompassPrimary::North => y.checked_sub(steps).map(|y| Cartesian2DCoordinate { x, y }),
            CompassPrimary::South => y.checked_add(steps).map(|y| Cartesian2DCoordinate { x, y }),
            CompassPrimary::East => x.checked_add(steps).map(|x| Cartesian2DCoordinate { x, y }),
            CompassPrimary::West => x.checked_sub(steps).map(|x| Cartesian2DCoordinate { x, y }),
        }
    }

    /// The cell exactly between this coordinate and another that lies on the same row or column.
    pub fn midpoint(self, other: Cartesian2DCoordinate) -> Cartesian2DCoordinate {
        Cartesian2DCoordinate::new((self.x + other.x) / 2, (self.y + other.y) / 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::u32;

    #[test]
    fn offsets_stop_at_zero() {
        let origin = Cartesian2DCoordinate::new(0, 0);
        assert_eq!(origin.offset(CompassPrimary::North, 1), None);
        assert_eq!(origin.offset(CompassPrimary::West, 1), None);
        assert_eq!(origin.offset(CompassPrimary::South, 2),
                   Some(Cartesian2DCoordinate::new(0, 2)));
        assert_eq!(origin.offset(CompassPrimary::East, 2),
                   Some(Cartesian2DCoordinate::new(2, 0)));

        let far = Cartesian2DCoordinate::new(u32::MAX, u32::MAX);
        assert_eq!(far.offset(CompassPrimary::East, 1), None);
        assert_eq!(far.offset(CompassPrimary::South, 1), None);
    }

    #[test]
    fn midpoint_between_lattice_cells() {
        let a = Cartesian2DCoordinate::new(1, 1);
        assert_eq!(a.midpoint(Cartesian2DCoordinate::new(3, 1)),
                   Cartesian2DCoordinate::new(2, 1));
        assert_eq!(a.midpoint(Cartesian2DCoordinate::new(1, 3)),
                   Cartesian2DCoordinate::new(1, 2));
    }

    #[test]
    fn row_major_index_conversion() {
        assert_eq!(Cartesian2DCoordinate::from_row_major_index(0, 5),
                   Cartesian2DCoordinate::new(0, 0));
        assert_eq!(Cartesian2DCoordinate::from_row_major_index(7, 5),
                   Cartesian2DCoordinate::new(2, 1));
    }
}
