use serde_derive::{Deserialize, Serialize};

use crate::cells::Cartesian2DCoordinate;

/// Fraction of the canvas left empty on each side when exporting.
pub const EXPORT_MARGIN: f32 = 0.10;
/// Fraction of an interactive viewport left empty in total, split evenly over both sides.
pub const CAMERA_PADDING: f32 = 0.4;
/// Largest margin `fit_transform` honours. At half the canvas nothing is left to draw in.
pub const MAX_FIT_MARGIN: f32 = 0.45;
pub const DEFAULT_TILE_SIZE: Vec2 = Vec2 { x: 16.0, y: 16.0 };

#[derive(PartialEq, Copy, Clone, Debug, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Vec2 {
        Vec2 { x, y }
    }

    #[inline]
    pub fn scaled(self, factor: f32) -> Vec2 {
        Vec2::new(self.x * factor, self.y * factor)
    }

    #[inline]
    pub fn plus(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }

    #[inline]
    pub fn minus(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

/// Axis aligned rectangle, `position` is the top left corner.
#[derive(PartialEq, Copy, Clone, Debug, Default)]
pub struct Rect2 {
    pub position: Vec2,
    pub size: Vec2,
}

impl Rect2 {
    pub fn new(position: Vec2, size: Vec2) -> Rect2 {
        Rect2 { position, size }
    }

    #[inline]
    pub fn has_area(&self) -> bool {
        self.size.x > 0.0 && self.size.y > 0.0
    }

    #[inline]
    pub fn end(&self) -> Vec2 {
        self.position.plus(self.size)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.position.plus(self.size.scaled(0.5))
    }
}

/// World space position of a cell's top left corner.
#[inline]
pub fn cell_to_world(coord: Cartesian2DCoordinate, tile_size: Vec2) -> Vec2 {
    Vec2::new(coord.x as f32 * tile_size.x, coord.y as f32 * tile_size.y)
}

/// Bounds of the given cells in world space, covering each cell's whole tile.
///
/// Returns None if there are no cells.
pub fn bounding_rect<I>(cells: I, tile_size: Vec2) -> Option<Rect2>
    where I: IntoIterator<Item = Cartesian2DCoordinate>
{
    let mut corners = cells.into_iter().map(|coord| cell_to_world(coord, tile_size));
    let first = corners.next()?;

    let (min, max) = corners.fold((first, first), |(min, max), p| {
        (Vec2::new(min.x.min(p.x), min.y.min(p.y)), Vec2::new(max.x.max(p.x), max.y.max(p.y)))
    });
    let max = max.plus(tile_size);

    Some(Rect2::new(min, max.minus(min)))
}

/// Uniform scale then offset that maps content into a canvas.
#[derive(PartialEq, Copy, Clone, Debug)]
pub struct FitTransform {
    pub scale: f32,
    pub offset: Vec2,
}

impl Default for FitTransform {
    fn default() -> Self {
        FitTransform::identity()
    }
}

impl FitTransform {
    pub fn identity() -> FitTransform {
        FitTransform {
            scale: 1.0,
            offset: Vec2::default(),
        }
    }

    #[inline]
    pub fn apply(&self, point: Vec2) -> Vec2 {
        point.scaled(self.scale).plus(self.offset)
    }

    pub fn apply_rect(&self, rect: Rect2) -> Rect2 {
        Rect2::new(self.apply(rect.position), rect.size.scaled(self.scale))
    }
}

/// Scale `bounds` to fit inside `canvas` less a `margin` fraction on every side, keeping the aspect
/// ratio, and centre it.
///
/// Bounds without area give the identity transform. The margin is clamped to
/// `0.0..=MAX_FIT_MARGIN`.
pub fn fit_transform(bounds: Rect2, canvas: Vec2, margin: f32) -> FitTransform {
    if !bounds.has_area() {
        return FitTransform::identity();
    }

    let margin = margin.max(0.0).min(MAX_FIT_MARGIN);
    let available = canvas.minus(canvas.scaled(2.0 * margin));
    let scale = (available.x / bounds.size.x).min(available.y / bounds.size.y);
    let offset = canvas.minus(bounds.size.scaled(scale))
                       .scaled(0.5)
                       .minus(bounds.position.scaled(scale));

    FitTransform { scale, offset }
}

/// Where a camera should look and how far it should zoom to show some content.
#[derive(PartialEq, Copy, Clone, Debug)]
pub struct CameraFrame {
    pub zoom: f32,
    pub center: Vec2,
}

/// Frame `bounds` in an interactive viewport, using the same fitting as an export with the camera
/// padding as the margin.
pub fn camera_frame(bounds: Rect2, viewport: Vec2) -> CameraFrame {
    let fit = fit_transform(bounds, viewport, CAMERA_PADDING / 2.0);
    CameraFrame {
        zoom: fit.scale,
        center: bounds.center(),
    }
}
