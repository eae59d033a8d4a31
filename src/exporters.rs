use chrono::{DateTime, Local, TimeZone};
use error_chain::bail;
use image::{ImageFormat, Rgba, RgbaImage};
use itertools::Itertools;
use log::{info, warn};
use serde_derive::Deserialize;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::cells::CompassPrimary;
use crate::errors::*;
use crate::generators::MazeGenerator;
use crate::geometry::{self, FitTransform, Rect2, Vec2};
use crate::layout::{self, Element, Placement, PlacementSet};
use crate::styles::{self, TerrainId, TileId};
use crate::surface::OffscreenSurface;
use crate::units::PixelsPerInch;
use crate::utils::{self, FnvHashMap};

/// Share of a tile left empty on each side of a terrain tile's core.
const TERRAIN_INSET: f32 = 0.15;
/// Share of a tile left empty on each side of a marker.
const MARKER_INSET: f32 = 0.25;
const MISSING_COLOUR: Rgba<u8> = Rgba([0xff, 0x00, 0xff, 0xff]);
const EXPORT_EXTENSION: &str = "png";

/// The supported export resolutions. Both are the same landscape page, A4 sized.
#[derive(Eq, PartialEq, Copy, Clone, Debug, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportPreset {
    Draft,
    Print,
}

impl ExportPreset {
    pub fn pixels_per_inch(self) -> PixelsPerInch {
        match self {
            ExportPreset::Draft => PixelsPerInch(150),
            ExportPreset::Print => PixelsPerInch(300),
        }
    }

    /// Canvas size in pixels, width then height.
    pub fn canvas_size(self) -> (u32, u32) {
        match self {
            ExportPreset::Draft => (1754, 1240),
            ExportPreset::Print => (3508, 2480),
        }
    }

    pub fn extension(self) -> &'static str {
        EXPORT_EXTENSION
    }
}

impl fmt::Display for ExportPreset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}ppi {}", self.pixels_per_inch().0, self.extension().to_uppercase())
    }
}

/// What an export reports to its observer. Every export that gets past its preconditions reports
/// `Started` followed by one of `Completed` or `Failed`, otherwise only `Failed`.
#[derive(PartialEq, Clone, Debug)]
pub enum ExportEvent {
    Started(ExportPreset),
    Completed(ExportPreset, PathBuf),
    Failed(ExportPreset, String),
}

pub trait ExportObserver {
    fn on_export_event(&mut self, event: &ExportEvent);
}

impl<F: FnMut(&ExportEvent)> ExportObserver for F {
    fn on_export_event(&mut self, event: &ExportEvent) {
        self(event)
    }
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum ExportState {
    Idle,
    Rendering,
}

/// Colours used to draw each terrain and tile.
#[derive(Debug, Clone)]
pub struct TilePalette {
    terrains: FnvHashMap<TerrainId, Rgba<u8>>,
    tiles: FnvHashMap<TileId, Rgba<u8>>,
}

impl Default for TilePalette {
    fn default() -> Self {
        TilePalette::new()
            .with_terrain(styles::PASSAGE_TERRAIN, Rgba([0xf4, 0xf1, 0xe8, 0xff]))
            .with_terrain(styles::WALL_TERRAIN, Rgba([0x2b, 0x2d, 0x42, 0xff]))
            .with_tile(styles::START_TILE, Rgba([0x2e, 0xb8, 0x6b, 0xff]))
            .with_tile(styles::END_TILE, Rgba([0xd6, 0x2d, 0x20, 0xff]))
    }
}

impl TilePalette {
    pub fn new() -> TilePalette {
        TilePalette {
            terrains: utils::fnv_hashmap(2),
            tiles: utils::fnv_hashmap(2),
        }
    }

    pub fn with_terrain(mut self, terrain: TerrainId, colour: Rgba<u8>) -> TilePalette {
        self.terrains.insert(terrain, colour);
        self
    }

    pub fn with_tile(mut self, tile: TileId, colour: Rgba<u8>) -> TilePalette {
        self.tiles.insert(tile, colour);
        self
    }

    /// Unknown ids are drawn in magenta so they stand out.
    pub fn colour_of(&self, element: Element) -> Rgba<u8> {
        let colour = match element {
            Element::Passage(terrain) | Element::Wall(terrain) => self.terrains.get(&terrain),
            Element::Start(tile) | Element::End(tile) => self.tiles.get(&tile),
        };
        colour.cloned().unwrap_or(MISSING_COLOUR)
    }
}

#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub export_dir: PathBuf,
    pub margin: f32,
    pub background: Rgba<u8>,
    pub palette: TilePalette,
}

pub struct ExportSettingsBuilder {
    settings: ExportSettings,
}

impl ExportSettingsBuilder {
    pub fn new() -> ExportSettingsBuilder {
        ExportSettingsBuilder {
            settings: ExportSettings {
                export_dir: PathBuf::from("."),
                margin: geometry::EXPORT_MARGIN,
                background: Rgba([0xff, 0xff, 0xff, 0xff]),
                palette: TilePalette::default(),
            },
        }
    }

    pub fn export_dir<P: AsRef<Path>>(mut self, dir: P) -> ExportSettingsBuilder {
        self.settings.export_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn margin(mut self, margin: f32) -> ExportSettingsBuilder {
        self.settings.margin = margin.max(0.0).min(geometry::MAX_FIT_MARGIN);
        self
    }

    pub fn background(mut self, colour: Rgba<u8>) -> ExportSettingsBuilder {
        self.settings.background = colour;
        self
    }

    pub fn palette(mut self, palette: TilePalette) -> ExportSettingsBuilder {
        self.settings.palette = palette;
        self
    }

    pub fn build(self) -> ExportSettings {
        self.settings
    }
}

impl Default for ExportSettingsBuilder {
    fn default() -> Self {
        ExportSettingsBuilder::new()
    }
}

/// `maze_export_YYYYMMDD_HHMMSS.png` for the given moment.
pub fn export_file_name<Tz>(timestamp: &DateTime<Tz>) -> String
    where Tz: TimeZone,
          Tz::Offset: fmt::Display
{
    format!("maze_export_{}.{}",
            timestamp.format("%Y%m%d_%H%M%S"),
            EXPORT_EXTENSION)
}

/// Everything an export needs, copied out of the generator before any waiting starts.
struct ExportJob {
    placements: PlacementSet,
    bounds: Rect2,
    tile_size: Vec2,
}

/// Renders the bound generator's maze to a PNG file.
///
/// Only one export can be rendering at a time, a second request while one is in flight is
/// rejected with `ExportInProgress`.
pub struct RasterExporter {
    settings: ExportSettings,
    generator: Option<Rc<RefCell<MazeGenerator>>>,
    state: Cell<ExportState>,
}

impl RasterExporter {
    pub fn new(settings: ExportSettings) -> RasterExporter {
        RasterExporter {
            settings,
            generator: None,
            state: Cell::new(ExportState::Idle),
        }
    }

    pub fn bind_generator(&mut self, generator: Rc<RefCell<MazeGenerator>>) {
        self.generator = Some(generator);
    }

    pub fn unbind_generator(&mut self) {
        self.generator = None;
    }

    #[inline]
    pub fn state(&self) -> ExportState {
        self.state.get()
    }

    #[inline]
    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Render the bound maze at the preset's resolution and write it to a timestamped file in the
    /// export directory, returning the file path.
    ///
    /// The returned future must be driven to completion, the surface needs two frame boundaries
    /// before its pixels can be read.
    pub async fn export<O: ExportObserver>(&self,
                                           preset: ExportPreset,
                                           observer: &mut O)
                                           -> Result<PathBuf> {
        if self.state.get() == ExportState::Rendering {
            return Err(report_failure(preset, observer, ErrorKind::ExportInProgress.into()));
        }

        let job = match self.prepare_job() {
            Ok(job) => job,
            Err(e) => return Err(report_failure(preset, observer, e)),
        };

        let _rendering = RenderingGuard::enter(&self.state);
        info!("exporting maze at {}", preset);
        observer.on_export_event(&ExportEvent::Started(preset));

        match self.render_and_write(job, preset).await {
            Ok(path) => {
                info!("exported maze to {}", path.display());
                observer.on_export_event(&ExportEvent::Completed(preset, path.clone()));
                Ok(path)
            }
            Err(e) => Err(report_failure(preset, observer, e)),
        }
    }

    fn prepare_job(&self) -> Result<ExportJob> {
        let generator = self.generator
                            .as_ref()
                            .ok_or(ErrorKind::NoGeneratorBound)?
                            .try_borrow()
                            .chain_err(|| ErrorKind::GeneratorBusy)?;
        let grid = generator.grid().ok_or(ErrorKind::EmptyGrid)?;
        if grid.is_empty() {
            bail!(ErrorKind::EmptyGrid);
        }

        let placements = layout::resolve_layout(grid, generator.style())?;
        let tile_size = generator.tile_size();
        let bounds = geometry::bounding_rect(placements.occupied_cells(), tile_size).unwrap_or_default();

        Ok(ExportJob {
            placements,
            bounds,
            tile_size,
        })
    }

    async fn render_and_write(&self, job: ExportJob, preset: ExportPreset) -> Result<PathBuf> {
        let (width, height) = preset.canvas_size();
        let canvas = Vec2::new(width as f32, height as f32);
        let fit = geometry::fit_transform(job.bounds, canvas, self.settings.margin);

        let pixels = {
            let mut surface = OffscreenSurface::new(width, height, self.settings.background);
            draw_placements(&mut surface, &job, fit, &self.settings.palette);
            surface.present().await;
            read_pixels(&mut surface)?
        };

        let path = self.settings.export_dir.join(export_file_name(&Local::now()));
        let write_failure = || ErrorKind::EncodeOrWriteFailure(path.display().to_string());
        fs::create_dir_all(&self.settings.export_dir).chain_err(write_failure)?;
        pixels.save_with_format(&path, ImageFormat::Png).chain_err(write_failure)?;

        Ok(path)
    }
}

/// Pixels of a presented surface. A surface that still has undrawn commands fails the export
/// rather than writing a partial image.
fn read_pixels(surface: &mut OffscreenSurface) -> Result<RgbaImage> {
    surface.read_back().ok_or_else(|| ErrorKind::SurfaceReadbackFailure.into())
}

fn report_failure<O: ExportObserver>(preset: ExportPreset, observer: &mut O, error: Error) -> Error {
    let reason = error.iter().map(|e| e.to_string()).join(": ");
    warn!("maze export at {} failed: {}", preset, reason);
    observer.on_export_event(&ExportEvent::Failed(preset, reason));
    error
}

/// Puts the exporter back to idle however rendering ends, including the future being dropped.
struct RenderingGuard<'a> {
    state: &'a Cell<ExportState>,
}

impl<'a> RenderingGuard<'a> {
    fn enter(state: &'a Cell<ExportState>) -> RenderingGuard<'a> {
        state.set(ExportState::Rendering);
        RenderingGuard { state }
    }
}

impl<'a> Drop for RenderingGuard<'a> {
    fn drop(&mut self) {
        self.state.set(ExportState::Idle);
    }
}

/// Passages first, then walls, then the markers on top.
fn draw_placements(surface: &mut OffscreenSurface, job: &ExportJob, fit: FitTransform, palette: &TilePalette) {
    let layers = [job.placements.passages(), job.placements.walls()];
    for placement in layers.iter().flat_map(|layer| layer.iter()) {
        draw_terrain_tile(surface, placement, job.tile_size, fit, palette);
    }

    for marker in job.placements.markers() {
        let tile = tile_rect(marker, job.tile_size);
        let inset = tile.size.scaled(MARKER_INSET);
        let body = Rect2::new(tile.position.plus(inset), tile.size.minus(inset.scaled(2.0)));
        surface.fill_rect(fit.apply_rect(body), palette.colour_of(marker.element));
    }
}

fn tile_rect(placement: &Placement, tile_size: Vec2) -> Rect2 {
    Rect2::new(geometry::cell_to_world(placement.coord, tile_size), tile_size)
}

/// A terrain tile is an inset core plus a bridge out to each connected neighbour, so connected
/// tiles join up into one shape and lone tiles stay separate.
fn draw_terrain_tile(surface: &mut OffscreenSurface,
                     placement: &Placement,
                     tile_size: Vec2,
                     fit: FitTransform,
                     palette: &TilePalette) {
    let colour = palette.colour_of(placement.element);
    let tile = tile_rect(placement, tile_size);
    let inset = tile_size.scaled(TERRAIN_INSET);
    let core = Rect2::new(tile.position.plus(inset), tile_size.minus(inset.scaled(2.0)));
    surface.fill_rect(fit.apply_rect(core), colour);

    for dir in placement.connections.directions() {
        let bridge = match dir {
            CompassPrimary::North => {
                Rect2::new(Vec2::new(core.position.x, tile.position.y), Vec2::new(core.size.x, inset.y))
            }
            CompassPrimary::South => {
                Rect2::new(Vec2::new(core.position.x, core.end().y), Vec2::new(core.size.x, inset.y))
            }
            CompassPrimary::West => {
                Rect2::new(Vec2::new(tile.position.x, core.position.y), Vec2::new(inset.x, core.size.y))
            }
            CompassPrimary::East => {
                Rect2::new(Vec2::new(core.end().x, core.position.y), Vec2::new(inset.x, core.size.y))
            }
        };
        surface.fill_rect(fit.apply_rect(bridge), colour);
    }
}
