use docopt::Docopt;
use futures::executor::block_on;
use log::info;
use serde_derive::Deserialize;
use std::{cell::RefCell, rc::Rc};

use maze_canvas::{
    exporters::{ExportEvent, ExportPreset, ExportSettingsBuilder, RasterExporter},
    generators::MazeGenerator,
    geometry::Vec2,
    layout::MarkedGrid,
    styles::Style,
    units::{Height, Width},
};

const USAGE: &str = "Maze Canvas

Usage:
    maze_canvas_driver -h | --help
    maze_canvas_driver [--width=<w>] [--height=<h>] [--seed=<n>] [--style=<name>] [--tile-size=<px>] [--text] [--viewport-width=<vw> --viewport-height=<vh>] [export [--preset=<p>] [--export-dir=<path>]]

Options:
    -h --help                Show this screen.
    --width=<w>              Maze width in cells, even values are bumped up by one [default: 21].
    --height=<h>             Maze height in cells, even values are bumped up by one [default: 15].
    --seed=<n>               Seed for a reproducible maze.
    --style=<name>           One of classic, walls-only, passages-only, bare [default: classic].
    --tile-size=<px>         World size of one tile [default: 16].
    --text                   Print the maze as text with S and E markers.
    --viewport-width=<vw>    Width of a viewport to report camera framing for.
    --viewport-height=<vh>   Height of a viewport to report camera framing for.
    --preset=<p>             Export resolution, draft (150ppi) or print (300ppi) [default: draft].
    --export-dir=<path>      Directory the PNG is written to [default: .].
";

#[derive(Debug, Deserialize)]
struct MazeArgs {
    flag_width: usize,
    flag_height: usize,
    flag_seed: Option<u64>,
    flag_style: String,
    flag_tile_size: f32,
    flag_text: bool,
    flag_viewport_width: Option<f32>,
    flag_viewport_height: Option<f32>,
    cmd_export: bool,
    flag_preset: ExportPreset,
    flag_export_dir: String,
}

mod errors {
    use error_chain::*;
    error_chain! {

        links {
            Maze(::maze_canvas::errors::Error, ::maze_canvas::errors::ErrorKind);
        }

        foreign_links {
            DocOptFailure(::docopt::Error);
        }
    }
}
use crate::errors::*;

fn main() -> Result<()> {
    env_logger::init();

    let args: MazeArgs = Docopt::new(USAGE).and_then(|d| d.deserialize())?;

    let style = Style::by_name(&args.flag_style)
        .ok_or_else(|| format!("Unknown style '{}'", args.flag_style))?;
    let generator = Rc::new(RefCell::new(
        MazeGenerator::new(style).with_tile_size(Vec2::new(args.flag_tile_size, args.flag_tile_size))));

    {
        let mut maze = generator.borrow_mut();
        let (width, height) = (Width(args.flag_width), Height(args.flag_height));
        match args.flag_seed {
            Some(seed) => maze.generate_seeded(width, height, seed)?,
            None => maze.generate(width, height)?,
        };
    }

    if args.flag_text {
        let maze = generator.borrow();
        let placements = maze.layout()?;
        if let Some(grid) = maze.grid() {
            print!("{}", MarkedGrid::new(grid, &placements));
        }
    }

    if let (Some(vw), Some(vh)) = (args.flag_viewport_width, args.flag_viewport_height) {
        let frame = generator.borrow().camera_frame(Vec2::new(vw, vh))?;
        println!("camera zoom {:.4} centred on ({:.1}, {:.1})", frame.zoom, frame.center.x, frame.center.y);
    }

    if args.cmd_export {
        let settings = ExportSettingsBuilder::new().export_dir(&args.flag_export_dir).build();
        let mut exporter = RasterExporter::new(settings);
        exporter.bind_generator(generator.clone());

        let mut report = |event: &ExportEvent| match event {
            ExportEvent::Started(preset) => info!("export started at {}", preset),
            ExportEvent::Completed(_, path) => println!("saved {}", path.display()),
            ExportEvent::Failed(_, reason) => eprintln!("export failed: {}", reason),
        };
        block_on(exporter.export(args.flag_preset, &mut report))
            .chain_err(|| "Failed to export maze image")?;
    }

    Ok(())
}
