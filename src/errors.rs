// Create the Error, ErrorKind, ResultExt, and Result types.
// Other modules `use crate::errors::*;` to get access to everything `error_chain!` creates.
// Every kind here is recoverable at the caller boundary, nothing is fatal to the process.
#![allow(deprecated)]

use error_chain::error_chain;

error_chain! {

    foreign_links {
        Io(::std::io::Error);
        Image(::image::ImageError);
    }

    errors {
        InvalidDimensions(width: usize, height: usize) {
            description("maze dimensions too small")
            display("maze dimensions {}x{} are too small, width and height must both be at least 3",
                    width, height)
        }
        NoGeneratorBound {
            description("no maze generator bound")
            display("no maze generator is bound to the exporter")
        }
        GeneratorBusy {
            description("maze generator busy")
            display("the bound maze generator is being modified, try the export again afterwards")
        }
        EmptyGrid {
            description("no maze to export")
            display("no maze has been generated yet, generate one before exporting")
        }
        InvalidStyle(name: String) {
            description("style renders nothing")
            display("style '{}' enables neither passages nor walls", name)
        }
        SurfaceReadbackFailure {
            description("surface readback failed")
            display("could not capture the offscreen surface pixels")
        }
        EncodeOrWriteFailure(path: String) {
            description("image encode or write failed")
            display("failed to encode or write the image '{}'", path)
        }
        ExportInProgress {
            description("export already running")
            display("an export is already rendering, wait for it to finish")
        }
    }
}
