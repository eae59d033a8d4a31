//! **maze_canvas** carves perfect mazes, lays them out as tiles and fits them onto a fixed size
//! canvas for camera framing or PNG export.

// Needed by `error_chain!` which expands to a lot of code.
#![recursion_limit = "1024"]

pub mod cells;
pub mod errors;
pub mod exporters;
pub mod generators;
pub mod geometry;
pub mod grid;
pub mod layout;
pub mod styles;
pub mod surface;
pub mod units;
mod utils;
